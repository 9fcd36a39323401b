use tripwire_core::{AccountId, AppError, AppResult};

/// Fields of one audit event needed for every downstream decision.
///
/// Only built once the event is known to be classifiable: the event name is
/// not ignored, the service is supported, and account and region are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEventMetadata {
    account_id: AccountId,
    region: String,
    event_source: String,
    event_name: String,
}

impl AuditEventMetadata {
    /// Creates metadata from already extracted fields.
    pub fn new(
        account_id: AccountId,
        region: impl Into<String>,
        event_source: impl Into<String>,
        event_name: impl Into<String>,
    ) -> AppResult<Self> {
        let region = region.into();
        let event_source = event_source.into();
        let event_name = event_name.into();

        for (field, value) in [
            ("region", &region),
            ("event_source", &event_source),
            ("event_name", &event_name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "audit event metadata field '{field}' must not be empty"
                )));
            }
        }

        Ok(Self {
            account_id,
            region,
            event_source,
            event_name,
        })
    }

    /// Returns the account the event was recorded for.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Returns the region the call was made in.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region.as_str()
    }

    /// Returns the service identifier, such as `s3.amazonaws.com`.
    #[must_use]
    pub fn event_source(&self) -> &str {
        self.event_source.as_str()
    }

    /// Returns the API action name.
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.event_name.as_str()
    }

    /// Returns a copy with a different event name.
    ///
    /// Used when a service versions its action names and the rule wants the
    /// bare action.
    #[must_use]
    pub fn with_event_name(&self, event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use tripwire_core::AccountId;

    use super::AuditEventMetadata;

    fn account() -> AccountId {
        AccountId::new("111111111111").unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn blank_region_is_rejected() {
        let metadata =
            AuditEventMetadata::new(account(), " ", "s3.amazonaws.com", "DeleteBucket");
        assert!(metadata.is_err());
    }

    #[test]
    fn renamed_copy_keeps_other_fields() {
        let metadata = AuditEventMetadata::new(
            account(),
            "us-west-2",
            "lambda.amazonaws.com",
            "CreateFunction20150331",
        )
        .unwrap_or_else(|_| unreachable!());

        let renamed = metadata.with_event_name("CreateFunction");
        assert_eq!(renamed.event_name(), "CreateFunction");
        assert_eq!(renamed.region(), "us-west-2");
        assert_eq!(renamed.account_id().as_str(), "111111111111");
    }
}
