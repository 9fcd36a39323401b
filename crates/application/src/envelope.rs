//! Recognizes the wire shapes an inbound message can take.

use serde_json::Value;
use tripwire_core::{AppError, AppResult};

/// One decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum EventEnvelope {
    /// An audit event delivered directly under `detail`.
    RawAuditEvent(Value),
    /// An audit event inside a notification's `Message`.
    NotificationWrappedAuditEvent(Value),
    /// A new compressed batch of audit events is ready in the object store.
    BatchAvailableNotification {
        /// Bucket holding the batch.
        bucket: String,
        /// Object key of the batch.
        key: String,
    },
    /// A notification topic asks for the subscription to be confirmed.
    SubscriptionConfirmation {
        /// Topic requesting confirmation.
        topic_arn: String,
        /// One-time confirmation token.
        token: String,
    },
}

/// Decodes one message body.
///
/// Returns `Ok(None)` for well-formed JSON of an unknown shape and an error
/// when the body is not a JSON object at all.
pub fn decode_envelope(body: &str) -> AppResult<Option<EventEnvelope>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|error| AppError::Validation(format!("message body is not JSON: {error}")))?;
    if !value.is_object() {
        return Err(AppError::Validation(
            "message body is not a JSON object".to_owned(),
        ));
    }

    decode_value(value)
}

fn decode_value(mut value: Value) -> AppResult<Option<EventEnvelope>> {
    if let Some(detail) = value.get_mut("detail") {
        return Ok(Some(EventEnvelope::RawAuditEvent(detail.take())));
    }

    if let (Some(bucket), Some(key)) = (string_field(&value, "bucket"), string_field(&value, "key"))
    {
        return Ok(Some(EventEnvelope::BatchAvailableNotification {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        }));
    }

    match value.get("Type").and_then(Value::as_str) {
        Some("Notification") => {
            let Some(message) = string_field(&value, "Message") else {
                return Err(AppError::Validation(
                    "notification envelope has no 'Message'".to_owned(),
                ));
            };
            let inner: Value = serde_json::from_str(message).map_err(|error| {
                AppError::Validation(format!("notification message is not JSON: {error}"))
            })?;

            Ok(match decode_value(inner)? {
                Some(EventEnvelope::RawAuditEvent(detail)) => {
                    Some(EventEnvelope::NotificationWrappedAuditEvent(detail))
                }
                Some(batch @ EventEnvelope::BatchAvailableNotification { .. }) => Some(batch),
                _ => None,
            })
        }
        Some("SubscriptionConfirmation") => {
            let topic_arn = string_field(&value, "TopicArn");
            let token = string_field(&value, "Token");
            match (topic_arn, token) {
                (Some(topic_arn), Some(token)) => Ok(Some(EventEnvelope::SubscriptionConfirmation {
                    topic_arn: topic_arn.to_owned(),
                    token: token.to_owned(),
                })),
                _ => Err(AppError::Validation(
                    "subscription confirmation is missing 'TopicArn' or 'Token'".to_owned(),
                )),
            }
        }
        _ => Ok(None),
    }
}

fn string_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{EventEnvelope, decode_envelope};

    fn decode(body: &str) -> Option<EventEnvelope> {
        let result = decode_envelope(body);
        assert!(result.is_ok());
        result.unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn detail_field_is_a_raw_audit_event() {
        let envelope = decode(r#"{"detail": {"eventName": "CreateBucket"}}"#);
        assert_eq!(
            envelope,
            Some(EventEnvelope::RawAuditEvent(json!({"eventName": "CreateBucket"})))
        );
    }

    #[test]
    fn bucket_and_key_announce_a_batch() {
        let envelope = decode(r#"{"bucket": "trail-logs", "key": "AWSLogs/1.json.gz"}"#);
        assert_eq!(
            envelope,
            Some(EventEnvelope::BatchAvailableNotification {
                bucket: "trail-logs".to_owned(),
                key: "AWSLogs/1.json.gz".to_owned(),
            })
        );
    }

    #[test]
    fn notification_message_is_unwrapped() {
        let inner = json!({"detail": {"eventName": "PutBucketAcl"}}).to_string();
        let body = json!({"Type": "Notification", "Message": inner}).to_string();

        let envelope = decode(&body);
        assert_eq!(
            envelope,
            Some(EventEnvelope::NotificationWrappedAuditEvent(
                json!({"eventName": "PutBucketAcl"})
            ))
        );
    }

    #[test]
    fn subscription_confirmation_carries_topic_and_token() {
        let body = json!({
            "Type": "SubscriptionConfirmation",
            "TopicArn": "arn:aws:sns:us-east-1:123456789012:audit",
            "Token": "2336412f37"
        })
        .to_string();

        assert_eq!(
            decode(&body),
            Some(EventEnvelope::SubscriptionConfirmation {
                topic_arn: "arn:aws:sns:us-east-1:123456789012:audit".to_owned(),
                token: "2336412f37".to_owned(),
            })
        );
    }

    #[test]
    fn unknown_type_is_not_an_envelope() {
        assert_eq!(decode(r#"{"Type": "UnsubscribeConfirmation"}"#), None);
        assert_eq!(decode(r#"{"hello": "world"}"#), None);
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(decode_envelope("not json").is_err());
        assert!(decode_envelope("[1, 2]").is_err());
    }
}
