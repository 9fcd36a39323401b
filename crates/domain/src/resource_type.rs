use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tripwire_core::AppError;

/// Resource taxonomy understood by the downstream scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// ACM certificate.
    #[serde(rename = "AWS.ACM.Certificate")]
    AcmCertificate,
    /// CloudFormation stack.
    #[serde(rename = "AWS.CloudFormation.Stack")]
    CloudFormationStack,
    /// CloudTrail trail.
    #[serde(rename = "AWS.CloudTrail")]
    CloudTrail,
    /// Account-level CloudTrail coverage summary.
    #[serde(rename = "AWS.CloudTrail.Meta")]
    CloudTrailMeta,
    /// CloudWatch Logs log group.
    #[serde(rename = "AWS.CloudWatch.LogGroup")]
    CloudWatchLogGroup,
    /// Config configuration recorder.
    #[serde(rename = "AWS.Config.Recorder")]
    ConfigRecorder,
    /// Account-level Config coverage summary.
    #[serde(rename = "AWS.Config.Recorder.Meta")]
    ConfigRecorderMeta,
    /// DynamoDB table.
    #[serde(rename = "AWS.DynamoDB.Table")]
    DynamoDbTable,
    /// EC2 machine image.
    #[serde(rename = "AWS.EC2.AMI")]
    Ec2Ami,
    /// EC2 instance.
    #[serde(rename = "AWS.EC2.Instance")]
    Ec2Instance,
    /// EC2 network ACL.
    #[serde(rename = "AWS.EC2.NetworkACL")]
    Ec2NetworkAcl,
    /// EC2 security group.
    #[serde(rename = "AWS.EC2.SecurityGroup")]
    Ec2SecurityGroup,
    /// EBS volume.
    #[serde(rename = "AWS.EC2.Volume")]
    Ec2Volume,
    /// VPC.
    #[serde(rename = "AWS.EC2.VPC")]
    Ec2Vpc,
    /// ECS cluster.
    #[serde(rename = "AWS.ECS.Cluster")]
    EcsCluster,
    /// EKS cluster.
    #[serde(rename = "AWS.EKS.Cluster")]
    EksCluster,
    /// Application load balancer.
    #[serde(rename = "AWS.ELBV2.ApplicationLoadBalancer")]
    Elbv2ApplicationLoadBalancer,
    /// GuardDuty detector.
    #[serde(rename = "AWS.GuardDuty.Detector")]
    GuardDutyDetector,
    /// Account-level GuardDuty coverage summary.
    #[serde(rename = "AWS.GuardDuty.Detector.Meta")]
    GuardDutyDetectorMeta,
    /// IAM group.
    #[serde(rename = "AWS.IAM.Group")]
    IamGroup,
    /// IAM managed policy.
    #[serde(rename = "AWS.IAM.Policy")]
    IamPolicy,
    /// IAM role.
    #[serde(rename = "AWS.IAM.Role")]
    IamRole,
    /// Account root user.
    #[serde(rename = "AWS.IAM.RootUser")]
    IamRootUser,
    /// IAM user.
    #[serde(rename = "AWS.IAM.User")]
    IamUser,
    /// KMS key.
    #[serde(rename = "AWS.KMS.Key")]
    KmsKey,
    /// Lambda function.
    #[serde(rename = "AWS.Lambda.Function")]
    LambdaFunction,
    /// Account password policy.
    #[serde(rename = "AWS.PasswordPolicy")]
    PasswordPolicy,
    /// RDS database instance.
    #[serde(rename = "AWS.RDS.Instance")]
    RdsInstance,
    /// Redshift cluster.
    #[serde(rename = "AWS.Redshift.Cluster")]
    RedshiftCluster,
    /// S3 bucket.
    #[serde(rename = "AWS.S3.Bucket")]
    S3Bucket,
    /// Global WAF web ACL.
    #[serde(rename = "AWS.WAF.WebACL")]
    WafWebAcl,
    /// Regional WAF web ACL.
    #[serde(rename = "AWS.WAF.Regional.WebACL")]
    WafRegionalWebAcl,
}

impl ResourceType {
    /// Returns the stable taxonomy tag for this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AcmCertificate => "AWS.ACM.Certificate",
            Self::CloudFormationStack => "AWS.CloudFormation.Stack",
            Self::CloudTrail => "AWS.CloudTrail",
            Self::CloudTrailMeta => "AWS.CloudTrail.Meta",
            Self::CloudWatchLogGroup => "AWS.CloudWatch.LogGroup",
            Self::ConfigRecorder => "AWS.Config.Recorder",
            Self::ConfigRecorderMeta => "AWS.Config.Recorder.Meta",
            Self::DynamoDbTable => "AWS.DynamoDB.Table",
            Self::Ec2Ami => "AWS.EC2.AMI",
            Self::Ec2Instance => "AWS.EC2.Instance",
            Self::Ec2NetworkAcl => "AWS.EC2.NetworkACL",
            Self::Ec2SecurityGroup => "AWS.EC2.SecurityGroup",
            Self::Ec2Volume => "AWS.EC2.Volume",
            Self::Ec2Vpc => "AWS.EC2.VPC",
            Self::EcsCluster => "AWS.ECS.Cluster",
            Self::EksCluster => "AWS.EKS.Cluster",
            Self::Elbv2ApplicationLoadBalancer => "AWS.ELBV2.ApplicationLoadBalancer",
            Self::GuardDutyDetector => "AWS.GuardDuty.Detector",
            Self::GuardDutyDetectorMeta => "AWS.GuardDuty.Detector.Meta",
            Self::IamGroup => "AWS.IAM.Group",
            Self::IamPolicy => "AWS.IAM.Policy",
            Self::IamRole => "AWS.IAM.Role",
            Self::IamRootUser => "AWS.IAM.RootUser",
            Self::IamUser => "AWS.IAM.User",
            Self::KmsKey => "AWS.KMS.Key",
            Self::LambdaFunction => "AWS.Lambda.Function",
            Self::PasswordPolicy => "AWS.PasswordPolicy",
            Self::RdsInstance => "AWS.RDS.Instance",
            Self::RedshiftCluster => "AWS.Redshift.Cluster",
            Self::S3Bucket => "AWS.S3.Bucket",
            Self::WafWebAcl => "AWS.WAF.WebACL",
            Self::WafRegionalWebAcl => "AWS.WAF.Regional.WebACL",
        }
    }

    /// Returns all known resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceType] = &[
            ResourceType::AcmCertificate,
            ResourceType::CloudFormationStack,
            ResourceType::CloudTrail,
            ResourceType::CloudTrailMeta,
            ResourceType::CloudWatchLogGroup,
            ResourceType::ConfigRecorder,
            ResourceType::ConfigRecorderMeta,
            ResourceType::DynamoDbTable,
            ResourceType::Ec2Ami,
            ResourceType::Ec2Instance,
            ResourceType::Ec2NetworkAcl,
            ResourceType::Ec2SecurityGroup,
            ResourceType::Ec2Volume,
            ResourceType::Ec2Vpc,
            ResourceType::EcsCluster,
            ResourceType::EksCluster,
            ResourceType::Elbv2ApplicationLoadBalancer,
            ResourceType::GuardDutyDetector,
            ResourceType::GuardDutyDetectorMeta,
            ResourceType::IamGroup,
            ResourceType::IamPolicy,
            ResourceType::IamRole,
            ResourceType::IamRootUser,
            ResourceType::IamUser,
            ResourceType::KmsKey,
            ResourceType::LambdaFunction,
            ResourceType::PasswordPolicy,
            ResourceType::RdsInstance,
            ResourceType::RedshiftCluster,
            ResourceType::S3Bucket,
            ResourceType::WafWebAcl,
            ResourceType::WafRegionalWebAcl,
        ];

        ALL
    }
}

impl Display for ResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|resource_type| resource_type.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource type '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::ResourceType;

    #[test]
    fn every_tag_parses_back_to_its_variant() {
        for resource_type in ResourceType::all() {
            let parsed = ResourceType::from_str(resource_type.as_str());
            assert!(parsed.is_ok());
            assert_eq!(parsed.unwrap_or_else(|_| unreachable!()), *resource_type);
        }
    }

    #[test]
    fn serde_uses_taxonomy_tag() {
        let encoded = serde_json::to_string(&ResourceType::S3Bucket);
        assert!(encoded.is_ok());
        assert_eq!(
            encoded.unwrap_or_default(),
            "\"AWS.S3.Bucket\"".to_owned()
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(ResourceType::from_str("AWS.Unknown.Thing").is_err());
    }
}
