//! CloudFormation operation enum.

use std::fmt;

use crate::error::CloudFormationErrorCode;

/// Target prefix of the `awsJson1_0` protocol for CloudFormation.
pub const TARGET_PREFIX: &str = "CloudFormation_20100515";

/// Signing name of the service.
pub const SERVICE_NAME: &str = "cloudformation";

/// All supported CloudFormation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CloudFormationOperation {
    // Stack lifecycle
    /// Create a stack.
    CreateStack,
    /// Update a stack.
    UpdateStack,
    /// Delete a stack.
    DeleteStack,
    /// Cancel an in-progress stack update.
    CancelUpdateStack,
    /// Continue rolling back a stack in `UPDATE_ROLLBACK_FAILED`.
    ContinueUpdateRollback,
    /// Roll back a stack to its last stable state.
    RollbackStack,
    /// Turn termination protection on or off.
    UpdateTerminationProtection,
    /// Send a signal to a resource waiting on a creation policy.
    SignalResource,

    // Stack inspection
    /// Describe one or all stacks.
    DescribeStacks,
    /// List stack summaries, optionally filtered by status.
    ListStacks,
    /// Describe a stack's events, newest first.
    DescribeStackEvents,
    /// Describe one resource of a stack.
    DescribeStackResource,
    /// Describe the resources of a stack.
    DescribeStackResources,
    /// List resource summaries of a stack.
    ListStackResources,

    // Templates and policies
    /// Get the template of a stack or change set.
    GetTemplate,
    /// Summarize a template's parameters and capabilities.
    GetTemplateSummary,
    /// Validate a template.
    ValidateTemplate,
    /// Estimate the monthly cost of a template.
    EstimateTemplateCost,
    /// Get a stack's policy.
    GetStackPolicy,
    /// Set a stack's policy.
    SetStackPolicy,

    // Change sets
    /// Create a change set.
    CreateChangeSet,
    /// Describe a change set.
    DescribeChangeSet,
    /// Execute a change set.
    ExecuteChangeSet,
    /// Delete a change set.
    DeleteChangeSet,
    /// List the change sets of a stack.
    ListChangeSets,

    // Drift
    /// Start drift detection on a stack.
    DetectStackDrift,
    /// Get the status of a drift detection run.
    DescribeStackDriftDetectionStatus,

    // Exports and account
    /// List exported output values.
    ListExports,
    /// List the stacks importing an exported value.
    ListImports,
    /// Describe the account's CloudFormation quotas.
    DescribeAccountLimits,
}

impl CloudFormationOperation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 30] = [
        Self::CreateStack,
        Self::UpdateStack,
        Self::DeleteStack,
        Self::CancelUpdateStack,
        Self::ContinueUpdateRollback,
        Self::RollbackStack,
        Self::UpdateTerminationProtection,
        Self::SignalResource,
        Self::DescribeStacks,
        Self::ListStacks,
        Self::DescribeStackEvents,
        Self::DescribeStackResource,
        Self::DescribeStackResources,
        Self::ListStackResources,
        Self::GetTemplate,
        Self::GetTemplateSummary,
        Self::ValidateTemplate,
        Self::EstimateTemplateCost,
        Self::GetStackPolicy,
        Self::SetStackPolicy,
        Self::CreateChangeSet,
        Self::DescribeChangeSet,
        Self::ExecuteChangeSet,
        Self::DeleteChangeSet,
        Self::ListChangeSets,
        Self::DetectStackDrift,
        Self::DescribeStackDriftDetectionStatus,
        Self::ListExports,
        Self::ListImports,
        Self::DescribeAccountLimits,
    ];

    /// Returns the AWS operation name string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateStack => "CreateStack",
            Self::UpdateStack => "UpdateStack",
            Self::DeleteStack => "DeleteStack",
            Self::CancelUpdateStack => "CancelUpdateStack",
            Self::ContinueUpdateRollback => "ContinueUpdateRollback",
            Self::RollbackStack => "RollbackStack",
            Self::UpdateTerminationProtection => "UpdateTerminationProtection",
            Self::SignalResource => "SignalResource",
            Self::DescribeStacks => "DescribeStacks",
            Self::ListStacks => "ListStacks",
            Self::DescribeStackEvents => "DescribeStackEvents",
            Self::DescribeStackResource => "DescribeStackResource",
            Self::DescribeStackResources => "DescribeStackResources",
            Self::ListStackResources => "ListStackResources",
            Self::GetTemplate => "GetTemplate",
            Self::GetTemplateSummary => "GetTemplateSummary",
            Self::ValidateTemplate => "ValidateTemplate",
            Self::EstimateTemplateCost => "EstimateTemplateCost",
            Self::GetStackPolicy => "GetStackPolicy",
            Self::SetStackPolicy => "SetStackPolicy",
            Self::CreateChangeSet => "CreateChangeSet",
            Self::DescribeChangeSet => "DescribeChangeSet",
            Self::ExecuteChangeSet => "ExecuteChangeSet",
            Self::DeleteChangeSet => "DeleteChangeSet",
            Self::ListChangeSets => "ListChangeSets",
            Self::DetectStackDrift => "DetectStackDrift",
            Self::DescribeStackDriftDetectionStatus => "DescribeStackDriftDetectionStatus",
            Self::ListExports => "ListExports",
            Self::ListImports => "ListImports",
            Self::DescribeAccountLimits => "DescribeAccountLimits",
        }
    }

    /// Parse an operation name string into a `CloudFormationOperation`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// The `x-amz-target` header value, e.g.
    /// `CloudFormation_20100515.CreateStack`.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{TARGET_PREFIX}.{}", self.as_str())
    }

    /// The errors this operation may return as typed errors.
    #[must_use]
    pub fn declared_errors(&self) -> &'static [CloudFormationErrorCode] {
        use CloudFormationErrorCode::{
            AlreadyExistsException, ChangeSetNotFoundException, InsufficientCapabilitiesException,
            InvalidChangeSetStatusException, LimitExceededException, StackSetNotFoundException,
            TokenAlreadyExistsException,
        };

        match self {
            Self::CreateStack => &[
                AlreadyExistsException,
                InsufficientCapabilitiesException,
                LimitExceededException,
                TokenAlreadyExistsException,
            ],
            Self::UpdateStack => &[InsufficientCapabilitiesException, TokenAlreadyExistsException],
            Self::DeleteStack
            | Self::CancelUpdateStack
            | Self::ContinueUpdateRollback
            | Self::RollbackStack => &[TokenAlreadyExistsException],
            Self::GetTemplate | Self::DescribeChangeSet => &[ChangeSetNotFoundException],
            Self::GetTemplateSummary => &[StackSetNotFoundException],
            Self::CreateChangeSet => &[
                AlreadyExistsException,
                InsufficientCapabilitiesException,
                LimitExceededException,
            ],
            Self::ExecuteChangeSet => &[
                ChangeSetNotFoundException,
                InsufficientCapabilitiesException,
                InvalidChangeSetStatusException,
                TokenAlreadyExistsException,
            ],
            Self::DeleteChangeSet => &[InvalidChangeSetStatusException],
            Self::UpdateTerminationProtection
            | Self::SignalResource
            | Self::DescribeStacks
            | Self::ListStacks
            | Self::DescribeStackEvents
            | Self::DescribeStackResource
            | Self::DescribeStackResources
            | Self::ListStackResources
            | Self::ValidateTemplate
            | Self::EstimateTemplateCost
            | Self::GetStackPolicy
            | Self::SetStackPolicy
            | Self::ListChangeSets
            | Self::DetectStackDrift
            | Self::DescribeStackDriftDetectionStatus
            | Self::ListExports
            | Self::ListImports
            | Self::DescribeAccountLimits => &[],
        }
    }

    /// Every wire code of the declared errors, as the typed-error stage
    /// matches them.
    #[must_use]
    pub fn declared_error_codes(&self) -> Vec<String> {
        self.declared_errors()
            .iter()
            .flat_map(CloudFormationErrorCode::wire_codes)
            .map(str::to_owned)
            .collect()
    }

    /// Whether the operation returns no output.
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Self::CancelUpdateStack
                | Self::DeleteStack
                | Self::SetStackPolicy
                | Self::SignalResource
        )
    }
}

impl fmt::Display for CloudFormationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_round_trip_operation_names() {
        for op in CloudFormationOperation::ALL {
            assert_eq!(CloudFormationOperation::from_name(op.as_str()), Some(op));
        }
        assert_eq!(CloudFormationOperation::from_name("ActivateType"), None);
    }

    #[test]
    fn test_should_build_target() {
        assert_eq!(
            CloudFormationOperation::DescribeStacks.target(),
            "CloudFormation_20100515.DescribeStacks"
        );
    }

    #[test]
    fn test_should_declare_errors_per_operation() {
        assert_eq!(
            CloudFormationOperation::CreateStack.declared_errors(),
            &[
                CloudFormationErrorCode::AlreadyExistsException,
                CloudFormationErrorCode::InsufficientCapabilitiesException,
                CloudFormationErrorCode::LimitExceededException,
                CloudFormationErrorCode::TokenAlreadyExistsException,
            ]
        );
        assert!(CloudFormationOperation::DescribeStacks.declared_errors().is_empty());
        assert_eq!(
            CloudFormationOperation::DeleteChangeSet.declared_error_codes(),
            vec!["InvalidChangeSetStatusException", "InvalidChangeSetStatus"]
        );
    }

    #[test]
    fn test_should_mark_void_operations() {
        let void: Vec<_> = CloudFormationOperation::ALL
            .into_iter()
            .filter(CloudFormationOperation::is_void)
            .collect();
        assert_eq!(
            void,
            vec![
                CloudFormationOperation::DeleteStack,
                CloudFormationOperation::CancelUpdateStack,
                CloudFormationOperation::SignalResource,
                CloudFormationOperation::SetStackPolicy,
            ]
        );
    }
}
