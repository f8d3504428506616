//! CloudFormation output types.
//!
//! All output structs use `PascalCase` JSON field naming to match the
//! `awsJson1_0` wire protocol. Each carries the request ID the service sent in
//! the `x-amzn-RequestId` header; it is never part of the JSON body.
//!
//! `CancelUpdateStack`, `DeleteStack`, `SetStackPolicy` and `SignalResource`
//! return no output and use `()`.

use chrono::{DateTime, Utc};
use ruststack_http_client::HttpResponseOutput;
use serde::{Deserialize, Serialize};

use crate::types::{
    AccountLimit, Capability, Change, ChangeSetStatus, ChangeSetSummary, ExecutionStatus, Export,
    Parameter, ParameterDeclaration, RollbackConfiguration, Stack, StackDriftDetectionStatus,
    StackDriftStatus, StackEvent, StackResource, StackResourceDetail, StackResourceSummary,
    StackSummary, Tag, TemplateParameter, TemplateStage,
};

/// Response headers merged into every output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseHeaders {
    /// `x-amzn-RequestId`.
    #[serde(rename = "x-amzn-requestid")]
    pub request_id: Option<String>,
}

macro_rules! json_outputs {
    ($($output:ty),* $(,)?) => {
        $(
            impl HttpResponseOutput for $output {
                type Body = Self;
                type Headers = ResponseHeaders;

                fn compose(body: Option<Self>, headers: ResponseHeaders) -> Self {
                    let mut output = body.unwrap_or_default();
                    output.request_id = headers.request_id;
                    output
                }
            }
        )*
    };
}

json_outputs!(
    CreateStackOutput,
    UpdateStackOutput,
    ContinueUpdateRollbackOutput,
    RollbackStackOutput,
    UpdateTerminationProtectionOutput,
    DescribeStacksOutput,
    ListStacksOutput,
    DescribeStackEventsOutput,
    DescribeStackResourceOutput,
    DescribeStackResourcesOutput,
    ListStackResourcesOutput,
    GetTemplateOutput,
    GetTemplateSummaryOutput,
    ValidateTemplateOutput,
    EstimateTemplateCostOutput,
    GetStackPolicyOutput,
    CreateChangeSetOutput,
    DescribeChangeSetOutput,
    ExecuteChangeSetOutput,
    DeleteChangeSetOutput,
    ListChangeSetsOutput,
    DetectStackDriftOutput,
    DescribeStackDriftDetectionStatusOutput,
    ListExportsOutput,
    ListImportsOutput,
    DescribeAccountLimitsOutput,
);

// ---------------------------------------------------------------------------
// Stack lifecycle
// ---------------------------------------------------------------------------

/// Output for the `CreateStack` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStackOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `UpdateStack` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStackOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `ContinueUpdateRollback` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueUpdateRollbackOutput {
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `RollbackStack` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RollbackStackOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `UpdateTerminationProtection` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateTerminationProtectionOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Stack inspection
// ---------------------------------------------------------------------------

/// Output for the `DescribeStacks` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStacksOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<Stack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `ListStacks` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListStacksOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_summaries: Vec<StackSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `DescribeStackEvents` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStackEventsOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_events: Vec<StackEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `DescribeStackResource` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStackResourceOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_resource_detail: Option<StackResourceDetail>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `DescribeStackResources` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStackResourcesOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_resources: Vec<StackResource>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `ListStackResources` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListStackResourcesOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_resource_summaries: Vec<StackResourceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Templates and policies
// ---------------------------------------------------------------------------

/// Output for the `GetTemplate` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTemplateOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_body: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages_available: Vec<TemplateStage>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `GetTemplateSummary` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTemplateSummaryOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declared_transforms: Vec<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `ValidateTemplate` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidateTemplateOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TemplateParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declared_transforms: Vec<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `EstimateTemplateCost` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstimateTemplateCostOutput {
    /// Calculator URL with the estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `GetStackPolicy` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetStackPolicyOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_policy_body: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Change sets
// ---------------------------------------------------------------------------

/// Output for the `CreateChangeSet` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateChangeSetOutput {
    /// ARN of the change set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `DescribeChangeSet` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeChangeSetOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_set_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_set_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_status: Option<ExecutionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeSetStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(
        rename = "NotificationARNs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub notification_arns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_configuration: Option<RollbackConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_nested_stacks: Option<bool>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `ExecuteChangeSet` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteChangeSetOutput {
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `DeleteChangeSet` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteChangeSetOutput {
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `ListChangeSets` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListChangeSetsOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<ChangeSetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Drift
// ---------------------------------------------------------------------------

/// Output for the `DetectStackDrift` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectStackDriftOutput {
    pub stack_drift_detection_id: String,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `DescribeStackDriftDetectionStatus` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStackDriftDetectionStatusOutput {
    pub stack_id: String,
    pub stack_drift_detection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_drift_status: Option<StackDriftStatus>,
    pub detection_status: StackDriftDetectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_status_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drifted_stack_resource_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Exports and account
// ---------------------------------------------------------------------------

/// Output for the `ListExports` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListExportsOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<Export>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `ListImports` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListImportsOutput {
    /// Names of the importing stacks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Output for the `DescribeAccountLimits` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountLimitsOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub account_limits: Vec<AccountLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip)]
    pub request_id: Option<String>,
}
