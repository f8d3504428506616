//! Operation shapes: one zero-sized marker per operation tying together its
//! input, output and [`CloudFormationOperation`].
//!
//! Clients are generic over [`OperationShape`], so a single `execute` covers
//! every operation:
//!
//! ```
//! use ruststack_cloudformation_model::operations::CloudFormationOperation;
//! use ruststack_cloudformation_model::shapes::{DescribeStacks, OperationShape};
//!
//! assert_eq!(
//!     <DescribeStacks as OperationShape>::OPERATION,
//!     CloudFormationOperation::DescribeStacks
//! );
//! ```

use std::fmt::Debug;

use ruststack_http_client::{HttpRequestInput, HttpResponseOutput};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::input::{
    CancelUpdateStackInput, ContinueUpdateRollbackInput, CreateChangeSetInput, CreateStackInput,
    DeleteChangeSetInput, DeleteStackInput, DescribeAccountLimitsInput, DescribeChangeSetInput,
    DescribeStackDriftDetectionStatusInput, DescribeStackEventsInput, DescribeStackResourceInput,
    DescribeStackResourcesInput, DescribeStacksInput, DetectStackDriftInput,
    EstimateTemplateCostInput, ExecuteChangeSetInput, GetStackPolicyInput, GetTemplateInput,
    GetTemplateSummaryInput, ListChangeSetsInput, ListExportsInput, ListImportsInput,
    ListStackResourcesInput, ListStacksInput, RollbackStackInput, SetStackPolicyInput,
    SignalResourceInput, UpdateStackInput, UpdateTerminationProtectionInput,
    ValidateTemplateInput,
};
use crate::operations::CloudFormationOperation;
use crate::output::{
    ContinueUpdateRollbackOutput, CreateChangeSetOutput, CreateStackOutput,
    DeleteChangeSetOutput, DescribeAccountLimitsOutput, DescribeChangeSetOutput,
    DescribeStackDriftDetectionStatusOutput, DescribeStackEventsOutput,
    DescribeStackResourceOutput, DescribeStackResourcesOutput, DescribeStacksOutput,
    DetectStackDriftOutput, EstimateTemplateCostOutput, ExecuteChangeSetOutput,
    GetStackPolicyOutput, GetTemplateOutput, GetTemplateSummaryOutput, ListChangeSetsOutput,
    ListExportsOutput, ListImportsOutput, ListStackResourcesOutput, ListStacksOutput,
    RollbackStackOutput, UpdateStackOutput, UpdateTerminationProtectionOutput,
    ValidateTemplateOutput,
};

/// Binds an operation to its input and output types.
pub trait OperationShape: Send + Sync + 'static {
    /// The request shape.
    type Input: HttpRequestInput
        + Serialize
        + DeserializeOwned
        + Clone
        + Default
        + Debug
        + Send
        + Sync
        + 'static;
    /// The response shape; `()` for operations without output.
    type Output: HttpResponseOutput + Serialize + Clone + Default + Debug + Send + 'static;

    /// The operation this shape describes.
    const OPERATION: CloudFormationOperation;
}

macro_rules! operation_shapes {
    ($($op:ident => $input:ty, $output:ty;)*) => {
        $(
            #[doc = concat!("Shape of the `", stringify!($op), "` operation.")]
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $op;

            impl OperationShape for $op {
                type Input = $input;
                type Output = $output;

                const OPERATION: CloudFormationOperation = CloudFormationOperation::$op;
            }

            impl HttpRequestInput for $input {
                type Path = ();
                type Query = ();
                type Body = Self;
                type Headers = ();

                fn body_encodable(&self) -> Option<&Self> {
                    Some(self)
                }
            }
        )*
    };
}

operation_shapes! {
    CreateStack => CreateStackInput, CreateStackOutput;
    UpdateStack => UpdateStackInput, UpdateStackOutput;
    DeleteStack => DeleteStackInput, ();
    CancelUpdateStack => CancelUpdateStackInput, ();
    ContinueUpdateRollback => ContinueUpdateRollbackInput, ContinueUpdateRollbackOutput;
    RollbackStack => RollbackStackInput, RollbackStackOutput;
    UpdateTerminationProtection => UpdateTerminationProtectionInput, UpdateTerminationProtectionOutput;
    SignalResource => SignalResourceInput, ();
    DescribeStacks => DescribeStacksInput, DescribeStacksOutput;
    ListStacks => ListStacksInput, ListStacksOutput;
    DescribeStackEvents => DescribeStackEventsInput, DescribeStackEventsOutput;
    DescribeStackResource => DescribeStackResourceInput, DescribeStackResourceOutput;
    DescribeStackResources => DescribeStackResourcesInput, DescribeStackResourcesOutput;
    ListStackResources => ListStackResourcesInput, ListStackResourcesOutput;
    GetTemplate => GetTemplateInput, GetTemplateOutput;
    GetTemplateSummary => GetTemplateSummaryInput, GetTemplateSummaryOutput;
    ValidateTemplate => ValidateTemplateInput, ValidateTemplateOutput;
    EstimateTemplateCost => EstimateTemplateCostInput, EstimateTemplateCostOutput;
    GetStackPolicy => GetStackPolicyInput, GetStackPolicyOutput;
    SetStackPolicy => SetStackPolicyInput, ();
    CreateChangeSet => CreateChangeSetInput, CreateChangeSetOutput;
    DescribeChangeSet => DescribeChangeSetInput, DescribeChangeSetOutput;
    ExecuteChangeSet => ExecuteChangeSetInput, ExecuteChangeSetOutput;
    DeleteChangeSet => DeleteChangeSetInput, DeleteChangeSetOutput;
    ListChangeSets => ListChangeSetsInput, ListChangeSetsOutput;
    DetectStackDrift => DetectStackDriftInput, DetectStackDriftOutput;
    DescribeStackDriftDetectionStatus => DescribeStackDriftDetectionStatusInput, DescribeStackDriftDetectionStatusOutput;
    ListExports => ListExportsInput, ListExportsOutput;
    ListImports => ListImportsInput, ListImportsOutput;
    DescribeAccountLimits => DescribeAccountLimitsInput, DescribeAccountLimitsOutput;
}
