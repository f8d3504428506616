//! The client trait shared by the HTTP client and the mock.

use std::future::Future;
use std::sync::Arc;

use ruststack_cloudformation_model::error::CloudFormationError;
use ruststack_cloudformation_model::shapes::{self, OperationShape};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Result of a CloudFormation call.
pub type CloudFormationResult<T> = Result<T, CloudFormationError>;

macro_rules! operation_methods {
    ($($method:ident => $shape:ident;)*) => {
        $(
            #[doc = concat!("Invoke `", stringify!($shape), "`.")]
            fn $method(
                &self,
                input: <shapes::$shape as OperationShape>::Input,
            ) -> impl Future<Output = CloudFormationResult<<shapes::$shape as OperationShape>::Output>>
            + Send {
                self.execute::<shapes::$shape>(input)
            }
        )*
    };
}

/// A CloudFormation client.
///
/// Every operation is reachable through [`execute`](Self::execute) with its
/// shape marker, through the blocking and callback surfaces, or through its
/// named convenience method:
///
/// ```no_run
/// use ruststack_cloudformation_client::{CloudFormationClient, MockCloudFormationClient};
/// use ruststack_cloudformation_model::input::DescribeStacksInput;
/// use ruststack_cloudformation_model::shapes::DescribeStacks;
///
/// # async fn demo() -> Result<(), ruststack_cloudformation_model::CloudFormationError> {
/// let client = MockCloudFormationClient::new();
/// let a = client.execute::<DescribeStacks>(DescribeStacksInput::default()).await?;
/// let b = client.describe_stacks(DescribeStacksInput::default()).await?;
/// assert_eq!(a, b);
/// # Ok(())
/// # }
/// ```
pub trait CloudFormationClient: Send + Sync + 'static {
    /// Run operation `S` asynchronously.
    fn execute<S: OperationShape>(
        &self,
        input: S::Input,
    ) -> impl Future<Output = CloudFormationResult<S::Output>> + Send;

    /// Run operation `S` on `handle`, blocking the current thread until it
    /// completes.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    fn execute_blocking<S: OperationShape>(
        &self,
        input: S::Input,
        handle: &Handle,
    ) -> CloudFormationResult<S::Output> {
        handle.block_on(self.execute::<S>(input))
    }

    /// Run operation `S` as a task on `handle` and pass the result to
    /// `completion`, exactly once.
    fn execute_with_callback<S, F>(
        self: Arc<Self>,
        input: S::Input,
        handle: &Handle,
        completion: F,
    ) -> JoinHandle<()>
    where
        Self: Sized,
        S: OperationShape,
        F: FnOnce(CloudFormationResult<S::Output>) + Send + 'static,
    {
        handle.spawn(async move {
            let result = self.execute::<S>(input).await;
            completion(result);
        })
    }

    operation_methods! {
        create_stack => CreateStack;
        update_stack => UpdateStack;
        delete_stack => DeleteStack;
        cancel_update_stack => CancelUpdateStack;
        continue_update_rollback => ContinueUpdateRollback;
        rollback_stack => RollbackStack;
        update_termination_protection => UpdateTerminationProtection;
        signal_resource => SignalResource;
        describe_stacks => DescribeStacks;
        list_stacks => ListStacks;
        describe_stack_events => DescribeStackEvents;
        describe_stack_resource => DescribeStackResource;
        describe_stack_resources => DescribeStackResources;
        list_stack_resources => ListStackResources;
        get_template => GetTemplate;
        get_template_summary => GetTemplateSummary;
        validate_template => ValidateTemplate;
        estimate_template_cost => EstimateTemplateCost;
        get_stack_policy => GetStackPolicy;
        set_stack_policy => SetStackPolicy;
        create_change_set => CreateChangeSet;
        describe_change_set => DescribeChangeSet;
        execute_change_set => ExecuteChangeSet;
        delete_change_set => DeleteChangeSet;
        list_change_sets => ListChangeSets;
        detect_stack_drift => DetectStackDrift;
        describe_stack_drift_detection_status => DescribeStackDriftDetectionStatus;
        list_exports => ListExports;
        list_imports => ListImports;
        describe_account_limits => DescribeAccountLimits;
    }
}
