//! RustStack CloudFormation CLI - run one CloudFormation operation.
//!
//! # Usage
//!
//! ```text
//! ruststack-cloudformation <Operation> [json | -]
//! ruststack-cloudformation --list
//! ```
//!
//! The input is the operation's JSON request body, e.g.
//! `{"StackName":"web"}`; `-` reads it from stdin and an omitted input sends
//! the empty request. The output is printed as pretty JSON.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CLOUDFORMATION_ENDPOINT` | regional AWS host | Endpoint host |
//! | `CLOUDFORMATION_PORT` | `80` | Endpoint port |
//! | `AWS_REGION` | `us-east-1` | Signing region |
//! | `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` | *(required)* | Credentials |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! Only plain HTTP endpoints are supported, so `CLOUDFORMATION_PROTOCOL`
//! defaults to `http` here.

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use ruststack_auth::EnvironmentCredentialsProvider;
use ruststack_cloudformation_client::{AwsCloudFormationClient, CloudFormationClient};
use ruststack_cloudformation_model::operations::CloudFormationOperation;
use ruststack_cloudformation_model::shapes::{self, OperationShape};
use ruststack_core::{ClientConfig, EndpointProtocol};
use ruststack_http_client::{HyperTransport, TracingMetricsSink};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: ruststack-cloudformation <Operation> [json | -]
       ruststack-cloudformation --list";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Decode `input` as the request of `S`, run it, and render the output.
async fn invoke<C, S>(client: &C, input: &str) -> Result<String>
where
    C: CloudFormationClient,
    S: OperationShape,
{
    let request: S::Input = if input.trim().is_empty() {
        S::Input::default()
    } else {
        serde_json::from_str(input)
            .with_context(|| format!("invalid {} input", S::OPERATION))?
    };
    debug!(operation = %S::OPERATION, ?request, "invoking operation");

    let output = client
        .execute::<S>(request)
        .await
        .with_context(|| format!("{} failed", S::OPERATION))?;
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Run `operation` with the JSON `input` and return the JSON output.
async fn run_operation<C: CloudFormationClient>(
    client: &C,
    operation: CloudFormationOperation,
    input: &str,
) -> Result<String> {
    macro_rules! dispatch {
        ($($shape:ident),* $(,)?) => {
            match operation {
                $(CloudFormationOperation::$shape => {
                    invoke::<C, shapes::$shape>(client, input).await
                })*
            }
        };
    }

    dispatch!(
        CreateStack,
        UpdateStack,
        DeleteStack,
        CancelUpdateStack,
        ContinueUpdateRollback,
        RollbackStack,
        UpdateTerminationProtection,
        SignalResource,
        DescribeStacks,
        ListStacks,
        DescribeStackEvents,
        DescribeStackResource,
        DescribeStackResources,
        ListStackResources,
        GetTemplate,
        GetTemplateSummary,
        ValidateTemplate,
        EstimateTemplateCost,
        GetStackPolicy,
        SetStackPolicy,
        CreateChangeSet,
        DescribeChangeSet,
        ExecuteChangeSet,
        DeleteChangeSet,
        ListChangeSets,
        DetectStackDrift,
        DescribeStackDriftDetectionStatus,
        ListExports,
        ListImports,
        DescribeAccountLimits,
    )
}

fn read_input(arg: Option<String>) -> Result<String> {
    match arg.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read input from stdin")?;
            Ok(buf)
        }
        Some(json) => Ok(json.to_owned()),
        None => Ok(String::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = ClientConfig::from_env().context("invalid client configuration")?;
    if std::env::var("CLOUDFORMATION_PROTOCOL").is_err() {
        config.protocol = EndpointProtocol::Http;
    }
    init_tracing(&config.log_level)?;

    let mut args = std::env::args().skip(1);
    let Some(name) = args.next() else {
        anyhow::bail!(USAGE);
    };
    if name == "--list" {
        for operation in CloudFormationOperation::ALL {
            println!("{operation}");
        }
        return Ok(());
    }

    let operation = CloudFormationOperation::from_name(&name)
        .with_context(|| format!("unknown operation {name:?}; try --list"))?;
    let input = read_input(args.next())?;

    let client = AwsCloudFormationClient::new(
        &config,
        Arc::new(EnvironmentCredentialsProvider),
        Arc::new(HyperTransport::new()),
    )
    .with_metrics(Arc::new(TracingMetricsSink));

    let output = run_operation(&client, operation, &input).await?;
    println!("{output}");
    Ok(())
}
