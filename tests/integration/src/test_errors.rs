//! Error translation, retries and cancellation over a real socket.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use ruststack_cloudformation_client::CloudFormationClient;
    use ruststack_cloudformation_model::error::{CloudFormationError, CloudFormationErrorCode};
    use ruststack_cloudformation_model::input::{
        CreateStackInput, DescribeStackEventsInput, DescribeStacksInput, ExecuteChangeSetInput,
    };
    use ruststack_cloudformation_model::shapes::DescribeStackEvents;
    use tokio_util::sync::CancellationToken;

    use crate::{FakeCloudFormation, Reply, client_for_port};

    fn create_stack_input() -> CreateStackInput {
        CreateStackInput {
            stack_name: "web".to_owned(),
            template_body: Some("{}".to_owned()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_should_reject_request_signed_with_wrong_secret() {
        let server = FakeCloudFormation::start(|_| Reply::ok("{}")).await;

        let err = server
            .client_with_secret("not-the-secret")
            .describe_stacks(DescribeStacksInput::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CloudFormationError::Client {
                status: 403,
                retriable: false,
                ..
            }
        ));
        assert_eq!(err.code(), Some("SignatureDoesNotMatch"));
        let calls = server.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].signature.is_err());
    }

    #[tokio::test]
    async fn test_should_decode_declared_error() {
        let server = FakeCloudFormation::start(|_| {
            Reply::error(400, "AlreadyExistsException", "Stack [web] already exists")
        })
        .await;

        let err = server
            .client()
            .create_stack(create_stack_input())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CloudFormationError::declared(
                CloudFormationErrorCode::AlreadyExistsException,
                "Stack [web] already exists"
            )
        );
        assert_eq!(server.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_should_decode_namespaced_error_code() {
        let server = FakeCloudFormation::start(|_| {
            Reply::error(
                400,
                "com.amazonaws.cloudformation#InvalidChangeSetStatusException",
                "change set is not executable",
            )
        })
        .await;

        let err = server
            .client()
            .execute_change_set(ExecuteChangeSetInput {
                change_set_name: "cs-1".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.declared_code(),
            Some(CloudFormationErrorCode::InvalidChangeSetStatusException)
        );
    }

    #[tokio::test]
    async fn test_should_retry_until_service_recovers() {
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&attempts);
        let server = FakeCloudFormation::start(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                Reply::error(500, "InternalFailure", "try again")
            } else {
                Reply::ok(r#"{"Stacks":[]}"#)
            }
        })
        .await;

        let output = server
            .client()
            .describe_stacks(DescribeStacksInput::default())
            .await
            .unwrap();

        assert!(output.stacks.is_empty());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_should_return_last_error_when_attempts_run_out() {
        let server = FakeCloudFormation::start(|_| {
            Reply::error(400, "Throttling", "Rate exceeded")
        })
        .await;

        let err = server
            .client()
            .describe_stacks(DescribeStacksInput::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("Throttling"));
        assert!(err.is_retriable());
        assert_eq!(server.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_should_not_retry_declared_non_retriable_error() {
        let server = FakeCloudFormation::start(|_| {
            Reply::error(400, "LimitExceededException", "too many stacks")
        })
        .await;

        let err = server
            .client()
            .create_stack(create_stack_input())
            .await
            .unwrap_err();

        assert!(!err.is_retriable());
        assert_eq!(server.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_should_report_unreachable_endpoint_as_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client_for_port(port, crate::SECRET_KEY)
            .describe_stacks(DescribeStacksInput::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CloudFormationError::Transport {
                retriable: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_should_cancel_call_while_waiting_for_response() {
        let server =
            FakeCloudFormation::start(|_| Reply::ok("{}").after(Duration::from_secs(30))).await;
        let client = server.client();
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                token.cancel();
            })
        };

        let started = std::time::Instant::now();
        let err = client
            .execute_cancellable::<DescribeStackEvents>(
                DescribeStackEventsInput {
                    stack_name: Some("web".to_owned()),
                    ..Default::default()
                },
                token,
            )
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert_eq!(err, CloudFormationError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
