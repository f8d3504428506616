//! Stack lifecycle calls against the in-process server.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ruststack_cloudformation_client::CloudFormationClient;
    use ruststack_cloudformation_model::input::{
        CreateChangeSetInput, CreateStackInput, DeleteStackInput, DescribeStacksInput,
        ListStacksInput,
    };
    use ruststack_cloudformation_model::shapes::{DescribeStacks, ListStacks};
    use ruststack_cloudformation_model::types::{
        Capability, ChangeSetType, Parameter, StackStatus,
    };
    use ruststack_http_client::{AttemptRecord, MetricsError, MetricsSink};

    use crate::{FakeCloudFormation, Reply};

    const STACK_ID: &str = "arn:aws:cloudformation:us-east-1:000000000000:stack/web/5a3c";

    fn stack_api(call: &crate::RecordedCall) -> Reply {
        match call.operation.as_deref() {
            Some("CreateStack") => {
                Reply::ok(serde_json::json!({ "StackId": STACK_ID }).to_string())
            }
            Some("DescribeStacks") => Reply::ok(
                serde_json::json!({
                    "Stacks": [{
                        "StackId": STACK_ID,
                        "StackName": call.json()["StackName"],
                        "CreationTime": "2024-05-01T12:00:00Z",
                        "StackStatus": "CREATE_COMPLETE",
                        "Outputs": [{ "OutputKey": "Url", "OutputValue": "http://web" }]
                    }]
                })
                .to_string(),
            ),
            Some("ListStacks") => Reply::ok(
                serde_json::json!({
                    "StackSummaries": [{
                        "StackName": "web",
                        "CreationTime": "2024-05-01T12:00:00Z",
                        "StackStatus": "UPDATE_COMPLETE"
                    }]
                })
                .to_string(),
            ),
            Some("CreateChangeSet") => Reply::ok(
                serde_json::json!({ "Id": "arn:changeSet/cs-1", "StackId": STACK_ID }).to_string(),
            ),
            Some("DeleteStack") => Reply::ok(""),
            _ => Reply::error(400, "InvalidAction", "unsupported operation"),
        }
    }

    #[tokio::test]
    async fn test_should_create_and_describe_stack() {
        let server = FakeCloudFormation::start(stack_api).await;
        let client = server.client();

        let created = client
            .create_stack(CreateStackInput {
                stack_name: "web".to_owned(),
                template_body: Some("{\"Resources\":{}}".to_owned()),
                parameters: vec![Parameter::new("Env", "prod")],
                capabilities: vec![Capability::Iam],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.stack_id.as_deref(), Some(STACK_ID));
        assert!(created.request_id.is_some());

        let described = client
            .describe_stacks(DescribeStacksInput {
                stack_name: Some("web".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap();
        let stack = &described.stacks[0];
        assert_eq!(stack.stack_name, "web");
        assert_eq!(stack.stack_status, StackStatus::CreateComplete);
        assert_eq!(stack.outputs[0].output_value.as_deref(), Some("http://web"));

        let calls = server.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].target.as_deref(),
            Some("CloudFormation_20100515.CreateStack")
        );
        assert_eq!(
            calls[0].content_type.as_deref(),
            Some("application/x-amz-json-1.0")
        );
        assert_eq!(
            calls[0].json(),
            serde_json::json!({
                "StackName": "web",
                "TemplateBody": "{\"Resources\":{}}",
                "Parameters": [{ "ParameterKey": "Env", "ParameterValue": "prod" }],
                "Capabilities": ["CAPABILITY_IAM"]
            })
        );
        for call in &calls {
            let signature = call.signature.as_ref().unwrap();
            assert_eq!(signature.region, "us-east-1");
            assert_eq!(signature.service, "cloudformation");
            assert!(signature.signed_headers.iter().any(|h| h == "x-amz-target"));
        }
    }

    #[tokio::test]
    async fn test_should_complete_void_operation() {
        let server = FakeCloudFormation::start(stack_api).await;

        server
            .client()
            .delete_stack(DeleteStackInput {
                stack_name: "web".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(server.calls()[0].operation.as_deref(), Some("DeleteStack"));
    }

    #[tokio::test]
    async fn test_should_send_enum_fields_in_wire_form() {
        let server = FakeCloudFormation::start(stack_api).await;

        let output = server
            .client()
            .create_change_set(CreateChangeSetInput {
                stack_name: "web".to_owned(),
                change_set_name: "cs-1".to_owned(),
                change_set_type: Some(ChangeSetType::Create),
                use_previous_template: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(output.id.as_deref(), Some("arn:changeSet/cs-1"));
        let body = server.calls()[0].json();
        assert_eq!(body["ChangeSetType"], "CREATE");
        assert_eq!(body["UsePreviousTemplate"], true);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_should_run_concurrent_calls_independently() {
        let server = FakeCloudFormation::start(stack_api).await;
        let client = server.client();

        let calls = (0..8).map(|i| {
            let client = client.clone();
            async move {
                client
                    .describe_stacks(DescribeStacksInput {
                        stack_name: Some(format!("stack-{i}")),
                        ..Default::default()
                    })
                    .await
            }
        });
        let results = futures::future::join_all(calls).await;

        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap().stacks[0].stack_name, format!("stack-{i}"));
        }
        assert_eq!(server.calls().len(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_should_deliver_result_to_completion_callback() {
        let server = FakeCloudFormation::start(stack_api).await;
        let client = Arc::new(server.client());
        let (tx, rx) = tokio::sync::oneshot::channel();

        let task = client.execute_with_callback::<ListStacks, _>(
            ListStacksInput::default(),
            &tokio::runtime::Handle::current(),
            move |result| {
                let _ = tx.send(result);
            },
        );

        let output = rx.await.unwrap().unwrap();
        task.await.unwrap();
        assert_eq!(output.stack_summaries[0].stack_status, StackStatus::UpdateComplete);
    }

    #[test]
    fn test_should_block_on_runtime_handle() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(FakeCloudFormation::start(stack_api));
        let client = server.client();

        let output = client
            .execute_blocking::<DescribeStacks>(
                DescribeStacksInput {
                    stack_name: Some("web".to_owned()),
                    ..Default::default()
                },
                runtime.handle(),
            )
            .unwrap();

        assert_eq!(output.stacks[0].stack_id.as_deref(), Some(STACK_ID));
        drop(server);
    }

    #[derive(Default)]
    struct RecordingSink {
        records: parking_lot::Mutex<Vec<AttemptRecord>>,
    }

    impl MetricsSink for RecordingSink {
        fn record(&self, record: &AttemptRecord) -> Result<(), MetricsError> {
            self.records.lock().push(record.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_should_tag_attempt_records() {
        let server = FakeCloudFormation::start(stack_api).await;
        let sink = Arc::new(RecordingSink::default());
        let client = server
            .client()
            .with_metrics(sink.clone())
            .with_request_tag("caller", "integration");

        client
            .list_stacks(ListStacksInput::default())
            .await
            .unwrap();

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, "ListStacks");
        assert_eq!(records[0].status, Some(200));
        assert!(records[0].succeeded);
        assert!(!records[0].will_retry);
        assert_eq!(
            records[0].request_tags.get("caller").map(String::as_str),
            Some("integration")
        );
    }
}
