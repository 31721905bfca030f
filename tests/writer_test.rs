//! Integration tests for LogsWriter.

use aws_cloudwatch_logs::api::operations;
use aws_cloudwatch_logs::mocks::{MockFailure, MockLogsApi, TestFixtures};
use aws_cloudwatch_logs::resilience::no_delay;
use aws_cloudwatch_logs::{DestinationKey, LogDatum, LogsError, LogsWriter, TokenCache, WriterSettings};
use futures::future::{join_all, try_join_all};
use std::sync::Arc;
use std::time::Duration;

fn create_test_writer(api: Arc<MockLogsApi>) -> LogsWriter {
    LogsWriter::new(api, WriterSettings::new(5, no_delay()), TokenCache::new())
}

#[tokio::test]
async fn test_first_write_provisions_destination() {
    let api = Arc::new(MockLogsApi::new());
    let writer = create_test_writer(api.clone());

    writer.write(TestFixtures::batch("g1", "s1", 2)).await.unwrap();

    assert_eq!(
        api.operations(),
        vec![
            operations::DESCRIBE_LOG_GROUPS,
            operations::CREATE_LOG_GROUP,
            operations::DESCRIBE_LOG_STREAMS,
            operations::CREATE_LOG_STREAM,
            operations::PUT_LOG_EVENTS,
        ]
    );
    assert_eq!(api.put_requests()[0].sequence_token, None);
    assert_eq!(
        writer.cache().get(&DestinationKey::new("g1", "s1")).await,
        Some(Some("1".to_string()))
    );

    api.clear_calls();
    writer.write(TestFixtures::batch("g1", "s1", 1)).await.unwrap();

    assert_eq!(api.operations(), vec![operations::PUT_LOG_EVENTS]);
    assert_eq!(api.put_requests()[0].sequence_token.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_retries_transient_failures() {
    let api = Arc::new(MockLogsApi::new().with_stream("g", "s", 0));
    api.fail_next(operations::PUT_LOG_EVENTS, 3, MockFailure::Status(500));
    let writer = create_test_writer(api.clone());

    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();

    assert_eq!(api.call_count(operations::PUT_LOG_EVENTS), 4);
}

#[tokio::test]
async fn test_service_exceptions_are_retried() {
    let api = Arc::new(MockLogsApi::new().with_stream("g", "s", 0));
    api.fail_next(
        operations::PUT_LOG_EVENTS,
        1,
        MockFailure::Service("ThrottlingException".to_string()),
    );
    api.fail_next(operations::PUT_LOG_EVENTS, 1, MockFailure::Network);
    let writer = create_test_writer(api.clone());

    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();

    assert_eq!(api.call_count(operations::PUT_LOG_EVENTS), 3);
}

#[tokio::test]
async fn test_gives_up_after_retry_ceiling() {
    let api = Arc::new(MockLogsApi::new().with_stream("g", "s", 0));
    api.fail_next(operations::PUT_LOG_EVENTS, 100, MockFailure::Status(503));
    let writer = create_test_writer(api.clone());

    let result = writer.write(TestFixtures::batch("g", "s", 1)).await;

    match result {
        Err(LogsError::FailedRequest {
            request_name,
            status_code,
        }) => {
            assert_eq!(request_name, "PutLogEvents");
            assert_eq!(status_code, 503);
        }
        other => panic!("Expected FailedRequest, got {:?}", other),
    }
    assert_eq!(api.call_count(operations::PUT_LOG_EVENTS), 6);
}

#[tokio::test(start_paused = true)]
async fn test_default_backoff_between_attempts() {
    let api = Arc::new(MockLogsApi::new().with_stream("g", "s", 0));
    api.fail_next(operations::PUT_LOG_EVENTS, 2, MockFailure::Status(500));
    let writer = LogsWriter::new(api.clone(), WriterSettings::default(), TokenCache::new());
    let started = tokio::time::Instant::now();

    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();

    // 2s before the first retry, 4s before the second
    assert_eq!(started.elapsed().as_secs(), 6);
}

#[tokio::test]
async fn test_stale_token_evicts_and_next_write_reinitializes() {
    let api = Arc::new(MockLogsApi::new());
    let writer = create_test_writer(api.clone());
    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();

    // Someone else appended, so the cached token "1" is out of date.
    api.advance_token("g", "s");
    api.clear_calls();

    let result = writer.write(TestFixtures::batch("g", "s", 1)).await;
    assert!(matches!(result, Err(LogsError::StaleToken { .. })));
    assert_eq!(api.operations(), vec![operations::PUT_LOG_EVENTS]);
    assert_eq!(writer.cache().get(&DestinationKey::new("g", "s")).await, None);

    api.clear_calls();
    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();

    assert_eq!(
        api.operations(),
        vec![
            operations::DESCRIBE_LOG_GROUPS,
            operations::DESCRIBE_LOG_STREAMS,
            operations::PUT_LOG_EVENTS,
        ]
    );
    assert_eq!(api.put_requests()[0].sequence_token.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_writes_reach_destination_in_call_order() {
    let api = Arc::new(MockLogsApi::new().with_latency(Duration::from_millis(2)));
    let writer = create_test_writer(api.clone());

    let completions: Vec<_> = (0..10)
        .map(|i| writer.write(vec![LogDatum::new(format!("batch {}", i), "g", "s")]))
        .collect();
    try_join_all(completions).await.unwrap();

    let messages: Vec<String> = api
        .put_requests()
        .into_iter()
        .map(|request| request.log_events[0].message.clone())
        .collect();
    let expected: Vec<String> = (0..10).map(|i| format!("batch {}", i)).collect();
    assert_eq!(messages, expected);
}

#[tokio::test]
async fn test_failed_write_does_not_block_the_queue() {
    let api = Arc::new(MockLogsApi::new().with_stream("g", "s", 0));
    api.on_put(|request| {
        request
            .log_events
            .iter()
            .any(|event| event.message == "poison")
            .then(|| MockFailure::Status(400))
    });
    let writer = LogsWriter::new(api.clone(), WriterSettings::new(0, no_delay()), TokenCache::new());

    let poisoned = writer.write(vec![LogDatum::new("poison", "g", "s")]);
    let healthy = writer.write(vec![LogDatum::new("fine", "g", "s")]);

    assert!(poisoned.await.is_err());
    healthy.await.unwrap();
    assert_eq!(api.current_token("g", "s").as_deref(), Some("1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_never_reuse_a_token() {
    let api = Arc::new(MockLogsApi::new().with_latency(Duration::from_millis(1)));
    let cache = TokenCache::new();
    let writers: Vec<Arc<LogsWriter>> = (0..4)
        .map(|_| {
            Arc::new(LogsWriter::new(
                api.clone(),
                WriterSettings::new(5, no_delay()),
                cache.clone(),
            ))
        })
        .collect();

    let tasks: Vec<_> = writers
        .iter()
        .enumerate()
        .map(|(w, writer)| {
            let writer = writer.clone();
            tokio::spawn(async move {
                for i in 0..10 {
                    writer
                        .write(vec![LogDatum::new(format!("w{} m{}", w, i), "shared", "stream")])
                        .await?;
                }
                Ok::<_, LogsError>(())
            })
        })
        .collect();
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let tokens: Vec<Option<String>> = api
        .put_requests()
        .into_iter()
        .map(|request| request.sequence_token)
        .collect();
    let expected: Vec<Option<String>> = std::iter::once(None)
        .chain((1..40).map(|n| Some(n.to_string())))
        .collect();
    assert_eq!(tokens, expected);
    assert_eq!(api.call_count(operations::CREATE_LOG_STREAM), 1);
    assert_eq!(
        api.max_concurrent_puts(&DestinationKey::new("shared", "stream")),
        1
    );
}

#[tokio::test]
async fn test_destinations_in_one_batch_are_independent() {
    let api = Arc::new(
        MockLogsApi::new()
            .with_stream("g", "good", 0)
            .with_stream("g", "bad", 0),
    );
    api.on_put(|request| (request.log_stream_name == "bad").then(|| MockFailure::Status(500)));
    let writer = LogsWriter::new(api.clone(), WriterSettings::new(1, no_delay()), TokenCache::new());

    let result = writer
        .write(vec![
            LogDatum::new("a", "g", "bad"),
            LogDatum::new("b", "g", "good"),
        ])
        .await;

    assert!(matches!(result, Err(LogsError::FailedRequest { .. })));
    assert_eq!(api.current_token("g", "good").as_deref(), Some("1"));
    assert_eq!(api.current_token("g", "bad"), None);
}

#[tokio::test]
async fn test_events_are_sorted_per_request() {
    let api = Arc::new(MockLogsApi::new());
    let writer = create_test_writer(api.clone());

    writer
        .write(vec![
            TestFixtures::datum("late", "g", "s", 300),
            TestFixtures::datum("early", "g", "s", 100),
            TestFixtures::datum("middle", "g", "s", 200),
        ])
        .await
        .unwrap();

    let request = &api.put_requests()[0];
    let messages: Vec<&str> = request.log_events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["early", "middle", "late"]);
    assert!(request
        .log_events
        .windows(2)
        .all(|pair| pair[0].timestamp < pair[1].timestamp));
}

#[tokio::test]
async fn test_empty_batch_makes_no_calls() {
    let api = Arc::new(MockLogsApi::new());
    let writer = create_test_writer(api.clone());

    writer.write(Vec::new()).await.unwrap();

    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_dropped_completion_skips_queued_write() {
    let api = Arc::new(MockLogsApi::new());
    let writer = create_test_writer(api.clone());

    let kept = writer.write(vec![LogDatum::new("kept", "g", "s")]);
    drop(writer.write(vec![LogDatum::new("dropped", "g", "s")]));
    kept.await.unwrap();
    writer.flush().await;

    let messages: Vec<String> = api
        .put_requests()
        .into_iter()
        .flat_map(|request| request.log_events)
        .map(|event| event.message)
        .collect();
    assert_eq!(messages, vec!["kept".to_string()]);
}

#[tokio::test]
async fn test_cancelled_append_forces_reresolution() {
    let api = Arc::new(MockLogsApi::new().with_stream("g", "s", 0));
    let cache = TokenCache::new();
    let writer = LogsWriter::new(api.clone(), WriterSettings::new(5, no_delay()), cache.clone());
    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();

    let slow_api = Arc::new(
        MockLogsApi::new()
            .with_stream("g", "s", 1)
            .with_latency(Duration::from_millis(200)),
    );
    let slow_writer = LogsWriter::new(slow_api, WriterSettings::new(0, no_delay()), cache.clone());

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        slow_writer.write(TestFixtures::batch("g", "s", 1)),
    )
    .await;
    slow_writer.flush().await;

    assert!(result.is_err());
    assert_eq!(cache.get(&DestinationKey::new("g", "s")).await, None);

    api.clear_calls();
    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();
    assert_eq!(
        api.operations(),
        vec![
            operations::DESCRIBE_LOG_GROUPS,
            operations::DESCRIBE_LOG_STREAMS,
            operations::PUT_LOG_EVENTS,
        ]
    );
}

#[tokio::test]
async fn test_flush_waits_for_queued_writes() {
    let api = Arc::new(MockLogsApi::new().with_latency(Duration::from_millis(5)));
    let writer = create_test_writer(api.clone());

    let completions: Vec<_> = (0..3)
        .map(|_| writer.write(TestFixtures::batch("g", "s", 2)))
        .collect();
    writer.flush().await;

    assert_eq!(api.put_requests().len(), 3);
    for completion in completions {
        completion.await.unwrap();
    }
}

#[tokio::test]
async fn test_deleted_stream_is_provisioned_again() {
    let api = Arc::new(MockLogsApi::new());
    let writer = LogsWriter::new(api.clone(), WriterSettings::new(1, no_delay()), TokenCache::new());
    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();

    api.delete_stream("g", "s");
    let result = writer.write(TestFixtures::batch("g", "s", 1)).await;
    assert_eq!(
        result.unwrap_err().error_code(),
        Some("ResourceNotFoundException")
    );
    assert_eq!(writer.cache().get(&DestinationKey::new("g", "s")).await, None);

    api.clear_calls();
    writer.write(TestFixtures::batch("g", "s", 1)).await.unwrap();
    assert_eq!(
        api.operations(),
        vec![
            operations::DESCRIBE_LOG_GROUPS,
            operations::DESCRIBE_LOG_STREAMS,
            operations::CREATE_LOG_STREAM,
            operations::PUT_LOG_EVENTS,
        ]
    );
    assert_eq!(api.put_requests()[0].sequence_token, None);
}
