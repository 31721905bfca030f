//! In-memory CloudWatch Logs service for testing.

use crate::api::{operations, LogsApi};
use crate::error::{CredentialsError, LogsError, NetworkError};
use crate::types::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

/// A failure injected into a mock call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Respond with this non-2xx status code and an empty body.
    Status(u16),
    /// Fail with a service exception carrying this code.
    Service(String),
    /// Fail with a stale sequence token error.
    StaleToken,
    /// Fail with a connection error.
    Network,
    /// Fail because no credentials could be found.
    Credentials,
}

impl MockFailure {
    /// Resolve into the result a call returns: a response built from the
    /// status for [`MockFailure::Status`], an error otherwise.
    fn respond<R>(self, with_status: impl FnOnce(u16) -> R) -> Result<R, LogsError> {
        match self {
            MockFailure::Status(status_code) => Ok(with_status(status_code)),
            MockFailure::Service(code) => Err(LogsError::Service {
                code,
                message: "injected by mock".to_string(),
                request_id: None,
            }),
            MockFailure::StaleToken => Err(LogsError::StaleToken {
                message: "injected by mock".to_string(),
                expected_token: None,
            }),
            MockFailure::Network => Err(LogsError::Network(NetworkError::ConnectionReset)),
            MockFailure::Credentials => Err(LogsError::Credentials(CredentialsError::NotFound)),
        }
    }
}

/// A call received by [`MockLogsApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `DescribeLogGroups`
    DescribeLogGroups(DescribeLogGroupsRequest),
    /// `CreateLogGroup`
    CreateLogGroup(CreateLogGroupRequest),
    /// `DescribeLogStreams`
    DescribeLogStreams(DescribeLogStreamsRequest),
    /// `CreateLogStream`
    CreateLogStream(CreateLogStreamRequest),
    /// `PutLogEvents`
    PutLogEvents(PutLogEventsRequest),
}

impl MockCall {
    /// Operation name of the call.
    pub fn operation(&self) -> &'static str {
        match self {
            MockCall::DescribeLogGroups(_) => operations::DESCRIBE_LOG_GROUPS,
            MockCall::CreateLogGroup(_) => operations::CREATE_LOG_GROUP,
            MockCall::DescribeLogStreams(_) => operations::DESCRIBE_LOG_STREAMS,
            MockCall::CreateLogStream(_) => operations::CREATE_LOG_STREAM,
            MockCall::PutLogEvents(_) => operations::PUT_LOG_EVENTS,
        }
    }
}

type PutHook = Box<dyn Fn(&PutLogEventsRequest) -> Option<MockFailure> + Send + Sync>;

#[derive(Default)]
struct StreamState {
    // Number of successful appends; the current token is its decimal form.
    sequence: u64,
}

impl StreamState {
    fn token(&self) -> Option<String> {
        (self.sequence > 0).then(|| self.sequence.to_string())
    }
}

#[derive(Default)]
struct State {
    groups: BTreeMap<String, BTreeMap<String, StreamState>>,
    calls: Vec<MockCall>,
    failures: HashMap<&'static str, VecDeque<MockFailure>>,
    in_flight: HashMap<DestinationKey, usize>,
    max_in_flight: HashMap<DestinationKey, usize>,
}

/// In-memory CloudWatch Logs.
///
/// Groups and streams are created on request and sequence tokens are
/// validated like the real service: an append must present the stream's
/// current token (none for a stream never written to) or it fails with
/// [`LogsError::StaleToken`]. Each successful append advances the token
/// to the next integer.
pub struct MockLogsApi {
    state: Mutex<State>,
    put_hook: Mutex<Option<PutHook>>,
    latency: Duration,
    page_size: usize,
}

impl MockLogsApi {
    /// Create an empty service.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            put_hook: Mutex::new(None),
            latency: Duration::ZERO,
            page_size: 50,
        }
    }

    /// Delay every `PutLogEvents` call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Maximum items per describe page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Pre-create a group.
    pub fn with_group(self, group: &str) -> Self {
        self.state.lock().groups.entry(group.to_string()).or_default();
        self
    }

    /// Pre-create a stream whose current token is `sequence` (0 = never written).
    pub fn with_stream(self, group: &str, stream: &str, sequence: u64) -> Self {
        self.state
            .lock()
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(stream.to_string(), StreamState { sequence });
        self
    }

    /// Fail the next `times` calls of `operation`.
    pub fn fail_next(&self, operation: &'static str, times: usize, failure: MockFailure) {
        let mut state = self.state.lock();
        let queue = state.failures.entry(operation).or_default();
        queue.extend(std::iter::repeat(failure).take(times));
    }

    /// Decide per append whether it should fail.
    pub fn on_put<F>(&self, hook: F)
    where
        F: Fn(&PutLogEventsRequest) -> Option<MockFailure> + Send + Sync + 'static,
    {
        *self.put_hook.lock() = Some(Box::new(hook));
    }

    /// Advance a stream's token as if another writer had appended.
    pub fn advance_token(&self, group: &str, stream: &str) {
        if let Some(state) = self
            .state
            .lock()
            .groups
            .get_mut(group)
            .and_then(|streams| streams.get_mut(stream))
        {
            state.sequence += 1;
        }
    }

    /// Delete a stream as another process would.
    pub fn delete_stream(&self, group: &str, stream: &str) {
        if let Some(streams) = self.state.lock().groups.get_mut(group) {
            streams.remove(stream);
        }
    }

    /// Current token of a stream.
    pub fn current_token(&self, group: &str, stream: &str) -> Option<String> {
        self.state
            .lock()
            .groups
            .get(group)
            .and_then(|streams| streams.get(stream))
            .and_then(StreamState::token)
    }

    /// All calls received, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    /// Operation names of all calls received, in order.
    pub fn operations(&self) -> Vec<&'static str> {
        self.state.lock().calls.iter().map(MockCall::operation).collect()
    }

    /// Number of calls received for an operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// All append requests received, in order.
    pub fn put_requests(&self) -> Vec<PutLogEventsRequest> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::PutLogEvents(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Highest number of appends seen in flight at once for a destination.
    pub fn max_concurrent_puts(&self, destination: &DestinationKey) -> usize {
        self.state
            .lock()
            .max_in_flight
            .get(destination)
            .copied()
            .unwrap_or(0)
    }

    /// Forget all recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn record(&self, call: MockCall) -> Option<MockFailure> {
        let mut state = self.state.lock();
        let operation = call.operation();
        state.calls.push(call);
        state
            .failures
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
    }

    fn page<T: Clone>(&self, items: Vec<T>, next_token: Option<&str>) -> (Vec<T>, Option<String>) {
        let start = next_token.and_then(|t| t.parse::<usize>().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(items.len());
        let next = (end < items.len()).then(|| end.to_string());
        (items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(), next)
    }
}

impl Default for MockLogsApi {
    fn default() -> Self {
        Self::new()
    }
}

fn resource_not_found(message: String) -> LogsError {
    LogsError::Service {
        code: "ResourceNotFoundException".to_string(),
        message,
        request_id: None,
    }
}

fn already_exists(message: String) -> LogsError {
    LogsError::Service {
        code: "ResourceAlreadyExistsException".to_string(),
        message,
        request_id: None,
    }
}

struct InFlight<'a> {
    api: &'a MockLogsApi,
    key: DestinationKey,
}

impl<'a> InFlight<'a> {
    fn enter(api: &'a MockLogsApi, key: DestinationKey) -> Self {
        let mut state = api.state.lock();
        let current = {
            let count = state.in_flight.entry(key.clone()).or_default();
            *count += 1;
            *count
        };
        let max = state.max_in_flight.entry(key.clone()).or_default();
        *max = (*max).max(current);
        drop(state);
        Self { api, key }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(count) = self.api.state.lock().in_flight.get_mut(&self.key) {
            *count = count.saturating_sub(1);
        }
    }
}

#[async_trait]
impl LogsApi for MockLogsApi {
    async fn describe_log_groups(
        &self,
        request: DescribeLogGroupsRequest,
    ) -> Result<DescribeLogGroupsResponse, LogsError> {
        if let Some(failure) = self.record(MockCall::DescribeLogGroups(request.clone())) {
            return failure.respond(|status_code| DescribeLogGroupsResponse {
                status_code,
                ..Default::default()
            });
        }

        let prefix = request.log_group_name_prefix.unwrap_or_default();
        let groups: Vec<LogGroup> = self
            .state
            .lock()
            .groups
            .keys()
            .filter(|name| name.starts_with(&prefix))
            .map(LogGroup::named)
            .collect();
        let (log_groups, next_token) = self.page(groups, request.next_token.as_deref());

        Ok(DescribeLogGroupsResponse {
            status_code: 200,
            log_groups,
            next_token,
        })
    }

    async fn create_log_group(
        &self,
        request: CreateLogGroupRequest,
    ) -> Result<CreateLogGroupResponse, LogsError> {
        if let Some(failure) = self.record(MockCall::CreateLogGroup(request.clone())) {
            return failure.respond(|status_code| CreateLogGroupResponse { status_code });
        }

        let mut state = self.state.lock();
        if state.groups.contains_key(&request.log_group_name) {
            return Err(already_exists(format!(
                "log group {} already exists",
                request.log_group_name
            )));
        }
        state.groups.insert(request.log_group_name, BTreeMap::new());
        Ok(CreateLogGroupResponse { status_code: 200 })
    }

    async fn describe_log_streams(
        &self,
        request: DescribeLogStreamsRequest,
    ) -> Result<DescribeLogStreamsResponse, LogsError> {
        if let Some(failure) = self.record(MockCall::DescribeLogStreams(request.clone())) {
            return failure.respond(|status_code| DescribeLogStreamsResponse {
                status_code,
                ..Default::default()
            });
        }

        let prefix = request.log_stream_name_prefix.unwrap_or_default();
        let streams: Vec<LogStream> = {
            let state = self.state.lock();
            let group = state.groups.get(&request.log_group_name).ok_or_else(|| {
                resource_not_found(format!("log group {} does not exist", request.log_group_name))
            })?;
            group
                .iter()
                .filter(|(name, _)| name.starts_with(&prefix))
                .map(|(name, stream)| LogStream {
                    upload_sequence_token: stream.token(),
                    ..LogStream::named(name.as_str())
                })
                .collect()
        };
        let (log_streams, next_token) = self.page(streams, request.next_token.as_deref());

        Ok(DescribeLogStreamsResponse {
            status_code: 200,
            log_streams,
            next_token,
        })
    }

    async fn create_log_stream(
        &self,
        request: CreateLogStreamRequest,
    ) -> Result<CreateLogStreamResponse, LogsError> {
        if let Some(failure) = self.record(MockCall::CreateLogStream(request.clone())) {
            return failure.respond(|status_code| CreateLogStreamResponse { status_code });
        }

        let mut state = self.state.lock();
        let group = state.groups.get_mut(&request.log_group_name).ok_or_else(|| {
            resource_not_found(format!("log group {} does not exist", request.log_group_name))
        })?;
        if group.contains_key(&request.log_stream_name) {
            return Err(already_exists(format!(
                "log stream {} already exists",
                request.log_stream_name
            )));
        }
        group.insert(request.log_stream_name, StreamState::default());
        Ok(CreateLogStreamResponse { status_code: 200 })
    }

    async fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, LogsError> {
        let key = DestinationKey::new(
            request.log_group_name.as_str(),
            request.log_stream_name.as_str(),
        );
        let _in_flight = InFlight::enter(self, key);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let injected = self.record(MockCall::PutLogEvents(request.clone())).or_else(|| {
            self.put_hook
                .lock()
                .as_ref()
                .and_then(|hook| hook(&request))
        });
        if let Some(failure) = injected {
            return failure.respond(|status_code| PutLogEventsResponse {
                status_code,
                ..Default::default()
            });
        }

        let mut state = self.state.lock();
        let stream = state
            .groups
            .get_mut(&request.log_group_name)
            .and_then(|streams| streams.get_mut(&request.log_stream_name))
            .ok_or_else(|| {
                resource_not_found(format!(
                    "log stream {}:{} does not exist",
                    request.log_group_name, request.log_stream_name
                ))
            })?;

        let expected = stream.token();
        if request.sequence_token != expected {
            return Err(LogsError::StaleToken {
                message: format!(
                    "The given sequenceToken is invalid. The next expected sequenceToken is: {}",
                    expected.as_deref().unwrap_or("null")
                ),
                expected_token: expected,
            });
        }

        stream.sequence += 1;
        Ok(PutLogEventsResponse {
            status_code: 200,
            next_sequence_token: stream.token(),
            rejected_log_events_info: None,
        })
    }
}

impl std::fmt::Debug for MockLogsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockLogsApi")
            .field("groups", &state.groups.len())
            .field("calls", &state.calls.len())
            .finish_non_exhaustive()
    }
}
