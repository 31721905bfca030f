//! Data types for the CloudWatch Logs integration.
//!
//! [`LogDatum`] and [`DestinationKey`] are what callers hand to the writer.
//! The remaining types mirror the service's JSON protocol.

mod common;
mod datum;
mod requests;
mod responses;

pub use common::{InputLogEvent, LogGroup, LogStream, RejectedLogEventsInfo};
pub use datum::{DestinationKey, LogDatum};
pub use requests::{
    CreateLogGroupRequest, CreateLogStreamRequest, DescribeLogGroupsRequest,
    DescribeLogStreamsRequest, PutLogEventsRequest,
};
pub use responses::{
    CreateLogGroupResponse, CreateLogStreamResponse, DescribeLogGroupsResponse,
    DescribeLogStreamsResponse, PutLogEventsResponse,
};
