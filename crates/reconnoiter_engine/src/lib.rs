//! Reconnoiter engine: backend client, progress transports and the tracker
//! task that executes core effects.
mod api;
mod cable;
mod channel;
mod lifecycle;
mod poll;
mod tracker;
mod transport;
mod types;
mod wire;

pub use api::{ApiSettings, ComparisonApi, ReqwestComparisonApi, DEFAULT_USER_AGENT};
pub use cable::{
    parse_frame, subscribe_command, subscription_identifier, unsubscribe_command, CableFrame,
    DEFAULT_CHANNEL,
};
pub use channel::{ChannelSettings, ChannelTransport};
pub use lifecycle::{Navigator, ResourceCounts};
pub use poll::PollTransport;
pub use tracker::{CreateError, TrackerHandle, TrackerParts};
pub use transport::{NetworkTransports, SignalSink, Transport, TransportFactory};
pub use types::{ApiError, CreatedJob, TransportSignal};
pub use wire::{
    ChannelMessage, StatusKind, StatusResponse, COMPLETE_MESSAGE, ERROR_MESSAGE,
    PROCESSING_MESSAGE,
};
