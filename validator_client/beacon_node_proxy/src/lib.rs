//! Allows a prioritized list of remote beacon nodes to appear as a single
//! entity with "fallback" behaviour: duty workers call one API and never deal
//! with endpoint outages, retries or wire encodings.
//!
//! The proxy acquires a transport handle from the highest-priority usable
//! endpoint, issues the request through it, and translates wire records into
//! domain values. Duty results are delivered as a lazy, single-consumption
//! stream; dropping the stream cancels all further decoding and releases the
//! handle.

mod config;
mod duties;
mod endpoint;
mod proxy;
mod selector;

#[cfg(test)]
mod test_utils;

pub use config::{
    Config, DEFAULT_BEACON_NODE, DEFAULT_INITIAL_RETRY_COOLDOWN_SECS,
    DEFAULT_MAX_RETRY_COOLDOWN_SECS, DEFAULT_REQUEST_TIMEOUT_MILLIS,
};
pub use duties::{DecodeError, DutyStream};
pub use endpoint::{
    CandidateEndpoint, CandidateError, ConnectionState, EndpointHealth, EndpointRegistry,
    RetryPolicy,
};
pub use proxy::{BeaconNodeProxy, ProxyError};
pub use selector::{AcquireError, AllEndpointsUnavailable, ClientHandle, NodeSelector};
