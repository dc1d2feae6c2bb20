//! Obtains a usable transport handle from the endpoint registry, applying
//! failover in strict priority order.

use crate::endpoint::{
    BeginConnect, CandidateEndpoint, CandidateError, EndpointRegistry, RetryPolicy,
};
use beacon_api_client::{BeaconApi, Error as ApiError};
use slog::{debug, warn, Logger};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Why one endpoint did not yield a usable client during a single
/// `acquire_client` pass.
#[derive(Debug)]
pub enum AcquireError {
    /// The endpoint was skipped without a connection attempt.
    Unavailable(CandidateError),
    /// A connection attempt was made and failed.
    ConnectFailed(ApiError),
}

/// Every configured endpoint either failed to connect or was in cool-down
/// for this attempt, with the per-endpoint reasons.
///
/// Fatal for the call that raised it only; a later call may succeed once an
/// endpoint recovers.
#[derive(Debug)]
pub struct AllEndpointsUnavailable(pub Vec<(String, AcquireError)>);

impl fmt::Display for AllEndpointsUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "All endpoints unavailable, num_failed: {}", self.0.len())?;
        for (i, (address, error)) in self.0.iter().enumerate() {
            let comma = if i + 1 < self.0.len() { "," } else { "" };
            write!(f, " {} => {:?}{}", address, error, comma)?;
        }
        Ok(())
    }
}

/// A transport handle bound to a single endpoint.
///
/// Holding the handle leases the endpoint; dropping it releases the lease, so
/// cancellation (e.g. abandoning a duty stream) deterministically lets go of
/// the transport. Concurrent handles to the same endpoint are independent.
pub struct ClientHandle<C> {
    client: C,
    endpoint: Arc<CandidateEndpoint<C>>,
}

impl<C: Clone> ClientHandle<C> {
    fn new(endpoint: Arc<CandidateEndpoint<C>>) -> Self {
        endpoint.lease();
        Self {
            client: endpoint.client().clone(),
            endpoint,
        }
    }
}

impl<C> ClientHandle<C> {
    pub fn api(&self) -> &C {
        &self.client
    }

    /// The address of the endpoint this handle is bound to.
    pub fn endpoint(&self) -> &str {
        self.endpoint.address()
    }

    /// Record that a request on this handle found the connection dropped.
    pub fn mark_unreachable(&self) {
        self.endpoint.mark_disconnected();
    }
}

impl<C> Drop for ClientHandle<C> {
    fn drop(&mut self) {
        self.endpoint.release();
    }
}

impl<C> fmt::Debug for ClientHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientHandle({})", self.endpoint.address())
    }
}

/// Walks the registry in priority order until an endpoint accepts a
/// connection.
pub struct NodeSelector<C> {
    registry: Arc<EndpointRegistry<C>>,
    retry: RetryPolicy,
    log: Logger,
}

impl<C: BeaconApi> NodeSelector<C> {
    pub fn new(registry: Arc<EndpointRegistry<C>>, retry: RetryPolicy, log: Logger) -> Self {
        Self {
            registry,
            retry,
            log,
        }
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry<C>> {
        &self.registry
    }

    /// Return a transport handle for the highest-priority usable endpoint.
    ///
    /// Endpoints are tried strictly in priority order, each at most once per
    /// invocation. An endpoint in cool-down is skipped; an already-connected
    /// endpoint is handed out without a fresh probe. A probe failure marks
    /// the endpoint `Failed` with an increased cool-down and iteration moves
    /// to the next endpoint.
    pub async fn acquire_client(&self) -> Result<ClientHandle<C>, AllEndpointsUnavailable> {
        let mut errors = vec![];

        for endpoint in self.registry.candidates() {
            match endpoint.begin_connect(Instant::now()) {
                Ok(BeginConnect::AlreadyConnected) => {
                    return Ok(ClientHandle::new(endpoint.clone()));
                }
                Ok(BeginConnect::Probe) => match endpoint.client().get_version().await {
                    Ok(version) => {
                        endpoint.mark_connected();
                        debug!(
                            self.log,
                            "Connected to beacon node";
                            "endpoint" => endpoint.address(),
                            "version" => version,
                        );
                        return Ok(ClientHandle::new(endpoint.clone()));
                    }
                    Err(e) => {
                        endpoint.mark_failed(&self.retry, Instant::now());
                        warn!(
                            self.log,
                            "Offline beacon node";
                            "endpoint" => endpoint.address(),
                            "failures" => endpoint.health().failures,
                            "error" => %e,
                        );
                        errors.push((
                            endpoint.address().to_string(),
                            AcquireError::ConnectFailed(e),
                        ));
                    }
                },
                Err(reason) => {
                    debug!(
                        self.log,
                        "Skipping beacon node in cool-down";
                        "endpoint" => endpoint.address(),
                    );
                    errors.push((
                        endpoint.address().to_string(),
                        AcquireError::Unavailable(reason),
                    ));
                }
            }
        }

        Err(AllEndpointsUnavailable(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ConnectionState;
    use crate::test_utils::{null_logger, registry_of, MockBeaconNode};
    use std::time::Duration;

    fn selector(
        mocks: &[MockBeaconNode],
        retry: RetryPolicy,
    ) -> (NodeSelector<MockBeaconNode>, Arc<EndpointRegistry<MockBeaconNode>>) {
        let registry = Arc::new(registry_of(mocks));
        (
            NodeSelector::new(registry.clone(), retry, null_logger()),
            registry,
        )
    }

    fn short_retry() -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(60), Duration::from_secs(600))
    }

    #[tokio::test]
    async fn falls_over_to_third_endpoint() {
        let mocks = [
            MockBeaconNode::offline(),
            MockBeaconNode::offline(),
            MockBeaconNode::healthy(),
        ];
        let (selector, registry) = selector(&mocks, short_retry());

        let handle = selector.acquire_client().await.unwrap();
        assert_eq!(handle.endpoint(), "http://node-2/");

        let states: Vec<_> = registry.candidates().map(|c| c.state()).collect();
        assert_eq!(
            states,
            vec![
                ConnectionState::Failed,
                ConnectionState::Failed,
                ConnectionState::Connected,
            ]
        );
    }

    #[tokio::test]
    async fn all_endpoints_fail() {
        let mocks = [
            MockBeaconNode::offline(),
            MockBeaconNode::offline(),
            MockBeaconNode::offline(),
        ];
        let (selector, _registry) = selector(&mocks, short_retry());

        let error = selector.acquire_client().await.unwrap_err();
        assert_eq!(error.0.len(), 3);
        for (mock, (_, reason)) in mocks.iter().zip(error.0.iter()) {
            // Each endpoint was attempted exactly once.
            assert_eq!(mock.version_calls(), 1);
            assert!(matches!(reason, AcquireError::ConnectFailed(_)));
        }
    }

    #[tokio::test]
    async fn failed_endpoints_skipped_during_cooldown() {
        let mocks = [MockBeaconNode::offline(), MockBeaconNode::offline()];
        let (selector, _registry) = selector(&mocks, short_retry());

        selector.acquire_client().await.unwrap_err();
        let error = selector.acquire_client().await.unwrap_err();

        for (mock, (_, reason)) in mocks.iter().zip(error.0.iter()) {
            // No second probe was issued while cooling down.
            assert_eq!(mock.version_calls(), 1);
            assert!(matches!(
                reason,
                AcquireError::Unavailable(CandidateError::InCooldown)
            ));
        }
    }

    #[tokio::test]
    async fn failed_endpoint_recovers_after_cooldown() {
        let mock = MockBeaconNode::offline();
        let zero_cooldown = RetryPolicy::new(Duration::ZERO, Duration::ZERO);
        let (selector, registry) = selector(&[mock.clone()], zero_cooldown);

        selector.acquire_client().await.unwrap_err();

        mock.set_healthy(true);
        let handle = selector.acquire_client().await.unwrap();
        assert_eq!(handle.endpoint(), "http://node-0/");

        let candidate = registry.candidates().next().unwrap();
        assert_eq!(candidate.state(), ConnectionState::Connected);
        assert_eq!(candidate.health().failures, 0);
    }

    #[tokio::test]
    async fn connected_endpoint_reused_without_probe() {
        let mock = MockBeaconNode::healthy();
        let (selector, _registry) = selector(&[mock.clone()], short_retry());

        let first = selector.acquire_client().await.unwrap();
        assert_eq!(mock.version_calls(), 1);

        // A concurrent caller gets its own handle with no fresh probe.
        let second = selector.acquire_client().await.unwrap();
        assert_eq!(mock.version_calls(), 1);

        drop(first);
        drop(second);
    }

    #[tokio::test]
    async fn handles_lease_and_release_the_endpoint() {
        let mock = MockBeaconNode::healthy();
        let (selector, registry) = selector(&[mock], short_retry());
        let candidate = registry.candidates().next().unwrap().clone();

        let first = selector.acquire_client().await.unwrap();
        let second = selector.acquire_client().await.unwrap();
        assert_eq!(candidate.leases(), 2);

        drop(first);
        assert_eq!(candidate.leases(), 1);
        drop(second);
        assert_eq!(candidate.leases(), 0);
    }

    #[tokio::test]
    async fn one_handle_failure_does_not_block_others() {
        let mock = MockBeaconNode::healthy();
        let (selector, _registry) = selector(&[mock], short_retry());

        let first = selector.acquire_client().await.unwrap();
        let second = selector.acquire_client().await.unwrap();

        first.mark_unreachable();

        // The other in-flight handle still works against its own client.
        assert_eq!(second.api().get_version().await.unwrap(), "v1.2.3");
    }
}
