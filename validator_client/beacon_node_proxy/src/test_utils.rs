//! Shared test helpers: a scriptable in-memory beacon node and registry
//! builders.

use crate::endpoint::EndpointRegistry;
use async_trait::async_trait;
use beacon_api_client::types::DutyData;
use beacon_api_client::{BeaconApi, Error as ApiError, StatusCode};
use parking_lot::Mutex;
use slog::{o, Logger};
use std::sync::Arc;
use types::{BlsPublicKey, Epoch};

pub fn null_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

/// Build a registry whose candidates are the given mocks, addressed as
/// `http://node-<index>/` in priority order.
pub fn registry_of(mocks: &[MockBeaconNode]) -> EndpointRegistry<MockBeaconNode> {
    EndpointRegistry::new(
        mocks
            .iter()
            .enumerate()
            .map(|(i, mock)| (format!("http://node-{}/", i), mock.clone()))
            .collect(),
    )
}

#[derive(Debug, Default)]
struct Inner {
    healthy: bool,
    version: String,
    genesis_time: u64,
    duties: Vec<DutyData>,
    fail_duties: bool,
    version_calls: usize,
    duty_requests: Vec<(Vec<BlsPublicKey>, Option<Epoch>)>,
}

/// An in-memory `BeaconApi` implementation with scriptable behaviour and
/// call recording.
#[derive(Debug, Clone)]
pub struct MockBeaconNode {
    inner: Arc<Mutex<Inner>>,
}

impl MockBeaconNode {
    /// A node that accepts connections and answers every request.
    pub fn healthy() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                healthy: true,
                version: "v1.2.3".to_string(),
                ..Inner::default()
            })),
        }
    }

    /// A node that refuses every request.
    pub fn offline() -> Self {
        let mock = Self::healthy();
        mock.set_healthy(false);
        mock
    }

    pub fn with_version(self, version: &str) -> Self {
        self.inner.lock().version = version.to_string();
        self
    }

    pub fn with_genesis_time(self, genesis_time: u64) -> Self {
        self.inner.lock().genesis_time = genesis_time;
        self
    }

    pub fn with_duties(self, duties: Vec<DutyData>) -> Self {
        self.inner.lock().duties = duties;
        self
    }

    /// Accept connections but fail the duties request itself.
    pub fn with_failing_duties(self) -> Self {
        self.inner.lock().fail_duties = true;
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.inner.lock().healthy = healthy;
    }

    pub fn version_calls(&self) -> usize {
        self.inner.lock().version_calls
    }

    pub fn duty_requests(&self) -> Vec<(Vec<BlsPublicKey>, Option<Epoch>)> {
        self.inner.lock().duty_requests.clone()
    }

    fn refused() -> ApiError {
        ApiError::StatusCode(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[async_trait]
impl BeaconApi for MockBeaconNode {
    async fn get_version(&self) -> Result<String, ApiError> {
        let mut inner = self.inner.lock();
        inner.version_calls += 1;
        if inner.healthy {
            Ok(inner.version.clone())
        } else {
            Err(Self::refused())
        }
    }

    async fn get_genesis_time(&self) -> Result<u64, ApiError> {
        let inner = self.inner.lock();
        if inner.healthy {
            Ok(inner.genesis_time)
        } else {
            Err(Self::refused())
        }
    }

    async fn get_validator_duties(
        &self,
        pubkeys: &[BlsPublicKey],
        epoch: Option<Epoch>,
    ) -> Result<Vec<DutyData>, ApiError> {
        let mut inner = self.inner.lock();
        inner.duty_requests.push((pubkeys.to_vec(), epoch));
        if !inner.healthy || inner.fail_duties {
            Err(Self::refused())
        } else {
            Ok(inner.duties.clone())
        }
    }
}
