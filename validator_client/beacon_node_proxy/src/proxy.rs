//! The public API surface workers use to reach a beacon node.
//!
//! Each call acquires a transport handle via the node selector (which may
//! fail over between endpoints) and issues the request through it. Duty
//! queries additionally stream their results through the duty translator.

use crate::config::Config;
use crate::duties::DutyStream;
use crate::endpoint::EndpointRegistry;
use crate::selector::{AllEndpointsUnavailable, ClientHandle, NodeSelector};
use beacon_api_client::{
    BeaconApi, BeaconNodeHttpClient, Error as ApiError, Timeouts, Url,
};
use slog::{debug, warn, Logger};
use std::fmt;
use std::sync::Arc;
use types::{BeaconBlock, BlsPublicKey, BlsSignature, Epoch, Fork, Slot};

#[derive(Debug)]
pub enum ProxyError {
    /// Every configured endpoint failed or was in cool-down for this call.
    AllEndpointsUnavailable(AllEndpointsUnavailable),
    /// The selected endpoint accepted the connection but the request itself
    /// failed.
    RequestFailed { endpoint: String, error: ApiError },
    /// The operation's behaviour is intentionally not yet defined.
    ///
    /// Distinct from transport and decoding failures so callers can tell
    /// "not yet available" from "failed".
    Unimplemented(&'static str),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::AllEndpointsUnavailable(errors) => errors.fmt(f),
            ProxyError::RequestFailed { endpoint, error } => {
                write!(f, "request to {} failed: {}", endpoint, error)
            }
            ProxyError::Unimplemented(operation) => {
                write!(f, "operation not implemented: {}", operation)
            }
        }
    }
}

impl From<AllEndpointsUnavailable> for ProxyError {
    fn from(errors: AllEndpointsUnavailable) -> Self {
        ProxyError::AllEndpointsUnavailable(errors)
    }
}

/// Hides the location and availability of the remote beacon nodes behind a
/// stable API.
pub struct BeaconNodeProxy<C> {
    selector: NodeSelector<C>,
    log: Logger,
}

impl BeaconNodeProxy<BeaconNodeHttpClient> {
    /// Wire the production HTTP stack from `config`.
    pub fn from_config(config: &Config, log: Logger) -> Result<Self, ApiError> {
        let timeouts = Timeouts::set_all(config.request_timeout());
        let mut endpoints = Vec::with_capacity(config.beacon_nodes.len());
        for address in &config.beacon_nodes {
            let url =
                Url::parse(address).map_err(|_| ApiError::InvalidUrl(address.clone()))?;
            let client = BeaconNodeHttpClient::new(url, timeouts.clone());
            endpoints.push((address.clone(), client));
        }

        let registry = Arc::new(EndpointRegistry::new(endpoints));
        let selector = NodeSelector::new(registry, config.retry_policy(), log.clone());
        Ok(Self::new(selector, log))
    }
}

impl<C: BeaconApi> BeaconNodeProxy<C> {
    pub fn new(selector: NodeSelector<C>, log: Logger) -> Self {
        Self { selector, log }
    }

    pub fn selector(&self) -> &NodeSelector<C> {
        &self.selector
    }

    /// Returns the software version string of the remote node.
    pub async fn get_node_version(&self) -> Result<String, ProxyError> {
        let handle = self.selector.acquire_client().await?;
        let version = handle
            .api()
            .get_version()
            .await
            .map_err(|e| self.request_failed(&handle, e))?;
        Ok(version)
    }

    /// Returns the genesis time of the chain, in seconds since the epoch.
    pub async fn get_genesis_time(&self) -> Result<u64, ProxyError> {
        let handle = self.selector.acquire_client().await?;
        let genesis_time = handle
            .api()
            .get_genesis_time()
            .await
            .map_err(|e| self.request_failed(&handle, e))?;
        Ok(genesis_time)
    }

    /// Whether the remote node is still syncing. Behaviour not yet defined.
    pub async fn get_is_syncing(&self) -> Result<bool, ProxyError> {
        Err(ProxyError::Unimplemented("sync status"))
    }

    /// The fork the remote node is on. Behaviour not yet defined.
    pub async fn get_node_fork(&self) -> Result<Fork, ProxyError> {
        Err(ProxyError::Unimplemented("fork retrieval"))
    }

    /// Request the duties of `pubkeys`, optionally filtered to `epoch`.
    ///
    /// `epoch: None` omits the filter from the outgoing request; a concrete
    /// epoch is sent verbatim. Results stream in the order the remote node
    /// returned them; dropping the stream cancels decoding and releases the
    /// transport handle.
    pub async fn get_validator_duties(
        &self,
        pubkeys: &[BlsPublicKey],
        epoch: Option<Epoch>,
    ) -> Result<DutyStream<C>, ProxyError> {
        let handle = self.selector.acquire_client().await?;
        let records = handle
            .api()
            .get_validator_duties(pubkeys, epoch)
            .await
            .map_err(|e| self.request_failed(&handle, e))?;

        debug!(
            self.log,
            "Received validator duties";
            "endpoint" => handle.endpoint(),
            "records" => records.len(),
        );

        Ok(DutyStream::new(records, handle, self.log.clone()))
    }

    /// Request construction of a new block. Behaviour not yet defined.
    pub async fn request_new_block(
        &self,
        _slot: Slot,
        _randao_reveal: BlsSignature,
    ) -> Result<BeaconBlock, ProxyError> {
        Err(ProxyError::Unimplemented("block production"))
    }

    /// Record a request failure on an acquired handle and surface it with
    /// enough context to diagnose without hidden retries.
    fn request_failed(&self, handle: &ClientHandle<C>, error: ApiError) -> ProxyError {
        handle.mark_unreachable();
        warn!(
            self.log,
            "Request to beacon node failed";
            "endpoint" => handle.endpoint(),
            "error" => %error,
        );
        ProxyError::RequestFailed {
            endpoint: handle.endpoint().to_string(),
            error,
        }
    }
}
