//! A wrapper around `reqwest` that forms a HTTP client able to consume the
//! REST endpoints served by a beacon node, plus the `BeaconApi` trait through
//! which the validator client's proxy issues requests without knowing the
//! transport.

pub mod types;

use crate::types::DutyData;
use async_trait::async_trait;
pub use reqwest;
pub use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use ::types::{BlsPublicKey, Epoch};

#[derive(Debug)]
pub enum Error {
    /// The `reqwest` client raised an error.
    HttpClient(reqwest::Error),
    /// The server returned an error status code.
    StatusCode(StatusCode),
    /// The supplied URL is badly formatted. It should look something like
    /// `http://127.0.0.1:5052`.
    InvalidUrl(String),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::HttpClient(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Per-operation timeouts, so a slow endpoint is abandoned quickly enough for
/// fallback behaviour to be useful.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub version: Duration,
    pub genesis_time: Duration,
    pub duties: Duration,
}

impl Timeouts {
    pub fn set_all(timeout: Duration) -> Self {
        Timeouts {
            version: timeout,
            genesis_time: timeout,
            duties: timeout,
        }
    }
}

/// The beacon node operations consumed by the validator client.
///
/// Implementations decode wire responses into DTOs; they perform no domain
/// validation and no failover, both of which belong to the caller.
#[async_trait]
pub trait BeaconApi: Clone + Send + Sync + 'static {
    /// `GET /version`
    async fn get_version(&self) -> Result<String, Error>;

    /// `GET /time`
    async fn get_genesis_time(&self) -> Result<u64, Error>;

    /// `GET /duties?validator_pubkeys=..&epoch=..`
    ///
    /// `epoch: None` means "no epoch filter" and must omit the parameter from
    /// the outgoing request entirely; `Some(e)` sends `e` verbatim.
    async fn get_validator_duties(
        &self,
        pubkeys: &[BlsPublicKey],
        epoch: Option<Epoch>,
    ) -> Result<Vec<DutyData>, Error>;
}

/// A client for interacting with a remote beacon node's HTTP API.
#[derive(Clone)]
pub struct BeaconNodeHttpClient {
    client: reqwest::Client,
    server: Url,
    timeouts: Timeouts,
}

impl fmt::Display for BeaconNodeHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.server.fmt(f)
    }
}

impl BeaconNodeHttpClient {
    pub fn new(server: Url, timeouts: Timeouts) -> Self {
        Self {
            client: reqwest::Client::new(),
            server,
            timeouts,
        }
    }

    /// Return the server URL with `segment` appended to its path.
    fn path(&self, segment: &str) -> Result<Url, Error> {
        let mut path = self.server.clone();
        path.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(self.server.to_string()))?
            .push(segment);
        Ok(path)
    }

    /// Build the `GET /duties` URL, encoding the epoch filter iff present.
    fn duties_path(&self, pubkeys: &[BlsPublicKey], epoch: Option<Epoch>) -> Result<Url, Error> {
        let mut path = self.path("duties")?;

        for pubkey in pubkeys {
            path.query_pairs_mut()
                .append_pair("validator_pubkeys", &pubkey.to_string());
        }
        if let Some(epoch) = epoch {
            path.query_pairs_mut()
                .append_pair("epoch", &epoch.as_u64().to_string());
        }

        Ok(path)
    }

    /// Perform a HTTP GET request with a custom timeout.
    async fn get_with_timeout<T: DeserializeOwned>(
        &self,
        url: Url,
        timeout: Duration,
    ) -> Result<T, Error> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let response = ok_or_error(response)?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BeaconApi for BeaconNodeHttpClient {
    async fn get_version(&self) -> Result<String, Error> {
        let path = self.path("version")?;
        self.get_with_timeout(path, self.timeouts.version).await
    }

    async fn get_genesis_time(&self) -> Result<u64, Error> {
        let path = self.path("time")?;
        self.get_with_timeout(path, self.timeouts.genesis_time).await
    }

    async fn get_validator_duties(
        &self,
        pubkeys: &[BlsPublicKey],
        epoch: Option<Epoch>,
    ) -> Result<Vec<DutyData>, Error> {
        let path = self.duties_path(pubkeys, epoch)?;
        self.get_with_timeout(path, self.timeouts.duties).await
    }
}

/// Returns `Ok(response)` if the response is a `200 OK` response. Otherwise,
/// creates an appropriate error message.
fn ok_or_error(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::StatusCode(status))
    }
}
