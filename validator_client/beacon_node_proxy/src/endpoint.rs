//! Bookkeeping for the prioritized set of remote endpoints.
//!
//! This module holds no failover logic; it only records, under a per-endpoint
//! lock, where each endpoint is in its connection lifecycle:
//!
//! `Disconnected -> Connecting -> Connected`, with `Connecting -> Failed`
//! (cool-down timer) on a refused attempt and `Failed -> Disconnected` once
//! the timer elapses.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Connection state of a single remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Reasons why a candidate was skipped without a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateError {
    /// A previous failure put the endpoint in a cool-down that has not
    /// elapsed yet.
    InCooldown,
}

/// A snapshot of one endpoint's lifecycle state.
#[derive(Debug, Clone)]
pub struct EndpointHealth {
    pub state: ConnectionState,
    /// Consecutive connection failures; reset on success.
    pub failures: u32,
    /// When a `Failed` endpoint becomes eligible again.
    pub retry_at: Option<Instant>,
}

/// Exponential backoff between connection attempts to a failing endpoint.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    initial: Duration,
    max: Duration,
}

impl RetryPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Cool-down after the `failures`th consecutive failure.
    pub fn cooldown(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(32);
        self.initial
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max)
    }
}

/// The outcome of `begin_connect`: either the endpoint is already usable, or
/// the caller should probe it.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BeginConnect {
    AlreadyConnected,
    Probe,
}

/// One remote endpoint inside the registry: its try-order rank, its transport
/// client and its mutable lifecycle state.
#[derive(Debug)]
pub struct CandidateEndpoint<C> {
    priority: usize,
    address: String,
    client: C,
    health: RwLock<EndpointHealth>,
    /// Outstanding transport handles bound to this endpoint.
    leases: AtomicUsize,
}

impl<C> CandidateEndpoint<C> {
    pub fn new(priority: usize, address: String, client: C) -> Self {
        Self {
            priority,
            address,
            client,
            health: RwLock::new(EndpointHealth {
                state: ConnectionState::Disconnected,
                failures: 0,
                retry_at: None,
            }),
            leases: AtomicUsize::new(0),
        }
    }

    /// The rank defining try-order; unique within a registry, lower is tried
    /// first.
    pub fn priority(&self) -> usize {
        self.priority
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn health(&self) -> EndpointHealth {
        self.health.read().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.health.read().state
    }

    /// The number of transport handles currently bound to this endpoint.
    pub fn leases(&self) -> usize {
        self.leases.load(Ordering::SeqCst)
    }

    pub(crate) fn lease(&self) {
        self.leases.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn release(&self) {
        self.leases.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    /// Attempt the transition towards `Connecting`.
    ///
    /// A `Failed` endpoint whose cool-down has elapsed is treated as
    /// `Disconnected` again. A `Connecting` endpoint may be probed by a
    /// concurrent caller as well; the duplicate probe is an acceptable
    /// inefficiency.
    pub(crate) fn begin_connect(&self, now: Instant) -> Result<BeginConnect, CandidateError> {
        let mut health = self.health.write();
        match health.state {
            ConnectionState::Connected => Ok(BeginConnect::AlreadyConnected),
            ConnectionState::Failed => match health.retry_at {
                Some(retry_at) if now < retry_at => Err(CandidateError::InCooldown),
                _ => {
                    health.state = ConnectionState::Connecting;
                    Ok(BeginConnect::Probe)
                }
            },
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                health.state = ConnectionState::Connecting;
                Ok(BeginConnect::Probe)
            }
        }
    }

    pub(crate) fn mark_connected(&self) {
        let mut health = self.health.write();
        health.state = ConnectionState::Connected;
        health.failures = 0;
        health.retry_at = None;
    }

    pub(crate) fn mark_failed(&self, retry: &RetryPolicy, now: Instant) {
        let mut health = self.health.write();
        health.failures = health.failures.saturating_add(1);
        health.state = ConnectionState::Failed;
        health.retry_at = Some(now + retry.cooldown(health.failures));
    }

    /// Record that a request on a previously-connected handle found the
    /// connection dropped.
    pub(crate) fn mark_disconnected(&self) {
        let mut health = self.health.write();
        health.state = ConnectionState::Disconnected;
        health.retry_at = None;
    }
}

/// Holds the ordered, prioritized list of remote endpoints.
///
/// Pure bookkeeping: iteration is always in priority order and all state
/// transitions happen through the methods on `CandidateEndpoint`.
#[derive(Debug)]
pub struct EndpointRegistry<C> {
    candidates: Vec<Arc<CandidateEndpoint<C>>>,
}

impl<C> EndpointRegistry<C> {
    /// Build a registry from `(address, client)` pairs, assigning priority
    /// from the input order (first entry is tried first).
    pub fn new(endpoints: Vec<(String, C)>) -> Self {
        let candidates = endpoints
            .into_iter()
            .enumerate()
            .map(|(priority, (address, client))| {
                Arc::new(CandidateEndpoint::new(priority, address, client))
            })
            .collect();
        Self { candidates }
    }

    /// Iterate the candidates in priority order.
    pub fn candidates(&self) -> impl Iterator<Item = &Arc<CandidateEndpoint<C>>> {
        self.candidates.iter()
    }

    /// The count of candidates, regardless of their state.
    pub fn num_total(&self) -> usize {
        self.candidates.len()
    }

    /// The count of candidates currently marked `Connected`.
    pub fn num_connected(&self) -> usize {
        self.candidates
            .iter()
            .filter(|candidate| candidate.state() == ConnectionState::Connected)
            .count()
    }
}
