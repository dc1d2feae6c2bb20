//! Wire-level DTOs returned by the beacon node REST API.

use ::types::serde_utils;
use serde_derive::{Deserialize, Serialize};

/// A single duty record from `GET /duties`.
///
/// The public key is carried as raw bytes here; length validation happens
/// when the record is translated into a domain `ValidatorDuty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyData {
    #[serde(with = "serde_utils::hex_vec")]
    pub validator_pubkey: Vec<u8>,
    pub attestation_slot: u64,
    pub attestation_shard: u64,
    /// Absent (or `null`) when the validator has no proposal duty. A value of
    /// `0` is a legitimate slot and is distinct from absence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_proposal_slot: Option<u64>,
}
