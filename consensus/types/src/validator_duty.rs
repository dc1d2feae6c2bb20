use crate::{BlsPublicKey, Shard, Slot};
use serde_derive::{Deserialize, Serialize};

/// An assignment telling a validator which slot and shard to attest to, and
/// optionally which slot to propose a block for.
///
/// Instances are produced by the beacon node proxy from wire records and are
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDuty {
    /// The validator's BLS public key, uniquely identifying them.
    pub validator_pubkey: BlsPublicKey,
    /// The slot at which the validator must attest.
    pub attestation_slot: Slot,
    /// The shard the attestation targets.
    pub attestation_shard: Shard,
    /// The slot at which the validator must propose a block, if any.
    ///
    /// `None` means "no proposal duty"; it is never used to encode slot zero.
    pub block_proposal_slot: Option<Slot>,
}

impl ValidatorDuty {
    /// Returns `true` if this duty includes a block proposal.
    pub fn is_proposer(&self) -> bool {
        self.block_proposal_slot.is_some()
    }
}
