use crate::serde_utils;
use crate::{BlsSignature, Slot};
use serde_derive::{Deserialize, Serialize};

/// A block as returned by the beacon node's block-production endpoint.
///
/// Only the fields the validator client inspects are modelled; block
/// construction itself happens on the remote node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlock {
    pub slot: Slot,
    #[serde(with = "serde_utils::hex_vec")]
    pub parent_root: Vec<u8>,
    #[serde(with = "serde_utils::hex_vec")]
    pub state_root: Vec<u8>,
    pub randao_reveal: BlsSignature,
}
