//! Domain value types shared between the validator client and the beacon node
//! proxy.
//!
//! A missing value is always represented as `Option<T>` at API boundaries.
//! There are deliberately no in-band "none" sentinels, so a legitimate zero
//! slot or epoch can never be confused with "unset".

mod beacon_block;
mod bls;
mod fork;
mod slot_epoch;
mod validator_duty;

pub mod serde_utils;

pub use beacon_block::BeaconBlock;
pub use bls::{BlsPublicKey, BlsSignature, Error, PUBLIC_KEY_BYTES_LEN, SIGNATURE_BYTES_LEN};
pub use fork::Fork;
pub use slot_epoch::{Epoch, Shard, Slot};
pub use validator_duty::ValidatorDuty;
