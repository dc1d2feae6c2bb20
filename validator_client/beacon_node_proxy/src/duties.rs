//! Translates wire duty records into domain `ValidatorDuty` values as a
//! lazy, single-consumption stream.

use crate::selector::ClientHandle;
use beacon_api_client::types::DutyData;
use futures::Stream;
use slog::{warn, Logger};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use types::{BlsPublicKey, Shard, Slot, ValidatorDuty};

/// A wire duty record could not be translated into a domain value.
///
/// Malformed data is never retried; the stream that observed it aborts.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The record's public key bytes were not the expected length.
    InvalidPublicKey { record: usize, source: types::Error },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidPublicKey { record, source } => {
                write!(f, "malformed public key in duty record {}: {}", record, source)
            }
        }
    }
}

/// Translate one wire record.
///
/// Slot and shard values are mapped verbatim. The optional proposal slot maps
/// `present -> Some(Slot(v))` and `absent -> None`; a present zero is a
/// legitimate slot, never "no proposal".
fn translate_record(record: &DutyData) -> Result<ValidatorDuty, types::Error> {
    let validator_pubkey = BlsPublicKey::deserialize(&record.validator_pubkey)?;
    Ok(ValidatorDuty {
        validator_pubkey,
        attestation_slot: Slot::new(record.attestation_slot),
        attestation_shard: Shard::new(record.attestation_shard),
        block_proposal_slot: record.block_proposal_slot.map(Slot::new),
    })
}

/// A lazy sequence of `ValidatorDuty`, decoded one record per poll in the
/// order the remote node returned them.
///
/// The stream is finite, not restartable and consumable exactly once. It owns
/// the transport handle for the request that produced it, so dropping the
/// stream (cancellation) releases the handle and no further records are
/// decoded. A malformed record aborts the stream: the error is yielded once
/// and every subsequent poll returns `None`.
pub struct DutyStream<C> {
    records: std::vec::IntoIter<DutyData>,
    next_index: usize,
    aborted: bool,
    handle: ClientHandle<C>,
    log: Logger,
}

impl<C> DutyStream<C> {
    pub(crate) fn new(records: Vec<DutyData>, handle: ClientHandle<C>, log: Logger) -> Self {
        Self {
            records: records.into_iter(),
            next_index: 0,
            aborted: false,
            handle,
            log,
        }
    }

    /// The address of the endpoint that served this request.
    pub fn endpoint(&self) -> &str {
        self.handle.endpoint()
    }
}

impl<C> Unpin for DutyStream<C> {}

impl<C> fmt::Debug for DutyStream<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DutyStream")
            .field("endpoint", &self.handle.endpoint())
            .field("remaining", &self.records.len())
            .field("aborted", &self.aborted)
            .finish()
    }
}

impl<C> Stream for DutyStream<C> {
    type Item = Result<ValidatorDuty, DecodeError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.aborted {
            return Poll::Ready(None);
        }

        let Some(record) = this.records.next() else {
            return Poll::Ready(None);
        };
        let index = this.next_index;
        this.next_index += 1;

        match translate_record(&record) {
            Ok(duty) => Poll::Ready(Some(Ok(duty))),
            Err(source) => {
                this.aborted = true;
                warn!(
                    this.log,
                    "Malformed duty record";
                    "endpoint" => this.handle.endpoint(),
                    "record" => index,
                    "error" => %source,
                );
                Poll::Ready(Some(Err(DecodeError::InvalidPublicKey {
                    record: index,
                    source,
                })))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.aborted {
            (0, Some(0))
        } else {
            // A malformed record may end the stream early.
            (0, Some(self.records.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::RetryPolicy;
    use crate::selector::NodeSelector;
    use crate::test_utils::{null_logger, registry_of, MockBeaconNode};
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use types::PUBLIC_KEY_BYTES_LEN;

    fn record(fill: u8, proposal: Option<u64>) -> DutyData {
        DutyData {
            validator_pubkey: vec![fill; PUBLIC_KEY_BYTES_LEN],
            attestation_slot: 17,
            attestation_shard: 3,
            block_proposal_slot: proposal,
        }
    }

    async fn handle_for(mock: &MockBeaconNode) -> ClientHandle<MockBeaconNode> {
        let registry = Arc::new(registry_of(std::slice::from_ref(mock)));
        let selector = NodeSelector::new(
            registry,
            RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(1)),
            null_logger(),
        );
        selector.acquire_client().await.unwrap()
    }

    #[test]
    fn translation_preserves_slot_and_shard() {
        let duty = translate_record(&record(1, None)).unwrap();
        assert_eq!(duty.attestation_slot, Slot::new(17));
        assert_eq!(duty.attestation_shard, Shard::new(3));
        assert_eq!(
            duty.validator_pubkey,
            BlsPublicKey::from([1; PUBLIC_KEY_BYTES_LEN])
        );
    }

    #[test]
    fn absent_proposal_slot_is_none() {
        let duty = translate_record(&record(1, None)).unwrap();
        assert_eq!(duty.block_proposal_slot, None);
        assert!(!duty.is_proposer());
    }

    #[test]
    fn zero_proposal_slot_is_some_zero() {
        let duty = translate_record(&record(1, Some(0))).unwrap();
        assert_eq!(duty.block_proposal_slot, Some(Slot::new(0)));
        assert!(duty.is_proposer());
    }

    #[tokio::test]
    async fn yields_duties_in_remote_order() {
        let mock = MockBeaconNode::healthy();
        let handle = handle_for(&mock).await;

        let records = vec![record(1, None), record(2, Some(18)), record(3, None)];
        let mut stream = DutyStream::new(records, handle, null_logger());

        let mut fills = vec![];
        while let Some(duty) = stream.next().await {
            fills.push(duty.unwrap().validator_pubkey.serialize()[0]);
        }
        assert_eq!(fills, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn malformed_record_aborts_the_stream() {
        let mock = MockBeaconNode::healthy();
        let handle = handle_for(&mock).await;

        let malformed = DutyData {
            validator_pubkey: vec![0; PUBLIC_KEY_BYTES_LEN - 1],
            attestation_slot: 1,
            attestation_shard: 1,
            block_proposal_slot: None,
        };
        let records = vec![record(1, None), malformed, record(3, None)];
        let mut stream = DutyStream::new(records, handle, null_logger());

        assert!(stream.next().await.unwrap().is_ok());
        assert_eq!(
            stream.next().await.unwrap(),
            Err(DecodeError::InvalidPublicKey {
                record: 1,
                source: types::Error::InvalidByteLength {
                    got: PUBLIC_KEY_BYTES_LEN - 1,
                    expected: PUBLIC_KEY_BYTES_LEN,
                },
            })
        );
        // Nothing after the malformed record is emitted.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_handle() {
        let mock = MockBeaconNode::healthy();
        let registry = Arc::new(registry_of(std::slice::from_ref(&mock)));
        let selector = NodeSelector::new(
            registry.clone(),
            RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(1)),
            null_logger(),
        );
        let handle = selector.acquire_client().await.unwrap();
        let candidate = registry.candidates().next().unwrap().clone();

        let records = vec![record(1, None), record(2, None), record(3, None)];
        let mut stream = DutyStream::new(records, handle, null_logger());
        assert_eq!(candidate.leases(), 1);

        // Consume one element, then abandon the stream.
        assert!(stream.next().await.unwrap().is_ok());
        drop(stream);

        assert_eq!(candidate.leases(), 0);
    }
}
