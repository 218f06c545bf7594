// Validator set change encoding

use prost::Message;

use super::{EncodeError, OperationEncoder, CHANGE_VALIDATOR_SET_TAG};
use crate::models::{BridgeBatchItem, EncodedPayload};

/// Upstream protobuf message carried in a validator set change operation
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValidatorSetChange {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub pub_key_ids: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

/// Encodes one epoch transition as a single `changeValidatorSet` call:
///
/// `changeValidatorSet@aggSig@hashOfHashes@opHash@bitmap@epoch@key1@...@keyN`
#[derive(Debug, Default)]
pub struct ChangeValidatorSetEncoder;

impl ChangeValidatorSetEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl OperationEncoder for ChangeValidatorSetEncoder {
    fn encode(&self, item: &BridgeBatchItem) -> Result<Vec<EncodedPayload>, EncodeError> {
        let operation = match item.operations.as_slice() {
            [operation] => operation,
            operations => {
                return Err(EncodeError::InvalidOperationCount {
                    expected: 1,
                    got: operations.len(),
                })
            }
        };

        let validator_set = ValidatorSetChange::decode(operation.payload.as_slice())
            .map_err(|e| EncodeError::Decode(e.to_string()))?;

        let payload = EncodedPayload::builder(CHANGE_VALIDATOR_SET_TAG)
            .arg(&item.aggregated_signature)
            .arg(&item.hash_of_hashes)
            .arg(&operation.hash)
            .arg(&item.pub_keys_bitmap)
            .arg_u32(item.epoch)
            .args(validator_set.pub_key_ids.iter().map(Vec::as_slice))
            .build();

        Ok(vec![payload])
    }
}
