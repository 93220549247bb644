use thiserror::Error;
use types::phase0::{
    containers::Deposit,
    primitives::{DepositIndex, Slot, ValidatorIndex, H256},
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("deposit is out of order (in_state: {in_state}, in_deposit: {in_deposit})")]
    DepositOutOfOrder {
        in_state: DepositIndex,
        in_deposit: DepositIndex,
    },
    #[error("deposit proof is invalid: {deposit:?}")]
    DepositProofInvalid {
        // Boxed to pass `clippy::large_enum_variant`.
        deposit: Box<Deposit>,
    },
    #[error("block parent root ({in_block:?}) does not match latest block header ({computed:?})")]
    ParentRootMismatch { computed: H256, in_block: H256 },
    #[error("block slot ({block_slot}) does not match state slot ({state_slot})")]
    SlotMismatch { state_slot: Slot, block_slot: Slot },
    #[error("target slot ({target}) is not later than current slot ({current})")]
    SlotNotLater { current: Slot, target: Slot },
    #[error("state root in block ({in_block:?}) does not match state ({computed:?})")]
    StateRootMismatch { computed: H256, in_block: H256 },
    #[error("block contains too many deposits (count: {count}, maximum: {maximum})")]
    TooManyDeposits { count: usize, maximum: usize },
    #[error(
        "withdrawal credentials in deposit do not match validator {validator_index} \
         (in_state: {in_state:?}, in_deposit: {in_deposit:?})"
    )]
    WithdrawalCredentialsMismatch {
        validator_index: ValidatorIndex,
        in_state: H256,
        in_deposit: H256,
    },
}
