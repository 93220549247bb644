use bls::SignatureBytes;
use ssz::SszHash as _;

use crate::{
    phase0::{
        consts::{FAR_FUTURE_EPOCH, GENESIS_EPOCH},
        containers::{BeaconBlock, BeaconBlockHeader, DepositInput, Fork, Validator},
        primitives::{Version, H256},
    },
    preset::Preset,
};

impl<P: Preset> BeaconBlock<P> {
    /// Header stored in `BeaconState.latest_block_header` while the block is being processed.
    ///
    /// `state_root` is left zeroed because the post-state root is not known yet.
    /// It is filled in by the next slot transition.
    #[must_use]
    pub fn temporary_header(&self) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: self.slot,
            previous_block_root: self.previous_block_root,
            state_root: H256::zero(),
            block_body_root: self.body.hash_tree_root(),
            signature: SignatureBytes::empty(),
        }
    }
}

impl Fork {
    #[must_use]
    pub const fn genesis(version: Version) -> Self {
        Self {
            previous_version: version,
            current_version: version,
            epoch: GENESIS_EPOCH,
        }
    }
}

impl Validator {
    /// Registry entry for a public key seen in a deposit for the first time.
    #[must_use]
    pub const fn from_deposit_input(deposit_input: &DepositInput) -> Self {
        Self {
            pubkey: deposit_input.pubkey,
            withdrawal_credentials: deposit_input.withdrawal_credentials,
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            initiated_exit: false,
            slashed: false,
        }
    }
}
