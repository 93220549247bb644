use anyhow::{ensure, Result};
use helper_functions::verifier::Verifier;
use ssz::SszHash as _;
use types::{
    config::Config,
    phase0::{beacon_state::BeaconState, containers::BeaconBlock},
    preset::Preset,
};

use crate::{
    phase0::{process_block, process_slots},
    Error,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StateRootPolicy {
    Verify,
    Trust,
}

impl StateRootPolicy {
    pub fn verify<P: Preset>(self, state: &BeaconState<P>, block: &BeaconBlock<P>) -> Result<()> {
        match self {
            Self::Verify => {
                let computed = state.hash_tree_root();
                let in_block = block.state_root;

                ensure!(
                    computed == in_block,
                    Error::StateRootMismatch { computed, in_block },
                );
            }
            Self::Trust => {}
        }

        Ok(())
    }
}

pub fn state_transition<P: Preset>(
    config: &Config,
    state: &mut BeaconState<P>,
    block: &BeaconBlock<P>,
    verifier: impl Verifier,
    state_root_policy: StateRootPolicy,
) -> Result<()> {
    // > Process slots (including those with no blocks) since block
    //
    // Blocks older than the state are rejected by `process_slots`.
    if state.slot != block.slot {
        process_slots(config, state, block.slot)?;
    }

    // > Process block
    process_block(state, block, verifier)?;

    // > Verify state root
    state_root_policy.verify(state, block)
}

#[cfg(test)]
mod tests {
    use bls::{SecretKey, SecretKeyBytes};
    use helper_functions::{
        accessors::get_beacon_proposer_index,
        signing::SignForSingleFork as _,
        verifier::{NullVerifier, SingleVerifier},
    };
    use types::{
        phase0::{
            consts::FAR_FUTURE_EPOCH,
            containers::Validator,
            primitives::{Slot, H256},
        },
        preset::Minimal,
    };

    use super::*;

    fn secret_key(seed: u8) -> SecretKey {
        let mut bytes = [0; 32];
        bytes[31] = seed;

        SecretKey::try_from(SecretKeyBytes::from(bytes))
            .expect("small nonzero scalars are valid secret keys")
    }

    fn genesis_state() -> Result<BeaconState<Minimal>> {
        let config = Config::minimal();

        let mut state = BeaconState {
            fork: config.genesis_fork(),
            ..BeaconState::default()
        };

        for seed in 1..=8 {
            state.validator_registry.push(Validator {
                pubkey: secret_key(seed).to_public_key().into(),
                exit_epoch: FAR_FUTURE_EPOCH,
                ..Validator::default()
            })?;

            state
                .validator_balances
                .push(Minimal::MAX_DEPOSIT_AMOUNT)?;
        }

        Ok(state)
    }

    // Produces a block for `slot` with the correct state root, signed by its proposer.
    fn valid_block(
        config: &Config,
        state: &BeaconState<Minimal>,
        slot: Slot,
    ) -> Result<BeaconBlock<Minimal>> {
        let mut pre_state = state.clone();

        process_slots(config, &mut pre_state, slot)?;

        let mut block = BeaconBlock {
            slot,
            previous_block_root: pre_state.latest_block_header.hash_tree_root(),
            ..BeaconBlock::default()
        };

        let mut post_state = pre_state.clone();

        process_block(&mut post_state, &block, NullVerifier)?;

        block.state_root = post_state.hash_tree_root();

        let proposer_index = get_beacon_proposer_index(&pre_state)?;
        let seed = u8::try_from(proposer_index + 1)?;

        block.signature = block.sign(&pre_state, &secret_key(seed)).into();

        Ok(block)
    }

    #[test]
    fn valid_block_is_applied() -> Result<()> {
        let config = Config::minimal();
        let mut state = genesis_state()?;
        let block = valid_block(&config, &state, 3)?;

        state_transition(
            &config,
            &mut state,
            &block,
            SingleVerifier,
            StateRootPolicy::Verify,
        )?;

        assert_eq!(state.slot, 3);
        assert_eq!(state.hash_tree_root(), block.state_root);
        assert_eq!(state.latest_block_header.slot, 3);
        assert!(state.latest_block_header.state_root.is_zero());

        Ok(())
    }

    #[test]
    fn consecutive_blocks_chain_through_headers() -> Result<()> {
        let config = Config::minimal();
        let mut state = genesis_state()?;

        for slot in [1, 2, 9] {
            let block = valid_block(&config, &state, slot)?;

            state_transition(
                &config,
                &mut state,
                &block,
                SingleVerifier,
                StateRootPolicy::Verify,
            )?;
        }

        assert_eq!(state.slot, 9);

        Ok(())
    }

    #[test]
    fn block_with_wrong_state_root_is_rejected() -> Result<()> {
        let config = Config::minimal();
        let mut state = genesis_state()?;

        let block = BeaconBlock {
            state_root: H256::repeat_byte(1),
            ..valid_block(&config, &state, 1)?
        };

        let error = state_transition(
            &config,
            &mut state,
            &block,
            NullVerifier,
            StateRootPolicy::Verify,
        )
        .expect_err("state root does not match");

        assert!(matches!(
            error.downcast_ref(),
            Some(Error::StateRootMismatch { in_block, .. }) if *in_block == H256::repeat_byte(1),
        ));

        Ok(())
    }

    #[test]
    fn trusted_state_root_is_not_checked() -> Result<()> {
        let config = Config::minimal();
        let mut state = genesis_state()?;

        let block = BeaconBlock {
            state_root: H256::repeat_byte(1),
            ..valid_block(&config, &state, 1)?
        };

        state_transition(
            &config,
            &mut state,
            &block,
            NullVerifier,
            StateRootPolicy::Trust,
        )
    }

    #[test]
    fn block_older_than_state_is_rejected() -> Result<()> {
        let config = Config::minimal();
        let mut state = genesis_state()?;
        let block = valid_block(&config, &state, 1)?;

        process_slots(&config, &mut state, 2)?;

        let error = state_transition(
            &config,
            &mut state,
            &block,
            NullVerifier,
            StateRootPolicy::Verify,
        )
        .expect_err("block is older than state");

        assert!(matches!(
            error.downcast_ref(),
            Some(Error::SlotNotLater {
                current: 2,
                target: 1,
            }),
        ));

        Ok(())
    }
}
