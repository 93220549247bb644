use anyhow::{ensure, Result};
use helper_functions::{
    accessors::{get_beacon_proposer_index, index_of_public_key},
    error::SignatureKind,
    mutators::{balance, increase_balance},
    predicates::is_valid_merkle_branch,
    signing::{SignForCurrentEpoch as _, SignForSingleFork as _},
    verifier::Verifier,
};
use log::debug;
use ssz::{SszHash as _, SszWrite as _};
use typenum::Unsigned as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        consts::DepositContractTreeDepth,
        containers::{BeaconBlock, Deposit, DepositData, DepositInput, Validator},
    },
    preset::Preset,
};

use crate::Error;

pub fn process_block<P: Preset>(
    state: &mut BeaconState<P>,
    block: &BeaconBlock<P>,
    mut verifier: impl Verifier,
) -> Result<()> {
    // Proofs of possession are checked individually in `process_deposit`,
    // so the proposer signature is the only one passed to `verifier`.
    verifier.reserve(1);

    process_block_header(state, block, &mut verifier)?;
    process_deposits(state, &block.body.deposits)?;

    verifier.finish()
}

pub fn process_block_header<P: Preset, V: Verifier>(
    state: &mut BeaconState<P>,
    block: &BeaconBlock<P>,
    mut verifier: V,
) -> Result<()> {
    // > Verify that the slots match
    ensure!(
        block.slot == state.slot,
        Error::SlotMismatch {
            state_slot: state.slot,
            block_slot: block.slot,
        },
    );

    // > Verify that the parent matches
    let computed = state.latest_block_header.hash_tree_root();
    let in_block = block.previous_block_root;

    ensure!(
        computed == in_block,
        Error::ParentRootMismatch { computed, in_block },
    );

    // > Save current block as the new latest block
    //
    // This happens before the signature is verified.
    // Callers must discard the state if this function fails.
    state.latest_block_header = block.temporary_header();

    // > Verify proposer signature
    let proposer_index = get_beacon_proposer_index(state)?;
    let public_key = state.validator_registry.get(proposer_index)?.pubkey;

    if !V::IS_NULL {
        verifier.verify_singular(
            block.signing_root(state),
            block.signature,
            public_key,
            SignatureKind::Block,
        )?;
    }

    Ok(())
}

pub fn process_deposits<P: Preset>(
    state: &mut BeaconState<P>,
    deposits: &[Deposit],
) -> Result<()> {
    let count = deposits.len();
    let maximum = P::MaxDeposits::USIZE;

    ensure!(count <= maximum, Error::TooManyDeposits { count, maximum });

    for deposit in deposits {
        process_deposit(state, deposit)?;
    }

    Ok(())
}

pub fn process_deposit<P: Preset>(
    state: &mut BeaconState<P>,
    deposit: &Deposit,
) -> Result<()> {
    // > Deposits must be processed in order
    ensure!(
        deposit.index == state.deposit_index,
        Error::DepositOutOfOrder {
            in_state: state.deposit_index,
            in_deposit: deposit.index,
        },
    );

    // > Verify the Merkle branch
    let leaf = hashing::hash(deposit.deposit_data.to_ssz()?);

    ensure!(
        is_valid_merkle_branch(
            leaf,
            deposit.proof.iter().copied(),
            DepositContractTreeDepth::U64,
            deposit.index,
            state.latest_eth1_data.deposit_root,
        ),
        Error::DepositProofInvalid {
            deposit: Box::new(deposit.clone()),
        },
    );

    // > Increment the next deposit index we are expecting.
    // > Note that this needs to be done here because while the deposit contract
    // > will never create an invalid Merkle branch, it may admit an invalid deposit
    // > object, and we need to be able to skip over it
    state.deposit_index += 1;

    let DepositData {
        amount,
        deposit_input,
        ..
    } = deposit.deposit_data;

    let DepositInput {
        pubkey,
        withdrawal_credentials,
        proof_of_possession,
    } = deposit_input;

    // > Verify the proof of possession
    //
    // An invalid proof of possession does not invalidate the block.
    // The deposit is skipped instead.
    if let Err(error) = deposit_input.verify(state, proof_of_possession, pubkey) {
        debug!("skipping deposit {} ({error})", deposit.index);
        return Ok(());
    }

    if let Some(validator_index) = index_of_public_key(state, pubkey) {
        let in_state = state
            .validator_registry
            .get(validator_index)?
            .withdrawal_credentials;

        ensure!(
            in_state == withdrawal_credentials,
            Error::WithdrawalCredentialsMismatch {
                validator_index,
                in_state,
                in_deposit: withdrawal_credentials,
            },
        );

        // > Increase balance by deposit amount
        increase_balance(balance(state, validator_index)?, amount);
    } else {
        // > Add new validator
        let validator_index = u64::try_from(state.validator_registry.len())?;

        state
            .validator_registry
            .push(Validator::from_deposit_input(&deposit_input))?;

        state.validator_balances.push(amount)?;

        state
            .cache
            .validator_indices
            .get_mut()
            .expect(
                "state.cache.validator_indices is initialized by \
                 index_of_public_key, which is called before pushing the validator",
            )
            .insert(pubkey, validator_index);
    }

    Ok(())
}
