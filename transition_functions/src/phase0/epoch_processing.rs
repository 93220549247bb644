use std::collections::HashSet;

use anyhow::Result;
use helper_functions::{
    accessors::{
        get_attesting_indices, get_block_root, get_current_epoch, get_previous_epoch,
        get_total_active_balance, get_total_balance,
    },
    mutators::exit_validator,
    predicates::is_active_validator,
};
use itertools::Itertools as _;
use log::info;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        containers::PendingAttestation,
        primitives::{Gwei, ValidatorIndex, H256},
    },
    preset::Preset,
};

pub fn process_epoch<P: Preset>(config: &Config, state: &mut BeaconState<P>) -> Result<()> {
    process_justification_and_finalization(state)?;
    process_ejections(config, state)?;
    process_final_updates(state);

    Ok(())
}

pub fn process_justification_and_finalization<P: Preset>(
    state: &mut BeaconState<P>,
) -> Result<()> {
    let current_epoch = get_current_epoch(state);
    let previous_epoch = get_previous_epoch(state);

    let previous_boundary_root = get_block_root(state, previous_epoch)?;
    let current_boundary_root = get_block_root(state, current_epoch)?;

    let previous_boundary_attesters = boundary_attesters(
        state,
        &state.previous_epoch_attestations,
        previous_boundary_root,
    )?;

    let current_boundary_attesters = boundary_attesters(
        state,
        &state.current_epoch_attestations,
        current_boundary_root,
    )?;

    let previous_attesting_balance = get_total_balance(state, previous_boundary_attesters)?;
    let previous_total_balance = get_total_active_balance(state, previous_epoch)?;
    let current_attesting_balance = get_total_balance(state, current_boundary_attesters)?;
    let current_total_balance = get_total_active_balance(state, current_epoch)?;

    let old_previous_justified_epoch = state.previous_justified_epoch;
    let old_justified_epoch = state.justified_epoch;
    let old_finalized_epoch = state.finalized_epoch;
    let mut new_justified_epoch = old_justified_epoch;

    // > Rotate the justification bitfield up one epoch to make room for the current epoch
    state.justification_bitfield <<= 1;

    // > If the previous epoch gets justified, fill the second last bit
    if is_supermajority(previous_attesting_balance, previous_total_balance) {
        new_justified_epoch = previous_epoch;
        state.justification_bitfield |= 0b10;
    }

    // > If the current epoch gets justified, fill the last bit
    if is_supermajority(current_attesting_balance, current_total_balance) {
        new_justified_epoch = current_epoch;
        state.justification_bitfield |= 0b01;
    }

    // > Process finalizations
    let bitfield = state.justification_bitfield;

    // > The 2nd/3rd/4th most recent epochs are all justified, the 2nd using the 4th as source
    if (bitfield >> 1) % 8 == 0b111 && old_previous_justified_epoch + 3 == current_epoch {
        state.finalized_epoch = old_previous_justified_epoch;
    }

    // > The 2nd/3rd most recent epochs are both justified, the 2nd using the 3rd as source
    if (bitfield >> 1) % 4 == 0b11 && old_previous_justified_epoch + 2 == current_epoch {
        state.finalized_epoch = old_previous_justified_epoch;
    }

    // > The 1st/2nd/3rd most recent epochs are all justified, the 1st using the 3rd as source
    if bitfield % 8 == 0b111 && old_justified_epoch + 2 == current_epoch {
        state.finalized_epoch = old_justified_epoch;
    }

    // > The 1st/2nd most recent epochs are both justified, the 1st using the 2nd as source
    if bitfield % 4 == 0b11 && old_justified_epoch + 1 == current_epoch {
        state.finalized_epoch = old_justified_epoch;
    }

    // > Rotate justified epochs
    state.previous_justified_epoch = old_justified_epoch;
    state.justified_epoch = new_justified_epoch;

    if new_justified_epoch != old_justified_epoch {
        info!("justified epoch {new_justified_epoch} at the end of epoch {current_epoch}");
    }

    if state.finalized_epoch != old_finalized_epoch {
        info!(
            "finalized epoch {} at the end of epoch {current_epoch}",
            state.finalized_epoch,
        );
    }

    Ok(())
}

/// Exits active validators whose balance has fallen below [`Config::ejection_balance`].
pub fn process_ejections<P: Preset>(
    config: &Config,
    state: &mut BeaconState<P>,
) -> Result<()> {
    let current_epoch = get_current_epoch(state);

    let underfunded = (0..)
        .zip(state.validator_registry.iter().zip(&state.validator_balances))
        .filter(|(_, (validator, balance))| {
            is_active_validator(validator, current_epoch) && **balance < config.ejection_balance
        })
        .map(|(validator_index, (_, balance))| (validator_index, *balance))
        .collect_vec();

    for (validator_index, balance) in underfunded {
        info!(
            "ejecting validator {validator_index} with balance {balance} \
             in epoch {current_epoch}",
        );
        exit_validator(state, validator_index)?;
    }

    Ok(())
}

pub fn process_final_updates<P: Preset>(state: &mut BeaconState<P>) {
    // > Rotate current/previous epoch attestations
    state.previous_epoch_attestations = core::mem::take(&mut state.current_epoch_attestations);
}

// Validators are counted once even if they appear in multiple attestations.
fn boundary_attesters<P: Preset>(
    state: &BeaconState<P>,
    attestations: &[PendingAttestation<P>],
    boundary_root: H256,
) -> Result<HashSet<ValidatorIndex>> {
    let mut attesters = HashSet::new();

    for attestation in attestations
        .iter()
        .filter(|attestation| attestation.data.epoch_boundary_root == boundary_root)
    {
        attesters.extend(get_attesting_indices(
            state,
            attestation.data,
            &attestation.aggregation_bitfield,
        )?);
    }

    Ok(attesters)
}

const fn is_supermajority(attesting_balance: Gwei, total_balance: Gwei) -> bool {
    attesting_balance * 3 >= total_balance * 2
}

#[cfg(test)]
mod tests {
    use bls::PublicKeyBytes;
    use helper_functions::{accessors::beacon_committee, misc::compute_start_slot_at_epoch};
    use log::Level;
    use ssz::{BitList, ContiguousList, ContiguousVector};
    use test_case::test_case;
    use types::{
        phase0::{
            consts::FAR_FUTURE_EPOCH,
            containers::{AttestationData, Validator},
            primitives::{Epoch, Slot},
        },
        preset::Minimal,
    };

    use super::*;

    const BOUNDARY_ROOT: H256 = H256::repeat_byte(0xb0);

    // 16 validators in the minimal preset form one committee of 2 per slot.
    fn state_at_end_of_epoch(epoch: Epoch) -> Result<BeaconState<Minimal>> {
        let mut state = BeaconState::<Minimal> {
            slot: compute_start_slot_at_epoch::<Minimal>(epoch + 1) - 1,
            latest_block_roots: ContiguousVector::repeat_element(BOUNDARY_ROOT),
            ..BeaconState::default()
        };

        for byte in 0..16 {
            state.validator_registry.push(Validator {
                pubkey: PublicKeyBytes::repeat_byte(byte),
                exit_epoch: FAR_FUTURE_EPOCH,
                ..Validator::default()
            })?;

            state
                .validator_balances
                .push(Minimal::MAX_DEPOSIT_AMOUNT)?;
        }

        Ok(state)
    }

    // One attestation per slot with every committee member participating.
    fn attestations(
        state: &BeaconState<Minimal>,
        slots: impl IntoIterator<Item = Slot>,
        epoch_boundary_root: H256,
    ) -> Result<Vec<PendingAttestation<Minimal>>> {
        slots
            .into_iter()
            .map(|slot| {
                let committee = beacon_committee(state, slot, 0)?;

                Ok(PendingAttestation {
                    aggregation_bitfield: BitList::try_from_iter(
                        core::iter::repeat(true).take(committee.len()),
                    )?,
                    data: AttestationData {
                        slot,
                        index: 0,
                        epoch_boundary_root,
                        ..AttestationData::default()
                    },
                    inclusion_slot: slot + 1,
                })
            })
            .collect()
    }

    fn epoch_slots(epoch: Epoch) -> core::ops::Range<Slot> {
        let start = compute_start_slot_at_epoch::<Minimal>(epoch);
        start..compute_start_slot_at_epoch::<Minimal>(epoch + 1)
    }

    #[test]
    fn full_participation_justifies_both_epochs_and_finalizes() -> Result<()> {
        testing_logger::setup();

        let mut state = state_at_end_of_epoch(4)?;

        state.previous_justified_epoch = 2;
        state.justified_epoch = 3;
        state.finalized_epoch = 2;
        state.justification_bitfield = 0b11;

        state.previous_epoch_attestations =
            ContiguousList::try_from(attestations(&state, epoch_slots(3), BOUNDARY_ROOT)?)?;

        state.current_epoch_attestations =
            ContiguousList::try_from(attestations(&state, epoch_slots(4), BOUNDARY_ROOT)?)?;

        process_justification_and_finalization(&mut state)?;

        assert_eq!(state.justification_bitfield, 0b111);
        assert_eq!(state.previous_justified_epoch, 3);
        assert_eq!(state.justified_epoch, 4);
        assert_eq!(state.finalized_epoch, 3);

        testing_logger::validate(|captured_logs| {
            itertools::assert_equal(
                captured_logs.iter().map(|log| log.body.as_str()),
                [
                    "justified epoch 4 at the end of epoch 4",
                    "finalized epoch 3 at the end of epoch 4",
                ],
            );

            for log in captured_logs {
                assert_eq!(log.level, Level::Info);
            }
        });

        Ok(())
    }

    #[test]
    fn previous_epoch_supermajority_finalizes_previous_justified_epoch() -> Result<()> {
        let mut state = state_at_end_of_epoch(4)?;

        state.previous_justified_epoch = 2;
        state.justified_epoch = 3;
        state.finalized_epoch = 1;
        state.justification_bitfield = 0b11;

        state.previous_epoch_attestations =
            ContiguousList::try_from(attestations(&state, epoch_slots(3), BOUNDARY_ROOT)?)?;

        process_justification_and_finalization(&mut state)?;

        assert_eq!(state.justification_bitfield, 0b110);
        assert_eq!(state.previous_justified_epoch, 3);
        assert_eq!(state.justified_epoch, 3);
        assert_eq!(state.finalized_epoch, 2);

        Ok(())
    }

    #[test]
    fn no_participation_only_shifts_bitfield() -> Result<()> {
        let mut state = state_at_end_of_epoch(4)?;

        state.previous_justified_epoch = 2;
        state.justified_epoch = 3;
        state.finalized_epoch = 2;
        state.justification_bitfield = 0b1001;

        process_justification_and_finalization(&mut state)?;

        assert_eq!(state.justification_bitfield, 0b10010);
        assert_eq!(state.previous_justified_epoch, 3);
        assert_eq!(state.justified_epoch, 3);
        assert_eq!(state.finalized_epoch, 2);

        Ok(())
    }

    #[test]
    fn attestations_for_other_boundary_root_are_ignored() -> Result<()> {
        let mut state = state_at_end_of_epoch(4)?;

        state.justified_epoch = 3;

        state.current_epoch_attestations = ContiguousList::try_from(attestations(
            &state,
            epoch_slots(4),
            H256::repeat_byte(0xee),
        )?)?;

        process_justification_and_finalization(&mut state)?;

        assert_eq!(state.justification_bitfield, 0);
        assert_eq!(state.justified_epoch, 3);

        Ok(())
    }

    #[test]
    fn repeated_attestations_are_counted_once() -> Result<()> {
        let mut state = state_at_end_of_epoch(4)?;

        state.justified_epoch = 3;

        // 10 out of 16 validators is short of two thirds.
        let once = attestations(&state, epoch_slots(4).take(5), BOUNDARY_ROOT)?;
        let twice = once.iter().chain(&once).cloned();

        state.current_epoch_attestations = ContiguousList::try_from_iter(twice)?;

        process_justification_and_finalization(&mut state)?;

        assert_eq!(state.justification_bitfield, 0);
        assert_eq!(state.justified_epoch, 3);

        Ok(())
    }

    #[test]
    fn three_justified_epochs_finalize_previous_justified_epoch() -> Result<()> {
        let mut state = state_at_end_of_epoch(4)?;

        state.previous_justified_epoch = 1;
        state.justified_epoch = 2;
        state.finalized_epoch = 0;
        state.justification_bitfield = 0b111;

        state.previous_epoch_attestations =
            ContiguousList::try_from(attestations(&state, epoch_slots(3), BOUNDARY_ROOT)?)?;

        process_justification_and_finalization(&mut state)?;

        // Bits 1 through 3 are set and the previous justified epoch is 3 epochs old.
        assert_eq!(state.justification_bitfield, 0b1110);
        assert_eq!(state.previous_justified_epoch, 2);
        assert_eq!(state.justified_epoch, 3);
        assert_eq!(state.finalized_epoch, 1);

        Ok(())
    }

    #[test]
    fn current_epoch_supermajority_finalizes_justified_epoch_two_epochs_back() -> Result<()> {
        let mut state = state_at_end_of_epoch(4)?;

        state.previous_justified_epoch = 1;
        state.justified_epoch = 2;
        state.finalized_epoch = 0;
        state.justification_bitfield = 0b11;

        state.current_epoch_attestations =
            ContiguousList::try_from(attestations(&state, epoch_slots(4), BOUNDARY_ROOT)?)?;

        process_justification_and_finalization(&mut state)?;

        // Bits 0 through 2 are set and the justified epoch is 2 epochs old.
        // The justified epoch is not 1 epoch old, so it is not finalized a second time.
        assert_eq!(state.justification_bitfield, 0b111);
        assert_eq!(state.previous_justified_epoch, 2);
        assert_eq!(state.justified_epoch, 4);
        assert_eq!(state.finalized_epoch, 2);

        Ok(())
    }

    #[test]
    fn finalized_epoch_never_decreases() -> Result<()> {
        // Whether the previous and the current epoch are attested to at the end of each epoch.
        let participation = [
            (true, true),
            (false, false),
            (false, true),
            (true, true),
            (true, false),
            (false, false),
            (true, true),
        ];

        let mut previous_state = BeaconState::<Minimal>::default();

        for (epoch, (previous_attested, current_attested)) in (1..).zip(participation) {
            let mut state = state_at_end_of_epoch(epoch)?;

            state.previous_justified_epoch = previous_state.previous_justified_epoch;
            state.justified_epoch = previous_state.justified_epoch;
            state.finalized_epoch = previous_state.finalized_epoch;
            state.justification_bitfield = previous_state.justification_bitfield;

            if previous_attested {
                state.previous_epoch_attestations = ContiguousList::try_from(attestations(
                    &state,
                    epoch_slots(epoch - 1),
                    BOUNDARY_ROOT,
                )?)?;
            }

            if current_attested {
                state.current_epoch_attestations = ContiguousList::try_from(attestations(
                    &state,
                    epoch_slots(epoch),
                    BOUNDARY_ROOT,
                )?)?;
            }

            process_justification_and_finalization(&mut state)?;

            assert!(state.finalized_epoch >= previous_state.finalized_epoch);

            previous_state = state;
        }

        assert_eq!(previous_state.finalized_epoch, 3);

        Ok(())
    }

    #[test]
    fn justification_fails_in_first_slot_of_epoch() {
        let mut state = BeaconState::<Minimal> {
            slot: 8,
            ..BeaconState::default()
        };

        assert!(process_justification_and_finalization(&mut state).is_err());
    }

    #[test_case(15_999_999_999 => true; "just below threshold")]
    #[test_case(16_000_000_000 => false; "at threshold")]
    #[test_case(32_000_000_000 => false; "full balance")]
    fn ejects_active_validator_below_threshold(balance: Gwei) -> bool {
        let mut state = BeaconState::<Minimal> {
            slot: 23,
            ..BeaconState::default()
        };

        state
            .validator_registry
            .push(Validator {
                exit_epoch: FAR_FUTURE_EPOCH,
                ..Validator::default()
            })
            .expect("registry has room for one validator");

        state
            .validator_balances
            .push(balance)
            .expect("balances have room for one balance");

        process_ejections(&Config::minimal(), &mut state).expect("validator 0 exists");

        state.validator_registry[0].exit_epoch != FAR_FUTURE_EPOCH
    }

    #[test]
    fn ejection_schedules_exit_and_skips_inactive_validators() -> Result<()> {
        testing_logger::setup();

        let mut state = BeaconState::<Minimal> {
            slot: 23,
            ..BeaconState::default()
        };

        let validators = [
            // Active and underfunded.
            (0, FAR_FUTURE_EPOCH, 1_000_000_000),
            // Not yet activated.
            (FAR_FUTURE_EPOCH, FAR_FUTURE_EPOCH, 1_000_000_000),
            // Already exited.
            (0, 1, 1_000_000_000),
            // Active and funded.
            (0, FAR_FUTURE_EPOCH, 32_000_000_000),
        ];

        for (activation_epoch, exit_epoch, balance) in validators {
            state.validator_registry.push(Validator {
                activation_epoch,
                exit_epoch,
                ..Validator::default()
            })?;

            state.validator_balances.push(balance)?;
        }

        process_ejections(&Config::minimal(), &mut state)?;

        let exit_epochs = state
            .validator_registry
            .iter()
            .map(|validator| validator.exit_epoch)
            .collect_vec();

        assert_eq!(exit_epochs, [7, FAR_FUTURE_EPOCH, 1, FAR_FUTURE_EPOCH]);

        testing_logger::validate(|captured_logs| {
            assert_eq!(captured_logs.len(), 1);
            assert_eq!(captured_logs[0].level, Level::Info);
            assert_eq!(
                captured_logs[0].body,
                "ejecting validator 0 with balance 1000000000 in epoch 2",
            );
        });

        Ok(())
    }

    #[test]
    fn final_updates_rotate_attestations() -> Result<()> {
        let mut state = BeaconState::<Minimal>::default();

        let attestation = PendingAttestation {
            inclusion_slot: 3,
            ..PendingAttestation::default()
        };

        state.previous_epoch_attestations = ContiguousList::try_from(vec![
            PendingAttestation::default(),
            PendingAttestation::default(),
        ])?;

        state.current_epoch_attestations = ContiguousList::try_from(vec![attestation.clone()])?;

        process_final_updates(&mut state);

        assert_eq!(*state.previous_epoch_attestations, [attestation]);
        assert!(state.current_epoch_attestations.is_empty());

        Ok(())
    }
}
