use anyhow::{ensure, Result};
use bls::PublicKeyBytes;
use im::HashMap;
use ssz::BitList;
use tap::{Pipe as _, TryConv as _};
use typenum::Unsigned as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        consts::{DOMAIN_BEACON_ATTESTER, DOMAIN_BEACON_BLOCK, GENESIS_EPOCH},
        containers::AttestationData,
        primitives::{
            CommitteeIndex, Domain, DomainType, Epoch, Gwei, Slot, ValidatorIndex, H256,
        },
    },
    preset::Preset,
};

use crate::{error::Error, misc, predicates};

#[must_use]
pub fn get_current_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    misc::compute_epoch_at_slot::<P>(state.slot)
}

/// Epoch before the current one, or the genesis epoch if the state is still in it.
#[must_use]
pub fn get_previous_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state)
        .saturating_sub(1)
        .max(GENESIS_EPOCH)
}

pub fn get_block_root_at_slot<P: Preset>(state: &BeaconState<P>, slot: Slot) -> Result<H256> {
    ensure!(slot < state.slot, Error::SlotOutOfRange);

    ensure!(
        state.slot <= slot + P::SlotsPerHistoricalRoot::U64,
        Error::SlotOutOfRange,
    );

    Ok(*state.latest_block_roots.mod_index(slot))
}

pub fn get_block_root<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<H256> {
    get_block_root_at_slot(state, misc::compute_start_slot_at_epoch::<P>(epoch))
}

#[must_use]
pub fn get_randao_mix<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    *state.latest_randao_mixes.mod_index(epoch)
}

#[must_use]
pub fn get_seed<P: Preset>(state: &BeaconState<P>, epoch: Epoch, domain_type: DomainType) -> H256 {
    // The mix from `MIN_SEED_LOOKAHEAD + 1` epochs ago.
    // Adding the vector length keeps the subtraction from underflowing near genesis.
    let mix = get_randao_mix(
        state,
        epoch + P::EpochsPerHistoricalVector::U64 - P::MIN_SEED_LOOKAHEAD - 1,
    );

    hashing::hash_32_64_256(domain_type.to_fixed_bytes(), epoch, mix)
}

pub fn get_active_validator_indices<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> impl Iterator<Item = ValidatorIndex> + '_ {
    (0..)
        .zip(&state.validator_registry)
        .filter(move |(_, validator)| predicates::is_active_validator(validator, epoch))
        .map(|(validator_index, _)| validator_index)
}

/// Sum of balances of validators in `indices`.
///
/// `indices` is expected to contain no duplicates.
pub fn get_total_balance<P: Preset>(
    state: &BeaconState<P>,
    indices: impl IntoIterator<Item = ValidatorIndex>,
) -> Result<Gwei> {
    indices
        .into_iter()
        .map(|validator_index| state.validator_balances.get(validator_index).copied())
        .sum::<Result<Gwei, _>>()
        .map_err(Into::into)
}

pub fn get_total_active_balance<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<Gwei> {
    get_total_balance(state, get_active_validator_indices(state, epoch))
}

pub fn get_committee_count_per_slot<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<u64> {
    let active_validator_count = get_active_validator_indices(state, epoch)
        .count()
        .try_conv::<u64>()?;

    Ok(misc::committee_count_from_active_validator_count::<P>(
        active_validator_count,
    ))
}

fn active_validator_indices_shuffled<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> Result<Vec<ValidatorIndex>> {
    let mut indices = get_active_validator_indices(state, epoch).collect::<Vec<_>>();
    let seed = get_seed(state, epoch, DOMAIN_BEACON_ATTESTER);
    shuffling::shuffle_slice::<P, _>(&mut indices, seed)?;
    Ok(indices)
}

/// Members of committee `committee_index` assigned to `slot`.
///
/// Every active validator is in exactly one committee per epoch.
pub fn beacon_committee<P: Preset>(
    state: &BeaconState<P>,
    slot: Slot,
    committee_index: CommitteeIndex,
) -> Result<Vec<ValidatorIndex>> {
    let epoch = misc::compute_epoch_at_slot::<P>(slot);
    let committees_per_slot = get_committee_count_per_slot(state, epoch)?;

    ensure!(
        committee_index < committees_per_slot,
        Error::CommitteeIndexOutOfBounds,
    );

    let mut indices = active_validator_indices_shuffled(state, epoch)?;
    let validator_count = indices.len().try_conv::<u64>()?;
    let committees_in_epoch = committees_per_slot * P::SlotsPerEpoch::U64;
    let slots_since_epoch_start = misc::slots_since_epoch_start::<P>(slot);
    let index_in_epoch = slots_since_epoch_start * committees_per_slot + committee_index;
    let start = (validator_count * index_in_epoch / committees_in_epoch).try_conv::<usize>()?;
    let end = (validator_count * (index_in_epoch + 1) / committees_in_epoch).try_conv::<usize>()?;

    indices.truncate(end);
    indices.drain(..start);

    Ok(indices)
}

/// Validators in the committee of `attestation_data` whose bits are set in `aggregation_bitfield`.
pub fn get_attesting_indices<'all, P: Preset>(
    state: &'all BeaconState<P>,
    attestation_data: AttestationData,
    aggregation_bitfield: &'all BitList<P::MaxValidatorsPerCommittee>,
) -> Result<impl Iterator<Item = ValidatorIndex> + 'all> {
    let committee = beacon_committee(state, attestation_data.slot, attestation_data.index)?;

    ensure!(
        committee.len() == aggregation_bitfield.len(),
        Error::CommitteeLengthMismatch {
            aggregation_bitfield_length: aggregation_bitfield.len(),
            committee_length: committee.len(),
        },
    );

    aggregation_bitfield
        .iter()
        .by_vals()
        .zip(committee)
        .filter_map(|(present, validator_index)| present.then_some(validator_index))
        .pipe(Ok)
}

/// Proposer for `state.slot`.
///
/// The result is cached in the state until the slot advances.
pub fn get_beacon_proposer_index<P: Preset>(state: &BeaconState<P>) -> Result<ValidatorIndex> {
    state
        .cache
        .proposer_index
        .get_or_try_init(|| {
            let epoch = get_current_epoch(state);
            let indices = get_active_validator_indices(state, epoch).collect::<Vec<_>>();
            let seed = hashing::hash_256_64(get_seed(state, epoch, DOMAIN_BEACON_BLOCK), state.slot);

            misc::compute_proposer_index(state, &indices, seed)
        })
        .copied()
}

/// Domain for signatures made during `epoch`, or the current epoch if `epoch` is `None`.
#[must_use]
pub fn get_domain<P: Preset>(
    state: &BeaconState<P>,
    domain_type: DomainType,
    epoch: Option<Epoch>,
) -> Domain {
    let epoch = epoch.unwrap_or_else(|| get_current_epoch(state));
    let fork = state.fork;

    let fork_version = if epoch < fork.epoch {
        fork.previous_version
    } else {
        fork.current_version
    };

    misc::compute_domain(domain_type, fork_version)
}

#[must_use]
pub fn index_of_public_key<P: Preset>(
    state: &BeaconState<P>,
    public_key: PublicKeyBytes,
) -> Option<ValidatorIndex> {
    get_or_init_validator_indices(state)
        .get(&public_key)
        .copied()
}

pub fn get_or_init_validator_indices<P: Preset>(
    state: &BeaconState<P>,
) -> &HashMap<PublicKeyBytes, ValidatorIndex> {
    state.cache.validator_indices.get_or_init(|| {
        let mut validator_indices = HashMap::new();

        // A public key repeated in the registry resolves to its first occurrence.
        for (validator, validator_index) in state.validator_registry.iter().zip(0..) {
            validator_indices
                .entry(validator.pubkey)
                .or_insert(validator_index);
        }

        validator_indices
    })
}

#[cfg(test)]
mod tests {
    use itertools::Itertools as _;
    use test_case::test_case;
    use types::{
        phase0::{
            consts::{DOMAIN_DEPOSIT, FAR_FUTURE_EPOCH},
            containers::{Fork, Validator},
            primitives::H32,
        },
        preset::Minimal,
    };

    use super::*;

    fn state_with_validators(count: u8) -> Result<BeaconState<Minimal>> {
        let mut state = BeaconState::default();

        for byte in 0..count {
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

    #[test_case(0 => 0)]
    #[test_case(8 => 0; "first slot of epoch 1")]
    #[test_case(16 => 1)]
    fn previous_epoch_saturates(slot: Slot) -> Epoch {
        let state = BeaconState::<Minimal> {
            slot,
            ..BeaconState::default()
        };

        get_previous_epoch(&state)
    }

    #[test]
    fn block_root_at_slot_requires_recent_past_slot() {
        let mut state = BeaconState::<Minimal> {
            slot: 70,
            ..BeaconState::default()
        };

        *state.latest_block_roots.mod_index_mut(69) = H256::repeat_byte(1);
        *state.latest_block_roots.mod_index_mut(6) = H256::repeat_byte(2);

        assert_eq!(get_block_root_at_slot(&state, 69).ok(), Some(H256::repeat_byte(1)));
        assert_eq!(get_block_root_at_slot(&state, 6).ok(), Some(H256::repeat_byte(2)));
        assert!(get_block_root_at_slot(&state, 70).is_err());
        assert!(get_block_root_at_slot(&state, 5).is_err());
    }

    #[test]
    fn committees_partition_active_validators() -> Result<()> {
        let state = state_with_validators(64)?;

        let committees_per_slot = get_committee_count_per_slot(&state, 0)?;

        assert_eq!(committees_per_slot, 2);

        let members = (0..8)
            .cartesian_product(0..committees_per_slot)
            .map(|(slot, committee_index)| beacon_committee(&state, slot, committee_index))
            .flatten_ok()
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(members.into_iter().sorted().collect_vec(), (0..64).collect_vec());

        Ok(())
    }

    #[test]
    fn committee_index_must_be_in_bounds() -> Result<()> {
        let state = state_with_validators(16)?;

        assert!(beacon_committee(&state, 0, 0).is_ok());
        assert!(beacon_committee(&state, 0, 1).is_err());

        Ok(())
    }

    #[test]
    fn attesting_indices_follow_set_bits() -> Result<()> {
        let state = state_with_validators(16)?;
        let committee = beacon_committee(&state, 3, 0)?;

        let attestation_data = AttestationData {
            slot: 3,
            ..AttestationData::default()
        };

        let bitfield = BitList::try_from_iter((0..committee.len()).map(|position| position == 0))?;

        let attesting = get_attesting_indices(&state, attestation_data, &bitfield)?.collect_vec();

        assert_eq!(attesting, [committee[0]]);

        let too_long = BitList::try_from_iter(core::iter::repeat(true).take(committee.len() + 1))?;

        assert!(get_attesting_indices(&state, attestation_data, &too_long).is_err());

        Ok(())
    }

    #[test]
    fn total_balance_sums_given_indices() -> Result<()> {
        let mut state = state_with_validators(3)?;

        state.validator_balances[1] = 5;

        assert_eq!(get_total_balance(&state, [0, 1])?, Minimal::MAX_DEPOSIT_AMOUNT + 5);
        assert_eq!(get_total_balance(&state, [])?, 0);
        assert!(get_total_balance(&state, [3]).is_err());

        Ok(())
    }

    #[test]
    fn active_validators_exclude_exited_and_pending() -> Result<()> {
        let mut state = state_with_validators(4)?;

        state.validator_registry[1].exit_epoch = 0;
        state.validator_registry[2].activation_epoch = FAR_FUTURE_EPOCH;

        assert_eq!(get_active_validator_indices(&state, 0).collect_vec(), [0, 3]);
        assert_eq!(get_total_active_balance(&state, 0)?, 2 * Minimal::MAX_DEPOSIT_AMOUNT);

        Ok(())
    }

    #[test]
    fn proposer_index_is_cached_until_slot_advances() -> Result<()> {
        let mut state = state_with_validators(16)?;

        let proposer_index = get_beacon_proposer_index(&state)?;

        assert_eq!(state.cache.proposer_index.get(), Some(&proposer_index));

        state.slot += 1;
        state.cache.advance_slot();

        assert_eq!(state.cache.proposer_index.get(), None);
        assert!(get_beacon_proposer_index(&state)? < 16);

        Ok(())
    }

    #[test]
    fn domain_uses_fork_version_for_epoch() {
        let state = BeaconState::<Minimal> {
            slot: 16,
            fork: Fork {
                previous_version: H32::repeat_byte(1),
                current_version: H32::repeat_byte(2),
                epoch: 2,
            },
            ..BeaconState::default()
        };

        let current = get_domain(&state, DOMAIN_DEPOSIT, None);
        let earlier = get_domain(&state, DOMAIN_DEPOSIT, Some(1));

        assert_eq!(current, misc::compute_domain(DOMAIN_DEPOSIT, H32::repeat_byte(2)));
        assert_eq!(earlier, misc::compute_domain(DOMAIN_DEPOSIT, H32::repeat_byte(1)));
    }

    #[test]
    fn public_keys_are_looked_up_through_cache() -> Result<()> {
        let state = state_with_validators(3)?;

        assert_eq!(index_of_public_key(&state, PublicKeyBytes::repeat_byte(2)), Some(2));
        assert_eq!(index_of_public_key(&state, PublicKeyBytes::repeat_byte(9)), None);
        assert!(state.cache.validator_indices.get().is_some());

        Ok(())
    }

    #[test]
    fn index_of_repeated_public_key_is_first_occurrence() -> Result<()> {
        let mut state = state_with_validators(4)?;

        state.validator_registry.push(Validator {
            pubkey: PublicKeyBytes::repeat_byte(1),
            exit_epoch: FAR_FUTURE_EPOCH,
            ..Validator::default()
        })?;

        assert_eq!(index_of_public_key(&state, PublicKeyBytes::repeat_byte(1)), Some(1));

        Ok(())
    }

    #[test]
    fn seed_depends_on_domain_type() {
        let state = BeaconState::<Minimal>::default();

        assert_ne!(
            get_seed(&state, 0, DOMAIN_BEACON_ATTESTER),
            get_seed(&state, 0, DOMAIN_BEACON_BLOCK),
        );
    }
}
