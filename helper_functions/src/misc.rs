use core::num::NonZeroU64;

use anyhow::Result;
use arithmetic::U64Ext as _;
use ssz::SignedRoot;
use tap::{Pipe as _, TryConv as _};
use typenum::Unsigned as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        primitives::{Domain, DomainType, Epoch, Slot, ValidatorIndex, Version, H256},
    },
    preset::Preset,
};

use crate::error::Error;

#[must_use]
pub fn compute_epoch_at_slot<P: Preset>(slot: Slot) -> Epoch {
    slot.div_typenum::<P::SlotsPerEpoch>()
}

#[must_use]
pub const fn compute_start_slot_at_epoch<P: Preset>(epoch: Epoch) -> Slot {
    epoch.saturating_mul(P::SlotsPerEpoch::U64)
}

#[must_use]
pub fn slots_since_epoch_start<P: Preset>(slot: Slot) -> u64 {
    slot.mod_typenum::<P::SlotsPerEpoch>()
}

#[must_use]
pub fn is_epoch_end<P: Preset>(slot: Slot) -> bool {
    (slot + 1).is_multiple_of_typenum::<P::SlotsPerEpoch>()
}

/// Epoch at which a validator exiting during `epoch` actually stops being active.
#[must_use]
pub const fn compute_activation_exit_epoch<P: Preset>(epoch: Epoch) -> Epoch {
    epoch + 1 + P::ACTIVATION_EXIT_DELAY
}

/// Domain bytes: 4 bytes of `domain_type`, 4 bytes of `fork_version`, then zeros.
#[must_use]
pub fn compute_domain(domain_type: DomainType, fork_version: Version) -> Domain {
    let type_length = DomainType::len_bytes();
    let version_length = Version::len_bytes();

    let mut domain = Domain::zero();
    domain[..type_length].copy_from_slice(domain_type.as_bytes());
    domain[type_length..type_length + version_length].copy_from_slice(fork_version.as_bytes());
    domain
}

/// Message that is actually signed: the signed root of `object` bound to `domain`.
#[must_use]
pub fn compute_signing_root(object: &(impl SignedRoot + ?Sized), domain: Domain) -> H256 {
    hashing::hash_256_256(object.signed_root(), domain)
}

#[must_use]
pub fn compute_shuffled_index<P: Preset>(
    index: ValidatorIndex,
    index_count: NonZeroU64,
    seed: H256,
) -> ValidatorIndex {
    shuffling::shuffle_single::<P>(index, index_count, seed)
}

/// Picks a proposer from `indices` with probability proportional to balance.
///
/// Balances are capped at `MAX_DEPOSIT_AMOUNT` for the purposes of selection.
pub fn compute_proposer_index<P: Preset>(
    state: &BeaconState<P>,
    indices: &[ValidatorIndex],
    seed: H256,
) -> Result<ValidatorIndex> {
    let total = indices
        .len()
        .try_conv::<u64>()?
        .pipe(NonZeroU64::new)
        .ok_or(Error::NoActiveValidators)?;

    let max_random_byte = u64::from(u8::MAX);

    for (random_byte, attempt) in (0..u64::MAX / H256::len_bytes() as u64)
        .flat_map(|quotient| hashing::hash_256_64(seed, quotient).to_fixed_bytes())
        .map(u64::from)
        .zip(0..)
    {
        let shuffled_index_of_index = compute_shuffled_index::<P>(attempt % total, total, seed);
        let candidate_index = indices[shuffled_index_of_index.try_conv::<usize>()?];

        let balance = (*state.validator_balances.get(candidate_index)?).min(P::MAX_DEPOSIT_AMOUNT);

        if balance * max_random_byte >= P::MAX_DEPOSIT_AMOUNT * random_byte {
            return Ok(candidate_index);
        }
    }

    Err(Error::FailedToSelectProposer.into())
}

#[must_use]
pub fn committee_count_from_active_validator_count<P: Preset>(active_validator_count: u64) -> u64 {
    (active_validator_count.div_typenum::<P::SlotsPerEpoch>() / P::TARGET_COMMITTEE_SIZE)
        .clamp(1, P::MAX_COMMITTEES_PER_SLOT.get())
}
