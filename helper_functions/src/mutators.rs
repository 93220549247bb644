use anyhow::Result;
use types::{
    phase0::{
        beacon_state::BeaconState,
        primitives::{Gwei, ValidatorIndex},
    },
    preset::Preset,
};

use crate::{accessors::get_current_epoch, misc::compute_activation_exit_epoch};

pub fn balance<P: Preset>(
    state: &mut BeaconState<P>,
    validator_index: ValidatorIndex,
) -> Result<&mut Gwei> {
    state
        .validator_balances
        .get_mut(validator_index)
        .map_err(Into::into)
}

#[inline]
pub fn increase_balance(balance: &mut Gwei, delta: Gwei) {
    *balance += delta;
}

/// Schedules the exit of a validator after the activation exit delay.
///
/// Validators already scheduled to exit no later than that keep their exit epoch.
pub fn exit_validator<P: Preset>(
    state: &mut BeaconState<P>,
    validator_index: ValidatorIndex,
) -> Result<()> {
    let delayed_activation_exit_epoch = compute_activation_exit_epoch::<P>(get_current_epoch(state));
    let validator = state.validator_registry.get_mut(validator_index)?;

    if validator.exit_epoch <= delayed_activation_exit_epoch {
        return Ok(());
    }

    validator.exit_epoch = delayed_activation_exit_epoch;

    Ok(())
}
