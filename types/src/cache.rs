use bls::PublicKeyBytes;
use im::HashMap;
use once_cell::sync::OnceCell;

use crate::phase0::primitives::ValidatorIndex;

// The fields in `Cache` are ordered from short-lived to long-lived.
#[derive(Clone, Default, Debug)]
pub struct Cache {
    // `OnceCell` rather than `Option` so that it can be filled through a shared reference.
    pub proposer_index: OnceCell<ValidatorIndex>,
    // A persistent map makes cloning states cheap even with large registries.
    pub validator_indices: OnceCell<HashMap<PublicKeyBytes, ValidatorIndex>>,
}

impl Cache {
    pub fn advance_slot(&mut self) {
        self.proposer_index.take();
    }
}
