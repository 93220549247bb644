use derivative::Derivative;
use serde::{Deserialize, Serialize};
use ssz::Ssz;

use crate::{
    cache::Cache,
    collections::{Attestations, Balances, RandaoMixes, RecentRoots, Validators},
    phase0::{
        containers::{BeaconBlockHeader, Eth1Data, Fork},
        primitives::{DepositIndex, Epoch, Slot, UnixSeconds},
    },
    preset::Preset,
};

#[derive(Clone, Default, Debug, Derivative, Deserialize, Serialize, Ssz)]
#[derivative(PartialEq, Eq)]
#[serde(bound = "", deny_unknown_fields)]
pub struct BeaconState<P: Preset> {
    // > Misc
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
    #[serde(with = "serde_utils::string_or_native")]
    pub genesis_time: UnixSeconds,
    pub fork: Fork,

    // > Validator registry
    pub validator_registry: Validators<P>,
    pub validator_balances: Balances<P>,

    // > Randomness
    pub latest_randao_mixes: RandaoMixes<P>,

    // > Finality
    pub previous_epoch_attestations: Attestations<P>,
    pub current_epoch_attestations: Attestations<P>,
    #[serde(with = "serde_utils::string_or_native")]
    pub previous_justified_epoch: Epoch,
    #[serde(with = "serde_utils::string_or_native")]
    pub justified_epoch: Epoch,
    #[serde(with = "serde_utils::string_or_native")]
    pub justification_bitfield: u64,
    #[serde(with = "serde_utils::string_or_native")]
    pub finalized_epoch: Epoch,

    // > Recent state
    pub latest_block_roots: RecentRoots<P>,
    pub latest_state_roots: RecentRoots<P>,
    pub latest_block_header: BeaconBlockHeader,

    // > Ethereum 1.0 chain data
    pub latest_eth1_data: Eth1Data,
    #[serde(with = "serde_utils::string_or_native")]
    pub deposit_index: DepositIndex,

    // Cache
    #[derivative(PartialEq = "ignore")]
    #[serde(skip)]
    #[ssz(skip)]
    pub cache: Cache,
}
