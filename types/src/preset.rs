#![allow(clippy::module_name_repetitions)]

use core::{fmt::Debug, hash::Hash, num::NonZeroU64};

use nonzero_ext::nonzero;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use ssz::{MerkleBits, MerkleElements};
use strum::{Display, EnumString, VariantNames};
use typenum::{NonZero, Prod, Unsigned, U1099511627776, U128, U16, U2048, U32, U64, U65536, U8, U8192};

use crate::{
    config::Config,
    phase0::{
        containers::{Deposit, PendingAttestation, Validator},
        primitives::{Gwei, H256},
    },
};

/// Compile-time configuration variables.
///
/// The associated types determine the shapes of containers.
/// Everything that can vary without changing types belongs in [`Config`].
pub trait Preset: Copy + Eq + Ord + Hash + Default + Debug + Send + Sync + 'static {
    type EpochsPerHistoricalVector: MerkleElements<H256> + NonZero + Eq + Debug + Send + Sync;
    type MaxAttestations: Unsigned + Eq + Debug + Send + Sync;
    type MaxDeposits: MerkleElements<Deposit> + Eq + Debug + Send + Sync;
    type MaxValidatorsPerCommittee: MerkleBits + NonZero + Eq + Debug + Send + Sync;
    type SlotsPerEpoch: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type SlotsPerHistoricalRoot: MerkleElements<H256> + NonZero + Eq + Debug + Send + Sync;
    type ValidatorRegistryLimit: MerkleElements<Validator>
        + MerkleElements<Gwei>
        + Eq
        + Debug
        + Send
        + Sync;

    // Derived type-level variables
    type MaxAttestationsPerEpoch: MerkleElements<PendingAttestation<Self>>
        + Eq
        + Debug
        + Send
        + Sync;

    const NAME: PresetName;

    const ACTIVATION_EXIT_DELAY: u64 = 4;
    const MAX_COMMITTEES_PER_SLOT: NonZeroU64 = nonzero!(64_u64);
    const MAX_DEPOSIT_AMOUNT: Gwei = 32_000_000_000;
    const MIN_SEED_LOOKAHEAD: u64 = 1;
    const SHUFFLE_ROUND_COUNT: u8 = 90;
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(128_u64);

    #[must_use]
    fn default_config() -> Config {
        Self::NAME.default_config()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Mainnet;

impl Preset for Mainnet {
    type EpochsPerHistoricalVector = U65536;
    type MaxAttestations = U128;
    type MaxDeposits = U16;
    type MaxValidatorsPerCommittee = U2048;
    type SlotsPerEpoch = U32;
    type SlotsPerHistoricalRoot = U8192;
    type ValidatorRegistryLimit = U1099511627776;

    type MaxAttestationsPerEpoch = Prod<Self::MaxAttestations, Self::SlotsPerEpoch>;

    const NAME: PresetName = PresetName::Mainnet;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Minimal;

impl Preset for Minimal {
    type EpochsPerHistoricalVector = U64;
    type MaxAttestations = <Mainnet as Preset>::MaxAttestations;
    type MaxDeposits = <Mainnet as Preset>::MaxDeposits;
    type MaxValidatorsPerCommittee = <Mainnet as Preset>::MaxValidatorsPerCommittee;
    type SlotsPerEpoch = U8;
    type SlotsPerHistoricalRoot = U64;
    type ValidatorRegistryLimit = <Mainnet as Preset>::ValidatorRegistryLimit;

    type MaxAttestationsPerEpoch = Prod<Self::MaxAttestations, Self::SlotsPerEpoch>;

    const NAME: PresetName = PresetName::Minimal;

    const MAX_COMMITTEES_PER_SLOT: NonZeroU64 = nonzero!(4_u64);
    const SHUFFLE_ROUND_COUNT: u8 = 10;
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(4_u64);
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    Display,
    EnumString,
    VariantNames,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase")]
pub enum PresetName {
    Mainnet,
    Minimal,
}

impl PresetName {
    #[must_use]
    pub fn default_config(self) -> Config {
        match self {
            Self::Mainnet => Config::mainnet(),
            Self::Minimal => Config::minimal(),
        }
    }
}
