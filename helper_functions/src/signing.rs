use anyhow::Result;
use bls::{PublicKeyBytes, SecretKey, Signature, SignatureBytes};
use ssz::SignedRoot;
use types::{
    phase0::{
        beacon_state::BeaconState,
        consts::{DOMAIN_BEACON_BLOCK, DOMAIN_DEPOSIT},
        containers::{BeaconBlock, BeaconBlockHeader, DepositInput},
        primitives::{DomainType, Epoch, H256},
    },
    preset::Preset,
};

use crate::{
    accessors,
    error::SignatureKind,
    misc,
    verifier::{SingleVerifier, Verifier as _},
};

/// Objects signed with the fork version valid at an epoch they carry themselves.
pub trait SignForSingleFork<P: Preset>: SignedRoot {
    const DOMAIN_TYPE: DomainType;
    const SIGNATURE_KIND: SignatureKind;

    fn epoch(&self) -> Epoch;

    fn signing_root(&self, state: &BeaconState<P>) -> H256 {
        let domain = accessors::get_domain(state, Self::DOMAIN_TYPE, Some(self.epoch()));
        misc::compute_signing_root(self, domain)
    }

    fn sign(&self, state: &BeaconState<P>, secret_key: &SecretKey) -> Signature {
        secret_key.sign(self.signing_root(state))
    }

    fn verify(
        &self,
        state: &BeaconState<P>,
        signature_bytes: SignatureBytes,
        public_key_bytes: PublicKeyBytes,
    ) -> Result<()> {
        SingleVerifier.verify_singular(
            self.signing_root(state),
            signature_bytes,
            public_key_bytes,
            Self::SIGNATURE_KIND,
        )
    }
}

/// Objects signed with the fork version valid at the epoch of the state processing them.
pub trait SignForCurrentEpoch<P: Preset>: SignedRoot {
    const DOMAIN_TYPE: DomainType;
    const SIGNATURE_KIND: SignatureKind;

    fn signing_root(&self, state: &BeaconState<P>) -> H256 {
        let domain = accessors::get_domain(state, Self::DOMAIN_TYPE, None);
        misc::compute_signing_root(self, domain)
    }

    fn sign(&self, state: &BeaconState<P>, secret_key: &SecretKey) -> Signature {
        secret_key.sign(self.signing_root(state))
    }

    fn verify(
        &self,
        state: &BeaconState<P>,
        signature_bytes: SignatureBytes,
        public_key_bytes: PublicKeyBytes,
    ) -> Result<()> {
        SingleVerifier.verify_singular(
            self.signing_root(state),
            signature_bytes,
            public_key_bytes,
            Self::SIGNATURE_KIND,
        )
    }
}

impl<P: Preset> SignForSingleFork<P> for BeaconBlock<P> {
    const DOMAIN_TYPE: DomainType = DOMAIN_BEACON_BLOCK;
    const SIGNATURE_KIND: SignatureKind = SignatureKind::Block;

    fn epoch(&self) -> Epoch {
        misc::compute_epoch_at_slot::<P>(self.slot)
    }
}

impl<P: Preset> SignForSingleFork<P> for BeaconBlockHeader {
    const DOMAIN_TYPE: DomainType = DOMAIN_BEACON_BLOCK;
    const SIGNATURE_KIND: SignatureKind = SignatureKind::Block;

    fn epoch(&self) -> Epoch {
        misc::compute_epoch_at_slot::<P>(self.slot)
    }
}

impl<P: Preset> SignForCurrentEpoch<P> for DepositInput {
    const DOMAIN_TYPE: DomainType = DOMAIN_DEPOSIT;
    const SIGNATURE_KIND: SignatureKind = SignatureKind::Deposit;
}
