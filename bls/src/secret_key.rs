use core::{
    fmt::{Binary, Display, LowerExp, LowerHex, Octal, Pointer, UpperExp, UpperHex},
    ops::Deref,
};

use blst::min_pk::SecretKey as RawSecretKey;
use derive_more::Debug;
use serde::Serialize;
use ssz::{SszHash, SszWrite};
use static_assertions::assert_not_impl_any;

use crate::{
    error::Error, public_key::PublicKey, secret_key_bytes::SecretKeyBytes, signature::Signature,
    DOMAIN_SEPARATION_TAG,
};

// `RawSecretKey` zeroizes itself on drop.
#[derive(Debug)]
#[debug("[REDACTED]")]
pub struct SecretKey(RawSecretKey);

assert_not_impl_any! {
    SecretKey:

    Clone,
    Copy,
    Deref,
    ToOwned,

    Binary,
    Display,
    LowerExp,
    LowerHex,
    Octal,
    Pointer,
    UpperExp,
    UpperHex,

    Serialize,
    SszHash,
    SszWrite,
}

impl TryFrom<SecretKeyBytes> for SecretKey {
    type Error = Error;

    #[inline]
    fn try_from(secret_key_bytes: SecretKeyBytes) -> Result<Self, Self::Error> {
        RawSecretKey::from_bytes(secret_key_bytes.as_ref())
            .map(Self)
            .map_err(|_| Error::InvalidSecretKey)
    }
}

impl SecretKey {
    #[inline]
    #[must_use]
    pub fn to_public_key(&self) -> PublicKey {
        self.0.sk_to_pk().into()
    }

    #[inline]
    #[must_use]
    pub fn sign(&self, message: impl AsRef<[u8]>) -> Signature {
        self.0
            .sign(message.as_ref(), DOMAIN_SEPARATION_TAG, &[])
            .into()
    }
}
