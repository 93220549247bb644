use core::{
    fmt::{Binary, Debug, Display, LowerExp, LowerHex, Octal, Pointer, UpperExp, UpperHex},
    ops::Deref,
};

use derive_more::{AsMut, AsRef, From};
use hex::FromHex;
use serde::Serialize;
use ssz::SszHash;
use static_assertions::assert_not_impl_any;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub(crate) const SIZE: usize = 32;

#[derive(Default, AsRef, AsMut, From, Zeroize, ZeroizeOnDrop)]
#[as_ref(forward)]
#[as_mut(forward)]
pub struct SecretKeyBytes {
    pub(crate) bytes: [u8; SIZE],
}

// Keep secret key material from leaking through formatting, copying or serialization.
assert_not_impl_any! {
    SecretKeyBytes:

    Clone,
    Copy,
    Deref,
    ToOwned,

    Debug,
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
}

impl FromHex for SecretKeyBytes {
    type Error = <[u8; SIZE] as FromHex>::Error;

    fn from_hex<T: AsRef<[u8]>>(digits: T) -> Result<Self, Self::Error> {
        let bytes = FromHex::from_hex(digits)?;
        Ok(Self { bytes })
    }
}
