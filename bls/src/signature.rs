use core::num::NonZeroU64;

use blst::{blst_scalar, min_pk::Signature as RawSignature, BLST_ERROR};
use derive_more::From;
use itertools::Itertools as _;
use rand::Rng as _;

use crate::{
    error::Error, public_key::PublicKey, signature_bytes::SignatureBytes, DOMAIN_SEPARATION_TAG,
};

const MULTI_VERIFY_RANDOM_BYTES: usize = size_of::<NonZeroU64>();
const MULTI_VERIFY_RANDOM_BITS: usize = MULTI_VERIFY_RANDOM_BYTES * 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug, From)]
pub struct Signature(RawSignature);

impl TryFrom<SignatureBytes> for Signature {
    type Error = Error;

    #[inline]
    fn try_from(bytes: SignatureBytes) -> Result<Self, Self::Error> {
        RawSignature::uncompress(bytes.as_bytes())
            .map(Self)
            .map_err(|_| Error::InvalidSignature)
    }
}

impl Signature {
    #[must_use]
    pub fn verify(&self, message: impl AsRef<[u8]>, public_key: &PublicKey) -> bool {
        let result = self.as_raw().verify(
            true,
            message.as_ref(),
            DOMAIN_SEPARATION_TAG,
            &[],
            public_key.as_raw(),
            false,
        );

        result == BLST_ERROR::BLST_SUCCESS
    }

    /// Verifies a batch of unrelated signatures at once.
    ///
    /// Each signature is weighted by a random nonzero scalar so that invalid signatures cannot
    /// cancel each other out.
    #[must_use]
    pub fn multi_verify<'all>(
        messages: impl IntoIterator<Item = &'all [u8]>,
        signatures: impl IntoIterator<Item = &'all Self>,
        public_keys: impl IntoIterator<Item = &'all PublicKey>,
    ) -> bool {
        let messages = messages.into_iter().collect_vec();
        let signatures = signatures.into_iter().map(Self::as_raw).collect_vec();
        let public_keys = public_keys.into_iter().map(PublicKey::as_raw).collect_vec();

        if signatures.is_empty() {
            return true;
        }

        let mut rng = rand::thread_rng();

        let randoms = core::iter::repeat_with(|| {
            let mut scalar = blst_scalar::default();
            let nonzero_bytes = rng.gen::<NonZeroU64>().get().to_le_bytes();
            scalar.b[..MULTI_VERIFY_RANDOM_BYTES].copy_from_slice(&nonzero_bytes);
            scalar
        })
        .take(signatures.len())
        .collect_vec();

        let result = RawSignature::verify_multiple_aggregate_signatures(
            messages.as_slice(),
            DOMAIN_SEPARATION_TAG,
            public_keys.as_slice(),
            false,
            signatures.as_slice(),
            true,
            randoms.as_slice(),
            MULTI_VERIFY_RANDOM_BITS,
        );

        result == BLST_ERROR::BLST_SUCCESS
    }

    #[must_use]
    pub(crate) const fn as_raw(&self) -> &RawSignature {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::{PublicKeyBytes, SecretKey, SecretKeyBytes};

    use super::*;

    const MESSAGE: &[u8] = b"beacon block";
    const OTHER_MESSAGE: &[u8] = b"deposit";

    #[test]
    fn signature_verify_succeeds_on_correct_triple() {
        let secret_key = secret_key(1);
        let public_key = secret_key.to_public_key();
        let signature = secret_key.sign(MESSAGE);

        assert!(signature.verify(MESSAGE, &public_key));
    }

    #[test]
    fn signature_verify_fails_on_incorrect_public_key() {
        let signature = secret_key(1).sign(MESSAGE);
        let public_key = secret_key(2).to_public_key();

        assert!(!signature.verify(MESSAGE, &public_key));
    }

    #[test]
    fn signature_verify_fails_on_incorrect_message() {
        let secret_key = secret_key(1);
        let public_key = secret_key.to_public_key();
        let signature = secret_key.sign(MESSAGE);

        assert!(!signature.verify(OTHER_MESSAGE, &public_key));
    }

    #[test]
    fn signature_survives_compression() -> Result<(), Error> {
        let secret_key = secret_key(3);
        let public_key_bytes = PublicKeyBytes::from(secret_key.to_public_key());
        let signature_bytes = SignatureBytes::from(secret_key.sign(MESSAGE));

        let public_key = PublicKey::try_from(public_key_bytes)?;
        let signature = Signature::try_from(signature_bytes)?;

        assert!(signature.verify(MESSAGE, &public_key));

        Ok(())
    }

    #[test]
    fn empty_signature_bytes_do_not_verify() -> Result<(), Error> {
        let public_key = secret_key(1).to_public_key();
        let signature = Signature::try_from(SignatureBytes::empty())?;

        assert!(!signature.verify(MESSAGE, &public_key));

        Ok(())
    }

    #[test]
    fn zero_public_key_bytes_are_rejected() {
        assert_eq!(
            PublicKey::try_from(PublicKeyBytes::zero()),
            Err(Error::InvalidPublicKey),
        );
    }

    #[test]
    fn multi_verify_detects_a_single_bad_signature() {
        let secret_keys = [secret_key(1), secret_key(2)];
        let public_keys = secret_keys.each_ref().map(SecretKey::to_public_key);
        let messages = [MESSAGE, OTHER_MESSAGE];

        let good = [secret_keys[0].sign(MESSAGE), secret_keys[1].sign(OTHER_MESSAGE)];
        let bad = [secret_keys[0].sign(MESSAGE), secret_keys[1].sign(MESSAGE)];

        assert!(Signature::multi_verify(messages, &good, &public_keys));
        assert!(!Signature::multi_verify(messages, &bad, &public_keys));
    }

    #[test]
    fn secret_key_debug_output_is_redacted() {
        assert_eq!(format!("{:?}", secret_key(1)), "[REDACTED]");
    }

    #[test]
    fn secret_key_bytes_parse_from_hex() -> Result<(), hex::FromHexError> {
        let bytes = <SecretKeyBytes as hex::FromHex>::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )?;

        let parsed = SecretKey::try_from(bytes).expect("small nonzero scalars are valid");

        assert_eq!(parsed.to_public_key(), secret_key(1).to_public_key());

        Ok(())
    }

    fn secret_key(seed: u8) -> SecretKey {
        let mut bytes = SecretKeyBytes::default();
        bytes.bytes[31] = seed;

        SecretKey::try_from(bytes).expect("small nonzero scalars are valid secret keys")
    }
}
