#![expect(clippy::module_name_repetitions)]

use anyhow::{ensure, Result};
use bls::{PublicKey, PublicKeyBytes, Signature, SignatureBytes};
use derive_more::Constructor;
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};
use types::phase0::primitives::H256;

use crate::error::{Error, SignatureKind};

/// Strategy for checking signatures encountered during a state transition.
pub trait Verifier {
    const IS_NULL: bool;

    fn reserve(&mut self, additional: usize);

    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_key_bytes: PublicKeyBytes,
        signature_kind: SignatureKind,
    ) -> Result<()>;

    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        signature_kind: SignatureKind,
    ) -> Result<()>;

    fn finish(&self) -> Result<()>;
}

impl<V: Verifier> Verifier for &mut V {
    const IS_NULL: bool = V::IS_NULL;

    #[inline]
    fn reserve(&mut self, additional: usize) {
        (*self).reserve(additional)
    }

    #[inline]
    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_key_bytes: PublicKeyBytes,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        (*self).verify_singular(message, signature_bytes, public_key_bytes, signature_kind)
    }

    #[inline]
    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        (*self).extend(triples, signature_kind)
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        (**self).finish()
    }
}

/// Accepts every signature. Used when replaying blocks that have already been validated.
pub struct NullVerifier;

impl Verifier for NullVerifier {
    const IS_NULL: bool = true;

    #[inline]
    fn reserve(&mut self, _additional: usize) {}

    #[inline]
    fn verify_singular(
        &mut self,
        _message: H256,
        _signature_bytes: SignatureBytes,
        _public_key_bytes: PublicKeyBytes,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn extend(
        &mut self,
        _triples: impl IntoIterator<Item = Triple>,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Verifies every signature as soon as it is submitted.
pub struct SingleVerifier;

impl Verifier for SingleVerifier {
    const IS_NULL: bool = false;

    #[inline]
    fn reserve(&mut self, _additional: usize) {}

    #[inline]
    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_key_bytes: PublicKeyBytes,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        let public_key = PublicKey::try_from(public_key_bytes)?;
        let triple = Triple::new(message, signature_bytes, public_key);
        self.extend(core::iter::once(triple), signature_kind)
    }

    #[inline]
    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        for triple in triples {
            let Triple {
                message,
                signature_bytes,
                public_key,
            } = triple;

            // Bytes that do not decode to a signature are reported the same way as a mismatch.
            let is_valid = Signature::try_from(signature_bytes)
                .is_ok_and(|signature| signature.verify(message, &public_key));

            ensure!(is_valid, Error::SignatureInvalid(signature_kind));
        }

        Ok(())
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Collects signatures and verifies all of them at once in [`Verifier::finish`].
///
/// A failure cannot be attributed to a particular signature.
/// It is reported with the kind shared by all collected signatures,
/// or [`SignatureKind::Multi`] if their kinds differ.
#[derive(Default)]
pub struct MultiVerifier {
    triples: Vec<Triple>,
    signature_kind: Option<SignatureKind>,
}

impl MultiVerifier {
    fn record_kind(&mut self, signature_kind: SignatureKind) {
        self.signature_kind = match self.signature_kind {
            Some(recorded) if recorded != signature_kind => Some(SignatureKind::Multi),
            _ => Some(signature_kind),
        };
    }
}

impl Verifier for MultiVerifier {
    const IS_NULL: bool = false;

    #[inline]
    fn reserve(&mut self, additional: usize) {
        self.triples.reserve_exact(additional);
    }

    #[inline]
    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_key_bytes: PublicKeyBytes,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        let public_key = PublicKey::try_from(public_key_bytes)?;
        let triple = Triple::new(message, signature_bytes, public_key);
        self.triples.push(triple);
        self.record_kind(signature_kind);
        Ok(())
    }

    #[inline]
    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        let length_before = self.triples.len();

        self.triples.extend(triples);

        if self.triples.len() > length_before {
            self.record_kind(signature_kind);
        }

        Ok(())
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        if self.triples.is_empty() {
            return Ok(());
        }

        let signature_kind = self.signature_kind.unwrap_or(SignatureKind::Multi);
        let messages = self.triples.iter().map(|triple| triple.message.as_bytes());

        let signatures = self
            .triples
            .par_iter()
            .map(|triple| Signature::try_from(triple.signature_bytes))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::SignatureInvalid(signature_kind))?;

        let public_keys = self.triples.iter().map(|triple| &triple.public_key);

        ensure!(
            Signature::multi_verify(messages, signatures.iter(), public_keys),
            Error::SignatureInvalid(signature_kind),
        );

        Ok(())
    }
}

#[derive(Clone, Copy, Constructor)]
pub struct Triple {
    message: H256,
    signature_bytes: SignatureBytes,
    public_key: PublicKey,
}

#[cfg(test)]
mod tests {
    use bls::{SecretKey, SecretKeyBytes};

    use super::*;

    fn secret_key(seed: u8) -> SecretKey {
        let mut bytes = [0; 32];
        bytes[31] = seed;

        SecretKey::try_from(SecretKeyBytes::from(bytes))
            .expect("small nonzero scalars are valid secret keys")
    }

    fn signed(seed: u8, message: H256) -> (SignatureBytes, PublicKeyBytes) {
        let secret_key = secret_key(seed);
        let signature = secret_key.sign(message).into();
        let public_key = secret_key.to_public_key().into();
        (signature, public_key)
    }

    fn signature_kind(result: Result<()>) -> Option<SignatureKind> {
        match result.err()?.downcast::<Error>().ok()? {
            Error::SignatureInvalid(signature_kind) => Some(signature_kind),
            _ => None,
        }
    }

    #[test]
    fn single_verifier_accepts_valid_signature() -> Result<()> {
        let message = H256::repeat_byte(1);
        let (signature, public_key) = signed(1, message);

        SingleVerifier.verify_singular(message, signature, public_key, SignatureKind::Block)
    }

    #[test]
    fn single_verifier_rejects_signature_by_other_key() {
        let message = H256::repeat_byte(1);
        let (signature, _) = signed(1, message);
        let (_, public_key) = signed(2, message);

        let result =
            SingleVerifier.verify_singular(message, signature, public_key, SignatureKind::Block);

        assert_eq!(signature_kind(result), Some(SignatureKind::Block));
    }

    #[test]
    fn single_verifier_rejects_malformed_signature() {
        let message = H256::repeat_byte(1);
        let (_, public_key) = signed(1, message);

        let result = SingleVerifier.verify_singular(
            message,
            SignatureBytes::zero(),
            public_key,
            SignatureKind::Deposit,
        );

        assert_eq!(signature_kind(result), Some(SignatureKind::Deposit));
    }

    #[test]
    fn null_verifier_accepts_anything() -> Result<()> {
        let mut verifier = NullVerifier;

        verifier.verify_singular(
            H256::zero(),
            SignatureBytes::zero(),
            PublicKeyBytes::zero(),
            SignatureKind::Block,
        )?;

        verifier.finish()
    }

    #[test]
    fn multi_verifier_defers_to_finish() -> Result<()> {
        let first_message = H256::repeat_byte(1);
        let second_message = H256::repeat_byte(2);
        let (first_signature, first_public_key) = signed(1, first_message);
        let (second_signature, second_public_key) = signed(2, second_message);

        let mut valid = MultiVerifier::default();
        valid.verify_singular(first_message, first_signature, first_public_key, SignatureKind::Block)?;
        valid.verify_singular(second_message, second_signature, second_public_key, SignatureKind::Block)?;
        valid.finish()?;

        let mut invalid = MultiVerifier::default();
        invalid.verify_singular(first_message, second_signature, first_public_key, SignatureKind::Block)?;
        invalid.verify_singular(second_message, first_signature, second_public_key, SignatureKind::Deposit)?;

        assert_eq!(signature_kind(invalid.finish()), Some(SignatureKind::Multi));

        Ok(())
    }

    #[test]
    fn multi_verifier_reports_kind_shared_by_all_signatures() -> Result<()> {
        let message = H256::repeat_byte(1);
        let (signature, _) = signed(1, message);
        let (_, public_key) = signed(2, message);

        let mut verifier = MultiVerifier::default();
        verifier.verify_singular(message, signature, public_key, SignatureKind::Block)?;
        verifier.verify_singular(message, signature, public_key, SignatureKind::Block)?;

        assert_eq!(signature_kind(verifier.finish()), Some(SignatureKind::Block));

        Ok(())
    }

    #[test]
    fn mutable_reference_delegates() {
        let message = H256::repeat_byte(3);
        let (_, public_key) = signed(3, message);
        let mut verifier = SingleVerifier;

        let result = (&mut verifier).verify_singular(
            message,
            SignatureBytes::empty(),
            public_key,
            SignatureKind::Block,
        );

        assert_eq!(signature_kind(result), Some(SignatureKind::Block));
    }
}
