use ethereum_types::H256;
use typenum::{Logarithm2, NonZero, Unsigned};

use crate::{error::WriteError, size::Size};

pub trait SszSize {
    const SIZE: Size;
}

pub trait SszWrite: SszSize {
    // Fixed-size types implement `write_fixed`, variable-size types implement `write_variable`.
    fn write_fixed(&self, _bytes: &mut [u8]) {
        panic!("SszWrite::write_fixed must be implemented for fixed-size types");
    }

    fn write_variable(&self, _bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        panic!("SszWrite::write_variable must be implemented for variable-size types");
    }

    fn to_ssz(&self) -> Result<Vec<u8>, WriteError> {
        match Self::SIZE {
            Size::Fixed { size } => {
                let mut bytes = vec![0; size];
                self.write_fixed(bytes.as_mut_slice());
                Ok(bytes)
            }
            Size::Variable { minimum_size } => {
                let mut bytes = Vec::with_capacity(minimum_size);
                self.write_variable(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

pub trait SszHash {
    /// Number of values that fit in a single 32 byte chunk.
    ///
    /// This is 1 for everything except basic types.
    type PackingFactor: Unsigned + NonZero + Logarithm2;

    fn hash_tree_root(&self) -> H256;
}

/// Root of a container with its signature field left out.
///
/// Signatures are computed over this rather than over [`SszHash::hash_tree_root`]
/// because a signature cannot sign itself.
/// Implemented by `#[derive(Ssz)]` for containers with a field marked `#[ssz(signature)]`.
pub trait SignedRoot: SszHash {
    fn signed_root(&self) -> H256;
}
