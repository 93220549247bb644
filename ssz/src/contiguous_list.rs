use core::{
    fmt::Debug,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use derivative::Derivative;
use ethereum_types::H256;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use typenum::{Unsigned, U1};

use crate::{
    error::{IndexError, PushError, ReadError, WriteError},
    merkle_tree::{self, MerkleTree},
    porcelain::{SszHash, SszSize, SszWrite},
    shared,
    size::Size,
    type_level::MerkleElements,
};

/// SSZ list with at most `N` elements.
///
/// Dereferences to a slice rather than a `Vec` so that the limit cannot be bypassed.
#[derive(Derivative, Serialize)]
#[derivative(
    Clone(bound = "T: Clone"),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq"),
    Default(bound = ""),
    Debug(bound = "T: Debug", transparent = "true")
)]
#[serde(transparent)]
pub struct ContiguousList<T, N> {
    elements: Vec<T>,
    #[derivative(Debug = "ignore")]
    #[serde(skip)]
    phantom: PhantomData<N>,
}

impl<T, N> Deref for ContiguousList<T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.elements.as_slice()
    }
}

impl<T, N> DerefMut for ContiguousList<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.elements.as_mut_slice()
    }
}

impl<T, N: Unsigned> TryFrom<Vec<T>> for ContiguousList<T, N> {
    type Error = ReadError;

    fn try_from(elements: Vec<T>) -> Result<Self, Self::Error> {
        Self::validate_length(elements.len())?;

        Ok(Self {
            elements,
            phantom: PhantomData,
        })
    }
}

impl<T, N> IntoIterator for ContiguousList<T, N> {
    type Item = T;
    type IntoIter = <Vec<T> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'list, T, N> IntoIterator for &'list ContiguousList<T, N> {
    type Item = &'list T;
    type IntoIter = <&'list [T] as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de, T: Deserialize<'de>, N: Unsigned> Deserialize<'de> for ContiguousList<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::deserialize(deserializer)?
            .try_into()
            .map_err(D::Error::custom)
    }
}

impl<T, N> SszSize for ContiguousList<T, N> {
    const SIZE: Size = Size::Variable { minimum_size: 0 };
}

impl<T: SszWrite, N> SszWrite for ContiguousList<T, N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        shared::write_list(bytes, self)
    }
}

impl<T: SszHash + SszWrite, N: MerkleElements<T>> SszHash for ContiguousList<T, N> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let root = if T::PackingFactor::USIZE == 1 {
            let chunks = self.iter().map(SszHash::hash_tree_root);
            MerkleTree::<N::UnpackedMerkleTreeDepth>::merkleize_chunks(chunks)
        } else {
            MerkleTree::<N::PackedMerkleTreeDepth>::merkleize_packed(self)
        };

        merkle_tree::mix_in_length(root, self.len())
    }
}

impl<T, N: Unsigned> ContiguousList<T, N> {
    pub fn try_from_iter(elements: impl IntoIterator<Item = T>) -> Result<Self, ReadError> {
        elements.into_iter().collect::<Vec<_>>().try_into()
    }

    pub fn push(&mut self, element: T) -> Result<(), PushError> {
        if self.elements.len() >= N::USIZE {
            return Err(PushError::ListFull);
        }

        self.elements.push(element);

        Ok(())
    }

    pub fn get(&self, index: u64) -> Result<&T, IndexError> {
        let index = shared::validate_index(self.len(), index)?;
        Ok(&self.elements[index])
    }

    pub fn get_mut(&mut self, index: u64) -> Result<&mut T, IndexError> {
        let index = shared::validate_index(self.len(), index)?;
        Ok(&mut self.elements[index])
    }

    /// Removes all elements, keeping the allocation.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    const fn validate_length(actual: usize) -> Result<(), ReadError> {
        let maximum = N::USIZE;

        if actual > maximum {
            return Err(ReadError::ListTooLong { maximum, actual });
        }

        Ok(())
    }
}
