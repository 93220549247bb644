use core::{
    fmt::Debug,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use derivative::Derivative;
use ethereum_types::H256;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use typenum::{NonZero, Unsigned, U1};

use crate::{
    error::{ReadError, WriteError},
    merkle_tree::MerkleTree,
    porcelain::{SszHash, SszSize, SszWrite},
    shared,
    size::Size,
    type_level::MerkleElements,
};

/// SSZ vector with exactly `N` elements.
///
/// Elements are stored on the heap because the historical vectors in `BeaconState`
/// are too large for the stack with the mainnet preset.
#[derive(Derivative, Serialize)]
#[derivative(
    Clone(bound = "T: Clone"),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq"),
    Debug(bound = "T: Debug", transparent = "true")
)]
#[serde(bound(serialize = "T: Serialize"), transparent)]
pub struct ContiguousVector<T, N> {
    elements: Box<[T]>,
    #[derivative(Debug = "ignore")]
    #[serde(skip)]
    phantom: PhantomData<N>,
}

impl<T: Clone + Default, N: Unsigned> Default for ContiguousVector<T, N> {
    fn default() -> Self {
        Self::repeat_element(T::default())
    }
}

impl<T, N> Deref for ContiguousVector<T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.elements
    }
}

impl<T, N> DerefMut for ContiguousVector<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.elements
    }
}

impl<'vector, T, N> IntoIterator for &'vector ContiguousVector<T, N> {
    type Item = &'vector T;
    type IntoIter = <&'vector [T] as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de, T: Deserialize<'de>, N: Unsigned> Deserialize<'de> for ContiguousVector<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::<T>::deserialize(deserializer)?;
        Self::try_from_iter(elements).map_err(D::Error::custom)
    }
}

impl<T: SszSize, N: Unsigned> SszSize for ContiguousVector<T, N> {
    const SIZE: Size = T::SIZE.mul(N::USIZE);
}

impl<T: SszWrite, N: Unsigned> SszWrite for ContiguousVector<T, N> {
    fn write_fixed(&self, bytes: &mut [u8]) {
        shared::write_fixed_vector(bytes, self);
    }

    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        shared::write_list(bytes, self)
    }
}

impl<T, N> SszHash for ContiguousVector<T, N>
where
    T: SszHash + SszWrite,
    N: MerkleElements<T>,
{
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        if T::PackingFactor::USIZE == 1 {
            let chunks = self.iter().map(SszHash::hash_tree_root);
            MerkleTree::<N::UnpackedMerkleTreeDepth>::merkleize_chunks(chunks)
        } else {
            MerkleTree::<N::PackedMerkleTreeDepth>::merkleize_packed(self)
        }
    }
}

impl<T, N: Unsigned> ContiguousVector<T, N> {
    pub fn try_from_iter(elements: impl IntoIterator<Item = T>) -> Result<Self, ReadError> {
        let elements = elements.into_iter().collect::<Box<[T]>>();
        let expected = N::USIZE;
        let actual = elements.len();

        if actual != expected {
            return Err(ReadError::VectorSizeMismatch { expected, actual });
        }

        Ok(Self {
            elements,
            phantom: PhantomData,
        })
    }

    #[must_use]
    pub fn repeat_element(element: T) -> Self
    where
        T: Clone,
    {
        Self {
            elements: vec![element; N::USIZE].into_boxed_slice(),
            phantom: PhantomData,
        }
    }

    /// Accesses the vector as a ring buffer.
    ///
    /// Historical vectors in `BeaconState` are indexed by slot or epoch modulo their length.
    #[must_use]
    pub fn mod_index(&self, index: u64) -> &T
    where
        N: NonZero,
    {
        &self.elements[Self::reduce_index(index)]
    }

    pub fn mod_index_mut(&mut self, index: u64) -> &mut T
    where
        N: NonZero,
    {
        &mut self.elements[Self::reduce_index(index)]
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "the remainder is less than N::USIZE, which fits in usize"
    )]
    const fn reduce_index(index: u64) -> usize
    where
        N: NonZero,
    {
        (index % N::U64) as usize
    }
}
