use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use bit_field::BitArray as _;
use bitvec::{boxed::BitBox, vec::BitVec};
use derivative::Derivative;
use derive_more::{Deref, DerefMut};
use ethereum_types::H256;
use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use typenum::{Unsigned, U1};

use crate::{
    consts::BITS_PER_BYTE,
    error::{ReadError, WriteError},
    merkle_tree::{self, MerkleTree},
    porcelain::{SszHash, SszSize, SszWrite},
    size::Size,
    type_level::MerkleBits,
};

/// SSZ bit list with at most `N` bits.
///
/// Used for attestation aggregation bits, where bit `i` is set if the `i`th member of the
/// committee participated.
#[derive(Deref, DerefMut, Derivative)]
#[derivative(Clone(bound = ""), PartialEq(bound = ""), Eq(bound = ""), Default(bound = ""))]
pub struct BitList<N> {
    // `bitvec::order::Lsb0` is the default bit ordering, which matches SSZ.
    // Bits in the last byte past the length are always zero.
    #[deref]
    #[deref_mut]
    bits: BitBox<u8>,
    #[derivative(PartialEq = "ignore")]
    phantom: PhantomData<N>,
}

impl<N> Debug for BitList<N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.write_str("0b")?;

        for bit in self.iter().by_vals() {
            formatter.write_str(if bit { "1" } else { "0" })?;
        }

        Ok(())
    }
}

// Serialized as the hex encoding of the SSZ representation, including the delimiting bit.
impl<N> Serialize for BitList<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut ssz_bytes = vec![];

        self.write_variable(&mut ssz_bytes)
            .map_err(S::Error::custom)?;

        serializer.collect_str(&format_args!("0x{}", hex::encode(ssz_bytes)))
    }
}

impl<'de, N: Unsigned> Deserialize<'de> for BitList<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let digits = string.strip_prefix("0x").unwrap_or(&string);
        let bytes = hex::decode(digits).map_err(D::Error::custom)?;
        Self::from_ssz_bytes(bytes).map_err(D::Error::custom)
    }
}

impl<N> SszSize for BitList<N> {
    const SIZE: Size = Size::Variable { minimum_size: 1 };
}

impl<N> SszWrite for BitList<N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length_before = bytes.len();
        let length_after = length_before + bytes_with_delimiting_bit(self.len());

        bytes.resize(length_after, 0);

        let new_bytes = &mut bytes[length_before..];

        new_bytes[..bytes_without_delimiting_bit(self.len())].copy_from_slice(self.as_raw_slice());
        new_bytes.set_bit(self.len(), true);

        Ok(())
    }
}

impl<N: MerkleBits> SszHash for BitList<N> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let root = MerkleTree::<N::MerkleTreeDepth>::merkleize_bytes(self.as_raw_slice());
        merkle_tree::mix_in_length(root, self.len())
    }
}

impl<N: Unsigned> BitList<N> {
    pub fn with_length(length: usize) -> Result<Self, ReadError> {
        Self::validate_length(length)?;

        let mut bits = BitVec::new();
        bits.resize(length, false);

        Ok(Self::from_bit_vec(bits))
    }

    pub fn try_from_iter(bits: impl IntoIterator<Item = bool>) -> Result<Self, ReadError> {
        let bits = bits.into_iter().collect::<BitVec<u8>>();
        Self::validate_length(bits.len())?;
        Ok(Self::from_bit_vec(bits))
    }

    fn from_ssz_bytes(mut bytes: Vec<u8>) -> Result<Self, ReadError> {
        let length = Self::measure_length(bytes.as_slice())?;
        bytes.truncate(bytes_without_delimiting_bit(length));

        let mut bits = BitVec::from_vec(bytes);
        bits.truncate(length);

        Ok(Self::from_bit_vec(bits))
    }

    fn measure_length(bytes: &[u8]) -> Result<usize, ReadError> {
        let leading_zeros_in_last_byte = bytes
            .last()
            .ok_or(ReadError::BitListEmptySlice)?
            .leading_zeros()
            .try_into()
            .expect("number of bits in a byte should fit in usize");

        let data_bits_in_last_byte = (BITS_PER_BYTE - 1)
            .checked_sub(leading_zeros_in_last_byte)
            .ok_or(ReadError::BitListNoDelimitingBit)?;

        let actual = (bytes.len() - 1) * BITS_PER_BYTE + data_bits_in_last_byte;

        Self::validate_length(actual)?;

        Ok(actual)
    }

    const fn validate_length(actual: usize) -> Result<(), ReadError> {
        let maximum = N::USIZE;

        if actual > maximum {
            return Err(ReadError::BitListTooLong { maximum, actual });
        }

        Ok(())
    }

    fn from_bit_vec(bits: BitVec<u8>) -> Self {
        let mut bits = bits.into_boxed_bitslice();

        bits.fill_uninitialized(false);

        Self {
            bits,
            phantom: PhantomData,
        }
    }
}

const fn bytes_without_delimiting_bit(length: usize) -> usize {
    length.div_ceil(BITS_PER_BYTE)
}

const fn bytes_with_delimiting_bit(length: usize) -> usize {
    length.saturating_add(1).div_ceil(BITS_PER_BYTE)
}
