// These are re-exported primarily to make `ssz_derive` work without additional dependencies.
pub use ethereum_types::H256;
pub use hashing;
pub use ssz_derive::Ssz;
pub use typenum::U1;

pub use crate::{
    bit_list::BitList,
    consts::{Endianness, Offset, BYTES_PER_CHUNK, BYTES_PER_LENGTH_OFFSET},
    contiguous_list::ContiguousList,
    contiguous_vector::ContiguousVector,
    error::{IndexError, PushError, ReadError, WriteError},
    merkle_tree::{mix_in_length, MerkleTree},
    porcelain::{SignedRoot, SszHash, SszSize, SszWrite},
    shared::write_offset,
    size::Size,
    type_level::{BytesToDepth, MerkleBits, MerkleElements},
};

mod arrays;
mod basic;
mod bit_list;
mod consts;
mod contiguous_list;
mod contiguous_vector;
mod error;
mod merkle_tree;
mod porcelain;
mod shared;
mod size;
mod type_level;
