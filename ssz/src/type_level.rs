// Merkle tree depths are computed at the type level from collection limits.
// This is the best we can do until feature `generic_const_exprs` is stabilized.

use core::ops::{Add, Shr, Sub};

use ethereum_types::H256;
use generic_array::ArrayLength;
use typenum::{op, Diff, Len, Length, Log2, Min, Minimum, Sub1, Sum, Unsigned, B1, U3, U31, U5, U7};

use crate::porcelain::SszHash;

/// Limits of lists and lengths of vectors with elements of type `T`.
///
/// `UnpackedMerkleTreeDepth` is the depth of the tree when every element takes up a chunk.
/// `PackedMerkleTreeDepth` is the depth when multiple elements are packed into a chunk.
pub trait MerkleElements<T>: Unsigned {
    type UnpackedMerkleTreeDepth: ArrayLength<H256>;
    type PackedMerkleTreeDepth: ArrayLength<H256>;
}

impl<T, N> MerkleElements<T> for N
where
    T: SszHash,
    N: Sub<B1> + Unsigned,
    Sub1<Self>: Len,
    ChunksToDepth<Self>: ArrayLength<H256>
        + Min<Log2<T::PackingFactor>>
        + Sub<Minimum<ChunksToDepth<Self>, Log2<T::PackingFactor>>>,
    Diff<ChunksToDepth<Self>, Minimum<ChunksToDepth<Self>, Log2<T::PackingFactor>>>:
        ArrayLength<H256>,
{
    type UnpackedMerkleTreeDepth = ChunksToDepth<Self>;
    type PackedMerkleTreeDepth =
        Diff<ChunksToDepth<Self>, Minimum<ChunksToDepth<Self>, Log2<T::PackingFactor>>>;
}

/// Limits of bit lists.
pub trait MerkleBits: Unsigned {
    type MerkleTreeDepth: ArrayLength<H256>;
}

impl<N> MerkleBits for N
where
    Self: Add<U7> + Unsigned,
    Sum<Self, U7>: Shr<U3>,
    BitsToBytes<Self>: Add<U31>,
    Sum<BitsToBytes<Self>, U31>: Shr<U5>,
    BitsToChunks<Self>: Sub<B1>,
    Sub1<BitsToChunks<Self>>: Len,
    BitsToDepth<Self>: ArrayLength<H256>,
{
    type MerkleTreeDepth = BitsToDepth<Self>;
}

type BitsToBytes<N> = op!((N + U7) >> U3);

type BytesToChunks<N> = op!((N + U31) >> U5);

type ChunksToDepth<N> = Length<Sub1<N>>;

type BitsToChunks<N> = BytesToChunks<BitsToBytes<N>>;

type BitsToDepth<N> = ChunksToDepth<BitsToChunks<N>>;

/// Depth of the tree formed by splitting `N` bytes into chunks.
pub type BytesToDepth<N> = ChunksToDepth<BytesToChunks<N>>;
