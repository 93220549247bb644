// Chunks are pushed into the tree left to right. Only one node per level needs to be remembered:
// the left sibling of the next node at that level. The rest of the tree is either not yet known
// or made up of zero hashes.
//
// ```text
// height 2           0                   1
//               ┌────┴────┐         ┌────┴────┐
// height 1      0         1         2         3
//             ┌─┴─┐     ┌─┴─┐     ┌─┴─┐     ┌─┴─┐
// height 0    0   1     2   3     4   5     6   7
// ```

use bit_field::BitField as _;
use derivative::Derivative;
use ethereum_types::H256;
use generic_array::{ArrayLength, GenericArray};
use hashing::ZERO_HASHES;
use typenum::Unsigned as _;

use crate::{
    consts::BYTES_PER_CHUNK,
    porcelain::{SszHash, SszWrite},
};

#[derive(Derivative)]
#[derivative(Clone(bound = ""), Default(bound = ""), Debug(bound = ""))]
pub struct MerkleTree<D: ArrayLength<H256>> {
    // Entries that have not been written yet are meaningless and never read.
    sibling_hashes: GenericArray<H256, D>,
}

impl<D: ArrayLength<H256>> MerkleTree<D> {
    pub fn merkleize_bytes(bytes: impl AsRef<[u8]>) -> H256 {
        let chunks = bytes.as_ref().chunks(BYTES_PER_CHUNK).map(|partial_chunk| {
            let mut chunk = H256::zero();
            chunk[..partial_chunk.len()].copy_from_slice(partial_chunk);
            chunk
        });

        Self::merkleize_chunks(chunks)
    }

    pub fn merkleize_packed<T: SszHash + SszWrite>(values: &[T]) -> H256 {
        let size = T::SIZE.fixed_part();

        let chunks = values.chunks(T::PackingFactor::USIZE).map(|pack| {
            let mut chunk = H256::zero();

            chunk
                .as_bytes_mut()
                .chunks_exact_mut(size)
                .zip(pack)
                .for_each(|(destination, value)| value.write_fixed(destination));

            chunk
        });

        Self::merkleize_chunks(chunks)
    }

    pub fn merkleize_chunks(
        chunks: impl IntoIterator<
            IntoIter = impl DoubleEndedIterator<Item = H256> + ExactSizeIterator<Item = H256>,
        >,
    ) -> H256 {
        let mut chunks = chunks.into_iter();

        match chunks.next_back() {
            Some(last_chunk) => {
                let last_index = chunks.len();

                let mut merkle_tree = Self::default();

                for (index, chunk) in chunks.enumerate() {
                    merkle_tree.push(index, chunk);
                }

                merkle_tree.push_and_compute_root(last_index, last_chunk)
            }
            None => ZERO_HASHES[D::USIZE],
        }
    }

    /// Adds the chunk at `index` to the tree.
    ///
    /// Returns the height of the node that was stored and the hash stored in it.
    /// Chunks must be pushed in order starting from index 0.
    pub fn push(&mut self, index: usize, chunk: H256) -> (usize, H256) {
        assert!(index < 1 << D::USIZE);

        // Every left sibling below this height is completed by the chunk.
        let height_to_update = binary_carry_sequence(index);

        let mut hash = chunk;

        for height in 0..height_to_update {
            hash = hashing::hash_256_256(self.sibling_hashes[height], hash);
        }

        if height_to_update < D::USIZE {
            self.sibling_hashes[height_to_update] = hash;
        }

        (height_to_update, hash)
    }

    /// Adds the last chunk to the tree and computes the root,
    /// treating all chunks past `index` as zero.
    pub fn push_and_compute_root(&mut self, index: usize, chunk: H256) -> H256 {
        let (updated_height, mut hash) = self.push(index, chunk);

        for height in updated_height..D::USIZE {
            // The node at `updated_height` is a left child because its index has a trailing zero.
            if index.get_bit(height) {
                hash = hashing::hash_256_256(self.sibling_hashes[height], hash);
            } else {
                hash = hashing::hash_256_256(hash, ZERO_HASHES[height]);
            }
        }

        hash
    }

    /// Constructs a branch proving the inclusion of `chunks[index]`.
    ///
    /// Chunks past the end of `chunks` are treated as zero.
    /// Returns `None` if `index` is out of bounds or too many chunks are passed.
    #[must_use]
    pub fn construct_proof(chunks: &[H256], index: usize) -> Option<Vec<H256>> {
        if index >= chunks.len() || chunks.len() > 1 << D::USIZE {
            return None;
        }

        let mut level = chunks.to_vec();
        let mut position = index;
        let mut proof = Vec::with_capacity(D::USIZE);

        for zero_hash in ZERO_HASHES.into_iter().take(D::USIZE) {
            proof.push(level.get(position ^ 1).copied().unwrap_or(zero_hash));

            level = level
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or(zero_hash);
                    hashing::hash_256_256(pair[0], right)
                })
                .collect();

            position /= 2;
        }

        Some(proof)
    }
}

#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    let mut length_chunk = H256::zero();
    length_chunk[..size_of::<usize>()].copy_from_slice(&length.to_le_bytes());
    hashing::hash_256_256(root, length_chunk)
}

// Number of trailing ones in `index`, also known as the binary carry sequence.
fn binary_carry_sequence(index: usize) -> usize {
    (index + 1)
        .trailing_zeros()
        .try_into()
        .expect("number of bits in usize should fit in usize")
}
