use types::phase0::{containers::Validator, primitives::{Epoch, H256}};

#[must_use]
pub const fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

/// Checks that `leaf` is at position `index` in a tree of height `depth` with root `root`.
///
/// `branch` must contain at least `depth` sibling hashes ordered from the leaf up.
/// Hashes past `depth` are ignored.
#[must_use]
pub fn is_valid_merkle_branch(
    leaf: H256,
    branch: impl IntoIterator<Item = H256>,
    depth: u64,
    index: u64,
    root: H256,
) -> bool {
    let mut hash = leaf;
    let mut height = 0;

    for node in branch.into_iter().take(depth.try_into().unwrap_or(usize::MAX)) {
        let is_right_child = index.checked_shr(height).is_some_and(|shifted| shifted & 1 == 1);

        if is_right_child {
            hash = hashing::hash_256_256(node, hash);
        } else {
            hash = hashing::hash_256_256(hash, node);
        }

        height += 1;
    }

    u64::from(height) == depth && hash == root
}
