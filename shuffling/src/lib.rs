//! Swap-or-not shuffle.
//!
//! Every round pairs index `i` with `(pivot - i) mod n` and swaps the pair if the bit selected by
//! the larger of the two is set. A round is an involution, so shuffling a whole slice amounts to
//! applying the rounds in reverse order to the slice.

use core::num::NonZeroU64;

use anyhow::Result;
use bit_field::BitArray as _;
use tap::TryConv as _;
use types::{phase0::primitives::H256, preset::Preset};

const BITS_PER_HASH: u64 = 256;

/// Permutes `slice` so that `slice[i]` ends up holding the element previously at
/// `shuffle_single(i, len, seed)`.
pub fn shuffle_slice<P: Preset, T>(slice: &mut [T], seed: H256) -> Result<()> {
    let Some(length) = slice.len().try_conv::<u64>().map(NonZeroU64::new)? else {
        return Ok(());
    };

    for round in (0..P::SHUFFLE_ROUND_COUNT).rev() {
        let pivot = compute_pivot(seed, round, length);
        let mut sources = SourceWindow::new(seed, round);

        for index in 0..length.get() {
            let flip = (pivot + length.get() - index) % length;

            // Each pair is visited twice. Only swap on the first visit.
            if flip <= index {
                continue;
            }

            if sources.bit(flip) {
                slice.swap(index.try_into()?, flip.try_into()?);
            }
        }
    }

    Ok(())
}

#[must_use]
pub fn shuffle_single<P: Preset>(mut index: u64, index_count: NonZeroU64, seed: H256) -> u64 {
    assert!(index < index_count.get());

    for round in 0..P::SHUFFLE_ROUND_COUNT {
        let pivot = compute_pivot(seed, round, index_count);
        let flip = (pivot + index_count.get() - index) % index_count;
        let position = index.max(flip);

        if SourceWindow::new(seed, round).bit(position) {
            index = flip;
        }
    }

    index
}

// Consecutive positions share a source hash. Remember the last one to avoid rehashing.
struct SourceWindow {
    seed: H256,
    round: u8,
    current: Option<(u64, H256)>,
}

impl SourceWindow {
    const fn new(seed: H256, round: u8) -> Self {
        Self {
            seed,
            round,
            current: None,
        }
    }

    fn bit(&mut self, position: u64) -> bool {
        let window = position / BITS_PER_HASH;

        let source = match self.current {
            Some((cached_window, source)) if cached_window == window => source,
            _ => {
                let source = compute_source(self.seed, self.round, window);
                self.current = Some((window, source));
                source
            }
        };

        source
            .as_bytes()
            .get_bit(position.to_le_bytes()[0].into())
    }
}

fn compute_pivot(seed: H256, round: u8, index_count: NonZeroU64) -> u64 {
    let mut bytes = [0; size_of::<u64>()];
    bytes.copy_from_slice(&hashing::hash_256_8(seed, round)[..size_of::<u64>()]);
    u64::from_le_bytes(bytes) % index_count
}

fn compute_source(seed: H256, round: u8, window: u64) -> H256 {
    // The window is truncated to 4 bytes before hashing.
    let window = window.to_le_bytes();
    let window = u32::from_le_bytes([window[0], window[1], window[2], window[3]]);
    hashing::hash_256_8_32(seed, round, window)
}
