use easy_ext::ext;
use typenum::{NonZero, Unsigned};

// Slot and epoch arithmetic divides by preset values that are only known as `typenum` types.
// The `NonZero` bounds rule out division by zero at compile time.

#[ext(U64Ext)]
pub impl u64 {
    #[inline]
    #[must_use]
    fn div_typenum<N: Unsigned + NonZero>(self) -> Self {
        self / N::U64
    }

    #[inline]
    #[must_use]
    fn mod_typenum<N: Unsigned + NonZero>(self) -> Self {
        self % N::U64
    }

    #[inline]
    #[must_use]
    fn is_multiple_of_typenum<N: Unsigned + NonZero>(self) -> bool {
        self.mod_typenum::<N>() == 0
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use typenum::{U32, U8};

    use super::*;

    #[test_case(0, 0, 0)]
    #[test_case(31, 0, 31)]
    #[test_case(32, 1, 0)]
    #[test_case(65, 2, 1)]
    fn division_by_32_splits_slot_into_epoch_and_offset(slot: u64, epoch: u64, offset: u64) {
        assert_eq!(slot.div_typenum::<U32>(), epoch);
        assert_eq!(slot.mod_typenum::<U32>(), offset);
        assert_eq!(epoch * 32 + offset, slot);
    }

    #[test_case(0 => true)]
    #[test_case(7 => false)]
    #[test_case(8 => true)]
    #[test_case(24 => true)]
    fn is_multiple_of_typenum_detects_epoch_boundaries(slot: u64) -> bool {
        slot.is_multiple_of_typenum::<U8>()
    }
}
