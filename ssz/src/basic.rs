use byteorder::ByteOrder as _;
use ethereum_types::H256;
use typenum::{U32, U4, U8};

use crate::{
    consts::Endianness,
    porcelain::{SszHash, SszSize, SszWrite},
    size::Size,
};

// Basic values are packed into chunks, so their roots are their serializations padded to 32 bytes.
macro_rules! impl_for_basic_type {
    ($type:ty, $packing_factor:ty, |$value:ident, $bytes:ident| $write:expr) => {
        impl SszSize for $type {
            const SIZE: Size = Size::Fixed {
                size: size_of::<Self>(),
            };
        }

        impl SszWrite for $type {
            #[inline]
            fn write_fixed(&self, $bytes: &mut [u8]) {
                let $value = *self;
                $write
            }
        }

        impl SszHash for $type {
            type PackingFactor = $packing_factor;

            #[inline]
            fn hash_tree_root(&self) -> H256 {
                let mut hash = H256::zero();
                self.write_fixed(&mut hash.as_bytes_mut()[..size_of::<Self>()]);
                hash
            }
        }
    };
}

impl_for_basic_type!(bool, U32, |value, bytes| bytes[0] = value.into());
impl_for_basic_type!(u8, U32, |value, bytes| bytes[0] = value);
impl_for_basic_type!(u32, U8, |value, bytes| Endianness::write_u32(bytes, value));
impl_for_basic_type!(u64, U4, |value, bytes| Endianness::write_u64(bytes, value));
