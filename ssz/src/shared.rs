use crate::{
    consts::{Offset, BYTES_PER_LENGTH_OFFSET},
    error::{IndexError, WriteError},
    porcelain::SszWrite,
    size::Size,
};

#[inline]
pub fn write_offset(bytes: &mut [u8], destination: usize, offset: usize) -> Result<(), WriteError> {
    let offset = Offset::try_from(offset).map_err(|_| WriteError::OffsetTooBig { offset })?;
    offset.write_fixed(&mut bytes[destination..destination + BYTES_PER_LENGTH_OFFSET]);
    Ok(())
}

#[inline]
pub fn write_fixed_vector<'elements, T: SszWrite + 'elements>(
    bytes: &mut [u8],
    elements: impl IntoIterator<Item = &'elements T>,
) {
    let size = T::SIZE.fixed_part();

    for (element, subslice) in elements.into_iter().zip(bytes.chunks_exact_mut(size)) {
        element.write_fixed(subslice);
    }
}

/// Appends `elements` to `bytes`.
///
/// Variable-size elements are preceded by a table of offsets relative to the start of the list.
#[inline]
pub fn write_list<'elements, T: SszWrite + 'elements>(
    bytes: &mut Vec<u8>,
    elements: impl IntoIterator<IntoIter = impl ExactSizeIterator<Item = &'elements T>>,
) -> Result<(), WriteError> {
    let elements = elements.into_iter();
    let element_count = elements.len();
    let length_before = bytes.len();

    if let Size::Fixed { size } = T::SIZE {
        bytes.resize(length_before + element_count * size, 0);
        write_fixed_vector(&mut bytes[length_before..], elements);
    } else {
        bytes.resize(length_before + element_count * BYTES_PER_LENGTH_OFFSET, 0);

        for (index, element) in elements.enumerate() {
            let destination = length_before + index * BYTES_PER_LENGTH_OFFSET;
            let offset = bytes.len() - length_before;

            write_offset(bytes, destination, offset)?;

            element.write_variable(bytes)?;
        }
    }

    Ok(())
}

pub fn validate_index(length: usize, index: u64) -> Result<usize, IndexError> {
    let index = index
        .try_into()
        .map_err(|_| IndexError::DoesNotFitInUsize { index })?;

    if length <= index {
        return Err(IndexError::OutOfBounds { length, index });
    }

    Ok(index)
}
