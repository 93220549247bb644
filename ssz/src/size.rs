use crate::consts::BYTES_PER_LENGTH_OFFSET;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Size {
    Fixed { size: usize },
    Variable { minimum_size: usize },
}

impl Size {
    /// Size of a container with fields of the given sizes.
    ///
    /// Variable-size fields contribute an offset to the fixed part.
    #[must_use]
    pub const fn for_container<const N: usize>(field_sizes: [Self; N]) -> Self {
        let mut fixed_part = 0;
        let mut minimum_size = 0;
        let mut is_variable = false;
        let mut index = 0;

        while index < N {
            match field_sizes[index] {
                Self::Fixed { size } => {
                    fixed_part += size;
                    minimum_size += size;
                }
                Self::Variable {
                    minimum_size: minimum_field_size,
                } => {
                    is_variable = true;
                    minimum_size += BYTES_PER_LENGTH_OFFSET + minimum_field_size;
                }
            }

            index += 1;
        }

        if is_variable {
            Self::Variable { minimum_size }
        } else {
            Self::Fixed { size: fixed_part }
        }
    }

    /// Number of bytes a value of this size occupies in the fixed part of a container.
    #[must_use]
    pub const fn fixed_part(self) -> usize {
        match self {
            Self::Fixed { size } => size,
            Self::Variable { .. } => BYTES_PER_LENGTH_OFFSET,
        }
    }

    /// Size of a vector of `length` elements of this size.
    #[must_use]
    pub const fn mul(self, length: usize) -> Self {
        match self {
            Self::Fixed { size } => Self::Fixed {
                size: size * length,
            },
            Self::Variable { minimum_size } => Self::Variable {
                minimum_size: (BYTES_PER_LENGTH_OFFSET + minimum_size) * length,
            },
        }
    }
}
