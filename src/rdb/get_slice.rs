use crate::rdb::RdbError;

/// Borrows `len` bytes starting at `cursor`.
pub fn get_buffer_slice(buffer: &[u8], cursor: usize, len: usize) -> Result<&[u8], RdbError> {
    cursor
        .checked_add(len)
        .and_then(|end| buffer.get(cursor..end))
        .ok_or(RdbError::Truncated { offset: cursor })
}

/// Copies exactly `N` bytes starting at `cursor`, for fixed-width integers.
pub fn get_buffer_array<const N: usize>(buffer: &[u8], cursor: usize) -> Result<[u8; N], RdbError> {
    let mut array = [0; N];
    array.copy_from_slice(get_buffer_slice(buffer, cursor, N)?);

    Ok(array)
}
