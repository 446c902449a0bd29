// ── Cursor-based binary reader ──

use bytemuck::Pod;

/// Bounds-checked reader over an untrusted byte buffer.
///
/// Records are copied out with `pod_read_unaligned`, so the buffer needs no
/// particular alignment. Reads past the end return `None` and leave the
/// position untouched.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Cursor positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    pub fn read<T: Pod>(&mut self) -> Option<T> {
        self.read_bytes(std::mem::size_of::<T>()).map(bytemuck::pod_read_unaligned)
    }

    /// Read `count` consecutive records.
    pub fn read_array<T: Pod>(&mut self, count: usize) -> Option<Vec<T>> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(count.checked_mul(size)?)?;
        Some(bytes.chunks_exact(size).map(bytemuck::pod_read_unaligned).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_native_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&7i32.to_ne_bytes());
        data.extend_from_slice(&1.5f32.to_ne_bytes());
        let mut c = Cursor::new(&data);
        assert_eq!(c.read::<i32>(), Some(7));
        assert_eq!(c.read::<f32>(), Some(1.5));
        assert_eq!(c.read::<u8>(), None);
    }

    #[test]
    fn test_read_unaligned_offset() {
        let mut data = vec![0xAA];
        data.extend_from_slice(&0x1234u16.to_ne_bytes());
        data.extend_from_slice(&0x5678u16.to_ne_bytes());
        let mut c = Cursor::at(&data, 1);
        assert_eq!(c.read_array::<u16>(2), Some(vec![0x1234, 0x5678]));
    }

    #[test]
    fn test_short_read_keeps_position() {
        let data = [1u8, 2, 3];
        let mut c = Cursor::new(&data);
        assert_eq!(c.read::<u32>(), None);
        assert_eq!(c.read_array::<u16>(2), None);
        assert_eq!(c.read_bytes(3), Some(&data[..]));
    }

    #[test]
    fn test_offset_past_end() {
        let data = [0u8; 4];
        let mut c = Cursor::at(&data, 10);
        assert_eq!(c.read::<u8>(), None);
        assert_eq!(c.read_bytes(0), None);
    }
}
