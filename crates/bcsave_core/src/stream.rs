use thiserror::Error;

const I32_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of data at byte {position}: need {needed} bytes, {remaining} remaining")]
    OutOfBounds {
        position: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("seek to byte {target} is past the end of a {len}-byte buffer")]
    SeekOutOfBounds { target: usize, len: usize },
    #[error("negative count {value} for {field} at byte {position}")]
    NegativeCount {
        field: &'static str,
        value: i32,
        position: usize,
    },
    #[error("{groups} chapter groups with no chapters at byte {position}")]
    EmptyGroups { groups: usize, position: usize },
    #[error(
        "grid of {groups}x{stars} chapters at byte {position} needs at least {needed} bytes, {remaining} remaining"
    )]
    GridTooLarge {
        groups: usize,
        stars: usize,
        needed: usize,
        remaining: usize,
        position: usize,
    },
    #[error("{field} count {found} at byte {position} disagrees with earlier count {expected}")]
    CountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
        position: usize,
    },
}

/// Little-endian byte buffer with a single read/write cursor.
///
/// Reads fail once fewer bytes remain than the value needs. Writes land at the
/// cursor, overwriting what is there and growing the buffer past its end, so a
/// stream built with [`ByteStream::new`] is an append-only writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteStream {
    data: Vec<u8>,
    position: usize,
}

impl ByteStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take::<I32_WIDTH>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take::<I32_WIDTH>()?))
    }

    pub fn read_i32_vec(&mut self, n: usize) -> Result<Vec<i32>, DecodeError> {
        self.ensure(n.saturating_mul(I32_WIDTH))?;
        let mut result = Vec::with_capacity(n);
        for _ in 0..n {
            result.push(self.read_i32()?);
        }
        Ok(result)
    }

    /// Reads an `i32` that sizes a following block; negative values are rejected.
    pub fn read_count(&mut self, field: &'static str) -> Result<usize, DecodeError> {
        let position = self.position;
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| DecodeError::NegativeCount {
            field,
            value,
            position,
        })
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(n)?;
        let bytes = self.data[self.position..self.position + n].to_vec();
        self.position += n;
        Ok(bytes)
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn seek_to(&mut self, pos: usize) -> Result<(), DecodeError> {
        if pos > self.data.len() {
            return Err(DecodeError::SeekOutOfBounds {
                target: pos,
                len: self.data.len(),
            });
        }
        self.position = pos;
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::OutOfBounds {
                position: self.position,
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        self.ensure(N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.data[self.position..self.position + N]);
        self.position += N;
        Ok(buf)
    }
}
