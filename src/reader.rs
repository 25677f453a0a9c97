use crate::SaveError;
use serde::Serialize;

/// Number of bytes that make up one unit of a UTF-16 encoded save string.
///
/// Negative string lengths count UTF-16 code units, not bytes.
pub const UTF16_UNIT_WIDTH: usize = 2;

/// A 64-bit integer as it is read off the wire: two little endian 32-bit
/// words. Values whose high word is zero collapse to the low word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LongValue {
    Word(i32),
    Pair(i32, i32),
}

impl LongValue {
    pub fn from_words(low: i32, high: i32) -> Self {
        if high == 0 {
            LongValue::Word(low)
        } else {
            LongValue::Pair(low, high)
        }
    }

    /// The low and high words as they appeared on the wire
    pub fn words(&self) -> (i32, i32) {
        match *self {
            LongValue::Word(low) => (low, 0),
            LongValue::Pair(low, high) => (low, high),
        }
    }

    /// Reassemble the full value
    pub fn as_i64(&self) -> i64 {
        let (low, high) = self.words();
        (i64::from(high) << 32) | i64::from(low as u32)
    }
}

/// Little endian primitive decoding shared by every source of save bytes.
///
/// Implementors only need to make bytes available and advance past them.
/// Every provided read advances `bytes_read` by exactly the width it
/// documents.
pub trait SaveReader {
    /// Ensure at least `len` bytes are buffered and return them without
    /// advancing
    fn fill(&mut self, len: usize) -> Result<&[u8], SaveError>;

    /// Advance past `len` bytes previously made available by `fill`
    fn consume(&mut self, len: usize);

    /// Running total of bytes consumed
    fn bytes_read(&self) -> u64;

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SaveError> {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.fill(N)?[..N]);
        self.consume(N);
        Ok(out)
    }

    /// 1 byte
    fn read_u8(&mut self) -> Result<u8, SaveError> {
        let [x] = self.read_array::<1>()?;
        Ok(x)
    }

    /// 1 byte
    fn read_i8(&mut self) -> Result<i8, SaveError> {
        let [x] = self.read_array::<1>()?;
        Ok(x as i8)
    }

    /// 4 bytes
    fn read_i32(&mut self) -> Result<i32, SaveError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// 4 bytes
    fn read_u32(&mut self) -> Result<u32, SaveError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// 4 bytes
    fn read_f32(&mut self) -> Result<f32, SaveError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// 8 bytes
    fn read_f64(&mut self) -> Result<f64, SaveError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// 8 bytes: the low word followed by the high word
    fn read_long(&mut self) -> Result<LongValue, SaveError> {
        let low = self.read_i32()?;
        let high = self.read_i32()?;
        Ok(LongValue::from_words(low, high))
    }

    /// A length prefixed string. Positive lengths are UTF-8 bytes, negative
    /// lengths are UTF-16 code units. A trailing nul terminator is dropped.
    fn read_string(&mut self) -> Result<String, SaveError> {
        let len = self.read_i32()?;
        if len == 0 {
            return Ok(String::new());
        }

        if len > 0 {
            let data = self.fill(len as usize)?;
            let result = decode_utf8(&data[..len as usize]);
            self.consume(len as usize);
            Ok(result)
        } else {
            let units = len.unsigned_abs() as usize;
            let byte_len = units * UTF16_UNIT_WIDTH;
            let data = self.fill(byte_len)?;
            let result = decode_utf16(&data[..byte_len]);
            self.consume(byte_len);
            Ok(result)
        }
    }

    /// `len` bytes without any length prefix
    fn read_raw(&mut self, len: usize) -> Result<Vec<u8>, SaveError> {
        let out = self.fill(len)?[..len].to_vec();
        self.consume(len);
        Ok(out)
    }

    /// Same as `read_raw` but leaves the cursor in place. Only meant for
    /// capturing bytes whose meaning is unknown.
    fn peek_raw(&mut self, len: usize) -> Result<Vec<u8>, SaveError> {
        Ok(self.fill(len)?[..len].to_vec())
    }

    fn skip_bytes(&mut self, len: usize) -> Result<(), SaveError> {
        self.fill(len)?;
        self.consume(len);
        Ok(())
    }
}

impl<R: SaveReader + ?Sized> SaveReader for &'_ mut R {
    fn fill(&mut self, len: usize) -> Result<&[u8], SaveError> {
        (**self).fill(len)
    }

    fn consume(&mut self, len: usize) {
        (**self).consume(len)
    }

    fn bytes_read(&self) -> u64 {
        (**self).bytes_read()
    }
}

fn decode_utf8(data: &[u8]) -> String {
    let data = data.strip_suffix(&[0]).unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(s) => String::from(s),
        Err(_) => String::from_utf8_lossy(data).into_owned(),
    }
}

fn decode_utf16(data: &[u8]) -> String {
    let mut units: Vec<u16> = data
        .chunks_exact(UTF16_UNIT_WIDTH)
        .map(|x| u16::from_le_bytes([x[0], x[1]]))
        .collect();

    if units.last() == Some(&0) {
        units.pop();
    }

    String::from_utf16_lossy(&units)
}

/// A reader over a contiguous, fully resident byte slice.
///
/// ```
/// use factorysave::{ByteCursor, SaveReader};
/// let data = [5, 0, 0, 0, b'N', b'o', b'n', b'e', 0];
/// let mut cursor = ByteCursor::new(&data);
/// assert_eq!(cursor.read_string().unwrap(), "None");
/// assert_eq!(cursor.bytes_read(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, offset: 0 }
    }

    /// Bytes that have not been consumed yet
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    pub fn position(&self) -> usize {
        self.offset
    }
}

impl SaveReader for ByteCursor<'_> {
    fn fill(&mut self, len: usize) -> Result<&[u8], SaveError> {
        let rest = &self.data[self.offset..];
        if rest.len() < len {
            return Err(SaveError::truncated(len, rest.len()));
        }

        Ok(rest)
    }

    fn consume(&mut self, len: usize) {
        self.offset += len;
    }

    fn bytes_read(&self) -> u64 {
        self.offset as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SaveErrorKind;

    #[test]
    fn long_fits_in_one_word() {
        let data = [42, 0, 0, 0, 0, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);
        let value = cursor.read_long().unwrap();
        assert_eq!(value, LongValue::Word(42));
        assert_eq!(cursor.bytes_read(), 8);

        let (low, high) = value.words();
        let mut encoded = low.to_le_bytes().to_vec();
        encoded.extend_from_slice(&high.to_le_bytes());
        assert_eq!(&encoded[..], &data[..]);
    }

    #[test]
    fn long_needs_a_pair() {
        let data = [1, 0, 0, 0, 1, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);
        let value = cursor.read_long().unwrap();
        assert_eq!(value, LongValue::Pair(1, 1));
        assert_eq!(value.as_i64(), (1 << 32) | 1);

        let (low, high) = value.words();
        let mut encoded = low.to_le_bytes().to_vec();
        encoded.extend_from_slice(&high.to_le_bytes());
        assert_eq!(&encoded[..], &data[..]);
    }

    #[test]
    fn long_serializes_like_the_wire() {
        let json = serde_json::to_string(&LongValue::Word(42)).unwrap();
        assert_eq!(json, "42");
        let json = serde_json::to_string(&LongValue::Pair(1, 1)).unwrap();
        assert_eq!(json, "[1,1]");
    }

    #[test]
    fn empty_string_consumes_prefix_only() {
        let data = [0, 0, 0, 0, 0xff];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_string().unwrap(), "");
        assert_eq!(cursor.bytes_read(), 4);
    }

    #[test]
    fn utf8_string_consumes_length() {
        let mut data = 12i32.to_le_bytes().to_vec();
        data.extend_from_slice(b"mConveyorAny\x00trailing");
        let mut cursor = ByteCursor::new(&data);
        // length includes no terminator here, so every byte is kept
        assert_eq!(cursor.read_string().unwrap(), "mConveyorAny");
        assert_eq!(cursor.bytes_read(), 16);
    }

    #[test]
    fn utf16_string_counts_code_units() {
        // "Grüße" with a terminator as written by the game for non-ascii names
        let text = "Grüße";
        let units: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
        let mut data = (-(units.len() as i32)).to_le_bytes().to_vec();
        for unit in &units {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        data.extend_from_slice(&[0xaa, 0xbb]);

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_string().unwrap(), text);
        assert_eq!(cursor.bytes_read() as usize, 4 + units.len() * UTF16_UNIT_WIDTH);
        assert_eq!(cursor.remaining(), &[0xaa, 0xbb]);
    }

    #[test]
    fn peek_does_not_advance() {
        let data = [1, 2, 3, 4];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.peek_raw(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(cursor.bytes_read(), 0);
        assert_eq!(cursor.read_raw(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(cursor.bytes_read(), 3);
        cursor.skip_bytes(1).unwrap();
        assert_eq!(cursor.bytes_read(), 4);
    }

    #[test]
    fn fixed_widths() {
        let mut data = vec![0xfe, 0x80];
        data.extend_from_slice(&(-7i32).to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&(-2.25f64).to_le_bytes());
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 0xfe);
        assert_eq!(cursor.read_i8().unwrap(), -128);
        assert_eq!(cursor.read_i32().unwrap(), -7);
        assert_eq!(cursor.read_f32().unwrap(), 1.5);
        assert_eq!(cursor.read_f64().unwrap(), -2.25);
        assert_eq!(cursor.bytes_read(), 18);
    }

    #[test]
    fn short_read_is_truncation() {
        let data = [1, 2];
        let mut cursor = ByteCursor::new(&data);
        let err = cursor.read_i32().unwrap_err();
        assert!(matches!(
            err.kind(),
            SaveErrorKind::TruncatedStream {
                needed: 4,
                available: 2
            }
        ));
    }
}
