use crate::{SaveError, SaveErrorKind};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{Read, Write};

pub(crate) fn malformed(msg: impl Into<String>) -> SaveError {
    SaveError::from(SaveErrorKind::MalformedString { msg: msg.into() })
}

/// Number of bytes the string occupies on the wire, length prefix included.
pub(crate) fn serialized_string_len(s: &str) -> u64 {
    if s.is_empty() {
        4
    } else if s.is_ascii() {
        4 + s.len() as u64 + 1
    } else {
        4 + 2 * (s.encode_utf16().count() as u64 + 1)
    }
}

/// Reads for the save format's primitive values.
///
/// Strings carry a sign-coded i32 length prefix: positive for single byte
/// characters, negative for UTF-16 code units, zero for the empty string.
/// Non-empty strings include a trailing NUL in the counted length.
pub(crate) trait ReadSaveExt: Read {
    fn read_save_string(&mut self) -> Result<String, SaveError> {
        let len = self.read_i32::<LE>()?;
        if len == 0 {
            return Ok(String::new());
        }

        if len > 0 {
            let mut buf = vec![0u8; len as usize];
            self.read_exact(&mut buf)?;
            if buf.pop() != Some(0) {
                return Err(malformed("narrow string is not NUL terminated"));
            }
            String::from_utf8(buf).map_err(|e| malformed(format!("invalid narrow string: {}", e)))
        } else {
            let units = len
                .checked_neg()
                .ok_or_else(|| malformed("string length underflow"))?
                as usize;
            let mut buf = vec![0u16; units];
            self.read_u16_into::<LE>(&mut buf)?;
            if buf.pop() != Some(0) {
                return Err(malformed("wide string is not NUL terminated"));
            }
            String::from_utf16(&buf).map_err(|e| malformed(format!("invalid wide string: {}", e)))
        }
    }

    fn read_save_bool(&mut self) -> Result<bool, SaveError> {
        Ok(self.read_i32::<LE>()? != 0)
    }

    fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N], SaveError> {
        let mut out = [0f32; N];
        self.read_f32_into::<LE>(&mut out)?;
        Ok(out)
    }

    /// Reserved byte that precedes most property payloads. Always zero in
    /// observed captures.
    fn read_reserved_byte(&mut self) -> Result<(), SaveError> {
        let b = self.read_u8()?;
        if b != 0 {
            return Err(SaveErrorKind::InvalidHeader {
                expected: 0,
                found: i32::from(b),
            }
            .into());
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> ReadSaveExt for R {}

/// Write counterpart of [`ReadSaveExt`].
pub(crate) trait WriteSaveExt: Write {
    /// Writes a length-prefixed string, choosing the narrow encoding for
    /// ASCII content and UTF-16 otherwise. The prefix is recomputed, so it
    /// need not match what a reader originally saw if the content changed.
    fn write_save_string(&mut self, s: &str) -> Result<(), SaveError> {
        if s.is_empty() {
            self.write_i32::<LE>(0)?;
            return Ok(());
        }

        if s.is_ascii() {
            let len = i32::try_from(s.len() + 1)
                .map_err(|_| malformed("string too long to serialize"))?;
            self.write_i32::<LE>(len)?;
            self.write_all(s.as_bytes())?;
            self.write_u8(0)?;
        } else {
            let units = s.encode_utf16().count() + 1;
            let len = i32::try_from(units)
                .map_err(|_| malformed("string too long to serialize"))?;
            self.write_i32::<LE>(-len)?;
            for unit in s.encode_utf16() {
                self.write_u16::<LE>(unit)?;
            }
            self.write_u16::<LE>(0)?;
        }

        Ok(())
    }

    fn write_save_bool(&mut self, value: bool) -> Result<(), SaveError> {
        self.write_i32::<LE>(i32::from(value))?;
        Ok(())
    }

    fn write_f32_array(&mut self, values: &[f32]) -> Result<(), SaveError> {
        for &v in values {
            self.write_f32::<LE>(v)?;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteSaveExt for W {}

/// A reader wrapper that counts consumed bytes so declared lengths can be
/// checked against actual consumption.
pub(crate) struct TrackedRead<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> TrackedRead<R> {
    pub(crate) fn new(inner: R) -> Self {
        TrackedRead { inner, consumed: 0 }
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }
}

impl<R: Read> Read for TrackedRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(s: &str) -> String {
        let mut buf = Vec::new();
        buf.write_save_string(s).unwrap();
        assert_eq!(buf.len() as u64, serialized_string_len(s));
        Cursor::new(buf).read_save_string().unwrap()
    }

    #[test]
    fn string_symmetry_empty() {
        assert_eq!(roundtrip(""), "");
    }

    #[test]
    fn string_symmetry_ascii() {
        assert_eq!(roundtrip("Persistent_Level"), "Persistent_Level");
    }

    #[test]
    fn string_symmetry_wide() {
        assert_eq!(roundtrip("Müllbünker Nr. 1"), "Müllbünker Nr. 1");
    }

    #[test]
    fn ascii_wire_form() {
        let mut buf = Vec::new();
        buf.write_save_string("abc").unwrap();
        assert_eq!(buf, b"\x04\x00\x00\x00abc\x00");
    }

    #[test]
    fn wide_wire_form_uses_negative_length() {
        let mut buf = Vec::new();
        buf.write_save_string("ü").unwrap();
        assert_eq!(buf[..4], (-2i32).to_le_bytes()[..]);
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn missing_terminator_is_malformed() {
        let data = b"\x03\x00\x00\x00abc";
        let err = Cursor::new(&data[..]).read_save_string().unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::SaveErrorKind::MalformedString { .. }
        ));
    }

    #[test]
    fn truncated_string_is_io() {
        let data = b"\x10\x00\x00\x00abc";
        let err = Cursor::new(&data[..]).read_save_string().unwrap_err();
        assert!(matches!(err.kind(), crate::SaveErrorKind::Io(_)));
    }

    #[test]
    fn length_underflow_is_malformed() {
        let data = i32::MIN.to_le_bytes();
        let err = Cursor::new(&data[..]).read_save_string().unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::SaveErrorKind::MalformedString { .. }
        ));
    }

    #[test]
    fn tracked_read_counts() {
        let mut r = TrackedRead::new(Cursor::new(vec![0u8; 16]));
        let mut buf = [0u8; 10];
        r.read_exact(&mut buf).unwrap();
        assert_eq!(r.consumed(), 10);
    }
}
