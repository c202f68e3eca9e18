use crate::identifier::{IDENTIFIER_LEN, Identifier};

use super::LayoutError;

const LENGTH_PREFIX: usize = 4;
const LONG_STRING_PADDING: usize = 4;

/// Closed set of on-wire field encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Identifier,
    U8,
    U16,
    I32,
    U64,
    U128,
    /// `[len:u32][pad:4][utf8]`
    LongString,
    /// `[len:u32][utf8]`
    ShortString,
}

impl FieldKind {
    /// Byte width, or `None` when it depends on the encoded value.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            FieldKind::Identifier => Some(IDENTIFIER_LEN),
            FieldKind::U8 => Some(1),
            FieldKind::U16 => Some(2),
            FieldKind::I32 => Some(4),
            FieldKind::U64 => Some(8),
            FieldKind::U128 => Some(16),
            FieldKind::LongString | FieldKind::ShortString => None,
        }
    }

    /// Smallest number of bytes a value of this kind can occupy.
    pub const fn min_width(self) -> usize {
        match self.fixed_width() {
            Some(width) => width,
            None => self.string_header(),
        }
    }

    const fn string_header(self) -> usize {
        match self {
            FieldKind::LongString => LENGTH_PREFIX + LONG_STRING_PADDING,
            _ => LENGTH_PREFIX,
        }
    }
}

/// Decoded field value. Unsigned fields of every width share [`Value::Unsigned`],
/// so a value that is too large for its field is caught at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Identifier(Identifier),
    Unsigned(u128),
    Signed(i64),
    String(String),
}

impl From<Identifier> for Value {
    fn from(value: Identifier) -> Self {
        Value::Identifier(value)
    }
}

macro_rules! unsigned_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Unsigned(u128::from(value))
            }
        })*
    };
}

unsigned_value!(u8, u16, u32, u64, u128);

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Signed(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Signed(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

/// A named encode/decode rule for one member of a [`Layout`](super::Layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    pub const fn identifier(name: &'static str) -> Self {
        Self::new(name, FieldKind::Identifier)
    }

    pub const fn u8(name: &'static str) -> Self {
        Self::new(name, FieldKind::U8)
    }

    pub const fn u16(name: &'static str) -> Self {
        Self::new(name, FieldKind::U16)
    }

    pub const fn i32(name: &'static str) -> Self {
        Self::new(name, FieldKind::I32)
    }

    pub const fn u64(name: &'static str) -> Self {
        Self::new(name, FieldKind::U64)
    }

    pub const fn u128(name: &'static str) -> Self {
        Self::new(name, FieldKind::U128)
    }

    pub const fn long_string(name: &'static str) -> Self {
        Self::new(name, FieldKind::LongString)
    }

    pub const fn short_string(name: &'static str) -> Self {
        Self::new(name, FieldKind::ShortString)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Number of bytes `value` occupies once encoded.
    ///
    /// Also checks that the value matches the field kind and fits its width,
    /// so a successful call guarantees [`Field::encode`] will not reject it.
    pub fn width(&self, value: &Value) -> Result<usize, LayoutError> {
        match (self.kind, value) {
            (FieldKind::Identifier, Value::Identifier(_)) => Ok(IDENTIFIER_LEN),
            (
                FieldKind::U8 | FieldKind::U16 | FieldKind::U64 | FieldKind::U128,
                Value::Unsigned(v),
            ) => {
                let width = self.kind.min_width();
                if width < 16 && (*v >> (8 * width)) != 0 {
                    return Err(LayoutError::FieldOverflow {
                        field: self.name,
                        value: *v,
                        width,
                    });
                }
                Ok(width)
            }
            (FieldKind::I32, Value::Signed(v)) => {
                if i32::try_from(*v).is_err() {
                    return Err(LayoutError::SignedFieldOverflow {
                        field: self.name,
                        value: *v,
                        width: 4,
                    });
                }
                Ok(4)
            }
            (FieldKind::LongString | FieldKind::ShortString, Value::String(s)) => {
                if u32::try_from(s.len()).is_err() {
                    return Err(LayoutError::StringTooLong {
                        field: self.name,
                        needed: s.len(),
                        available: u32::MAX as usize,
                    });
                }
                Ok(self.kind.string_header() + s.len())
            }
            _ => Err(LayoutError::TypeMismatch {
                field: self.name,
                expected: self.kind,
            }),
        }
    }

    /// Writes `value` at `offset` and returns the offset just past it.
    pub fn encode(
        &self,
        value: &Value,
        buffer: &mut [u8],
        offset: usize,
    ) -> Result<usize, LayoutError> {
        let width = self.width(value)?;
        let available = buffer.len().saturating_sub(offset);
        if width > available {
            return Err(match self.kind {
                FieldKind::LongString | FieldKind::ShortString => LayoutError::StringTooLong {
                    field: self.name,
                    needed: width,
                    available,
                },
                _ => LayoutError::BufferTooSmall {
                    needed: offset + width,
                    available: buffer.len(),
                },
            });
        }
        let out = &mut buffer[offset..offset + width];
        match value {
            Value::Identifier(id) => out.copy_from_slice(id.as_bytes()),
            Value::Unsigned(v) => out.copy_from_slice(&v.to_le_bytes()[..width]),
            Value::Signed(v) => out.copy_from_slice(&(*v as i32).to_le_bytes()),
            Value::String(s) => {
                let header = self.kind.string_header();
                out[..LENGTH_PREFIX].copy_from_slice(&(s.len() as u32).to_le_bytes());
                out[LENGTH_PREFIX..header].fill(0);
                out[header..].copy_from_slice(s.as_bytes());
            }
        }
        Ok(offset + width)
    }

    /// Reads a value at `offset` and returns it with the offset just past it.
    pub fn decode(&self, buffer: &[u8], offset: usize) -> Result<(Value, usize), LayoutError> {
        let Some(width) = self.kind.fixed_width() else {
            return self.decode_string(buffer, offset);
        };
        let bytes = self.take(buffer, offset, width)?;
        let value = match self.kind {
            FieldKind::Identifier => {
                let mut raw = [0u8; IDENTIFIER_LEN];
                raw.copy_from_slice(bytes);
                Value::Identifier(Identifier::new(raw))
            }
            FieldKind::I32 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                Value::Signed(i64::from(i32::from_le_bytes(raw)))
            }
            _ => {
                let mut raw = [0u8; 16];
                raw[..width].copy_from_slice(bytes);
                Value::Unsigned(u128::from_le_bytes(raw))
            }
        };
        Ok((value, offset + width))
    }

    fn decode_string(&self, buffer: &[u8], offset: usize) -> Result<(Value, usize), LayoutError> {
        let header = self.kind.string_header();
        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&self.take(buffer, offset, header)?[..LENGTH_PREFIX]);
        let len = u32::from_le_bytes(prefix) as usize;
        let chars = self.take(buffer, offset + header, len)?;
        let s = std::str::from_utf8(chars)
            .map_err(|_| LayoutError::InvalidUtf8 { field: self.name })?;
        Ok((Value::String(s.to_owned()), offset + header + len))
    }

    fn take<'b>(
        &self,
        buffer: &'b [u8],
        offset: usize,
        len: usize,
    ) -> Result<&'b [u8], LayoutError> {
        let available = buffer.len().saturating_sub(offset);
        if len > available {
            return Err(LayoutError::Truncated {
                field: self.name,
                offset,
                needed: len,
                available,
            });
        }
        Ok(&buffer[offset..offset + len])
    }
}
