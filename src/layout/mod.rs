use thiserror::Error;

pub mod field;
pub mod record;

pub use field::{Field, FieldKind, Value};
pub use record::Record;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Field `{field}` is missing from the record")]
    MissingField { field: &'static str },
    #[error("Field `{field}` expects a {expected:?} value")]
    TypeMismatch {
        field: &'static str,
        expected: FieldKind,
    },
    #[error("Field `{field}` does not hold {expected} value")]
    UnexpectedValue {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Value {value} does not fit the {width}-byte field `{field}`")]
    FieldOverflow {
        field: &'static str,
        value: u128,
        width: usize,
    },
    #[error("Value {value} does not fit the {width}-byte signed field `{field}`")]
    SignedFieldOverflow {
        field: &'static str,
        value: i64,
        width: usize,
    },
    #[error("String field `{field}` needs {needed} bytes but only {available} are available")]
    StringTooLong {
        field: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("Record needs {needed} bytes but the buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("Field `{field}` at offset {offset} needs {needed} bytes but only {available} remain")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("String field `{field}` is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
}

/// Ordered composition of fields. Members are packed back to back; field order
/// is both the byte order on the wire and the key order of decoded records.
///
/// Fields following a string sit at offsets known only once the string's
/// length prefix has been read, so decoding always walks left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    fields: &'static [Field],
}

impl Layout {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    /// Total size when no member is variable-sized.
    pub fn fixed_size(&self) -> Option<usize> {
        self.fields.iter().map(|f| f.kind().fixed_width()).sum()
    }

    /// Size with every string empty.
    pub fn min_size(&self) -> usize {
        self.fields.iter().map(|f| f.kind().min_width()).sum()
    }

    /// Exact number of bytes [`Layout::encode`] produces for `record`.
    pub fn encoded_size(&self, record: &Record) -> Result<usize, LayoutError> {
        self.fields
            .iter()
            .map(|field| field.width(record.require(field.name())?))
            .sum()
    }

    pub fn encode(&self, record: &Record) -> Result<Vec<u8>, LayoutError> {
        let mut buffer = vec![0u8; self.encoded_size(record)?];
        self.encode_into(record, &mut buffer)?;
        Ok(buffer)
    }

    /// Encodes into the front of `buffer`, returning the number of bytes written.
    ///
    /// Every value is validated before the first byte is written, so on error
    /// the buffer is left as it was.
    pub fn encode_into(&self, record: &Record, buffer: &mut [u8]) -> Result<usize, LayoutError> {
        let mut end = 0;
        for field in self.fields {
            let width = field.width(record.require(field.name())?)?;
            let available = buffer.len().saturating_sub(end);
            if width > available {
                return Err(match field.kind() {
                    FieldKind::LongString | FieldKind::ShortString => LayoutError::StringTooLong {
                        field: field.name(),
                        needed: width,
                        available,
                    },
                    _ => LayoutError::BufferTooSmall {
                        needed: self.encoded_size(record)?,
                        available: buffer.len(),
                    },
                });
            }
            end += width;
        }

        let mut offset = 0;
        for field in self.fields {
            offset = field.encode(record.require(field.name())?, buffer, offset)?;
        }
        Ok(offset)
    }

    /// Decodes a record from the front of `bytes`. Trailing bytes are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<Record, LayoutError> {
        self.decode_prefix(bytes).map(|(record, _)| record)
    }

    /// Like [`Layout::decode`], also returning the number of bytes consumed.
    pub fn decode_prefix(&self, bytes: &[u8]) -> Result<(Record, usize), LayoutError> {
        let mut record = Record::new();
        let mut offset = 0;
        for field in self.fields {
            let (value, next) = field.decode(bytes, offset)?;
            record.insert(field.name(), value);
            offset = next;
        }
        Ok((record, offset))
    }
}
