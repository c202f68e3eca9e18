use crate::identifier::Identifier;

use super::{FieldKind, LayoutError, Value};

/// Field values keyed by name, kept in insertion order.
///
/// Decoded records follow the order of their layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name`, replacing an earlier value in place.
    pub fn insert(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn require(&self, name: &'static str) -> Result<&Value, LayoutError> {
        self.get(name).ok_or(LayoutError::MissingField { field: name })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn identifier(&self, name: &'static str) -> Result<Identifier, LayoutError> {
        match self.require(name)? {
            Value::Identifier(id) => Ok(*id),
            _ => Err(LayoutError::UnexpectedValue {
                field: name,
                expected: "an identifier",
            }),
        }
    }

    pub fn string(&self, name: &'static str) -> Result<&str, LayoutError> {
        match self.require(name)? {
            Value::String(s) => Ok(s),
            _ => Err(LayoutError::UnexpectedValue {
                field: name,
                expected: "a string",
            }),
        }
    }

    pub fn u8(&self, name: &'static str) -> Result<u8, LayoutError> {
        self.unsigned(name, FieldKind::U8)
    }

    pub fn u16(&self, name: &'static str) -> Result<u16, LayoutError> {
        self.unsigned(name, FieldKind::U16)
    }

    pub fn u64(&self, name: &'static str) -> Result<u64, LayoutError> {
        self.unsigned(name, FieldKind::U64)
    }

    pub fn u128(&self, name: &'static str) -> Result<u128, LayoutError> {
        self.unsigned(name, FieldKind::U128)
    }

    pub fn i32(&self, name: &'static str) -> Result<i32, LayoutError> {
        match self.require(name)? {
            Value::Signed(v) => i32::try_from(*v).map_err(|_| LayoutError::SignedFieldOverflow {
                field: name,
                value: *v,
                width: 4,
            }),
            _ => Err(LayoutError::UnexpectedValue {
                field: name,
                expected: "a signed integer",
            }),
        }
    }

    fn unsigned<T: TryFrom<u128>>(
        &self,
        name: &'static str,
        kind: FieldKind,
    ) -> Result<T, LayoutError> {
        match self.require(name)? {
            Value::Unsigned(v) => T::try_from(*v).map_err(|_| LayoutError::FieldOverflow {
                field: name,
                value: *v,
                width: kind.min_width(),
            }),
            _ => Err(LayoutError::UnexpectedValue {
                field: name,
                expected: "an unsigned integer",
            }),
        }
    }
}
