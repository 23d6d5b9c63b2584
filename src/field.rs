//! Typed field model consumed by the sink.
//!
//! A [`FieldSet`] is one output record: an ordered list of named values.
//! The sink trusts the producer to present the same layout for every
//! record of a run and does not validate it.

use crate::error::{SinkError, SinkResult};

/// Type tag of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Uint64,
    Bool,
    Binary,
    Null,
}

impl FieldType {
    /// Map a producer's numeric type tag onto a field type.
    ///
    /// Tags outside `0..=4` are a producer contract violation.
    pub fn from_tag(tag: u8) -> SinkResult<Self> {
        match tag {
            0 => Ok(FieldType::String),
            1 => Ok(FieldType::Uint64),
            2 => Ok(FieldType::Bool),
            3 => Ok(FieldType::Binary),
            4 => Ok(FieldType::Null),
            _ => Err(SinkError::UnknownFieldType { tag }),
        }
    }

    /// Numeric tag of this type
    pub fn tag(&self) -> u8 {
        match self {
            FieldType::String => 0,
            FieldType::Uint64 => 1,
            FieldType::Bool => 2,
            FieldType::Binary => 3,
            FieldType::Null => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Uint64 => "int",
            FieldType::Bool => "bool",
            FieldType::Binary => "binary",
            FieldType::Null => "null",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Uint64(u64),
    Bool(bool),
    Binary(Vec<u8>),
    Null,
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Uint64(_) => FieldType::Uint64,
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Binary(_) => FieldType::Binary,
            FieldValue::Null => FieldType::Null,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Uint64(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Named value inside a field set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.value.field_type()
    }
}

/// Ordered collection of fields forming one output record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a field and return the set (builder style)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push(Field::new(name, value));
    }

    pub fn push_null(&mut self, name: impl Into<String>) {
        self.fields.push(Field {
            name: name.into(),
            value: FieldValue::Null,
        });
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Type layout of this record, in field order
    pub fn layout(&self) -> Vec<FieldType> {
        self.fields.iter().map(Field::field_type).collect()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Field as delivered by a producer that tags values numerically.
///
/// `num` carries UINT64 and BOOL values, `bytes` carries STRING (UTF-8)
/// and BINARY payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedField<'a> {
    pub name: &'a str,
    pub tag: u8,
    pub num: u64,
    pub bytes: &'a [u8],
}

impl<'a> TaggedField<'a> {
    pub fn number(name: &'a str, tag: u8, num: u64) -> Self {
        Self {
            name,
            tag,
            num,
            bytes: &[],
        }
    }

    pub fn bytes(name: &'a str, tag: u8, bytes: &'a [u8]) -> Self {
        Self {
            name,
            tag,
            num: 0,
            bytes,
        }
    }

    /// Convert into a typed field, rejecting unknown tags
    pub fn to_field(&self) -> SinkResult<Field> {
        let value = match FieldType::from_tag(self.tag)? {
            FieldType::String => FieldValue::String(String::from_utf8(self.bytes.to_vec())?),
            FieldType::Uint64 => FieldValue::Uint64(self.num),
            FieldType::Bool => FieldValue::Bool(self.num != 0),
            FieldType::Binary => FieldValue::Binary(self.bytes.to_vec()),
            FieldType::Null => FieldValue::Null,
        };
        Ok(Field {
            name: self.name.to_string(),
            value,
        })
    }
}

impl FieldSet {
    /// Build a field set from tagged producer fields.
    ///
    /// Fails on the first unknown tag without producing a partial set.
    pub fn from_tagged(fields: &[TaggedField<'_>]) -> SinkResult<Self> {
        fields.iter().map(TaggedField::to_field).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        assert_eq!(FieldType::from_tag(0).expect("string tag"), FieldType::String);
        assert_eq!(FieldType::from_tag(3).expect("binary tag"), FieldType::Binary);
        assert_eq!(FieldType::Null.tag(), 4);
        assert!(matches!(
            FieldType::from_tag(7),
            Err(SinkError::UnknownFieldType { tag: 7 })
        ));
    }

    #[test]
    fn test_field_set_builder() {
        let fs = FieldSet::new()
            .with("saddr", "10.0.0.1")
            .with("sport", 443u64)
            .with("success", true)
            .with("payload", vec![0xdeu8, 0xad])
            .with("tls", None::<String>);

        assert_eq!(fs.len(), 5);
        assert_eq!(
            fs.layout(),
            vec![
                FieldType::String,
                FieldType::Uint64,
                FieldType::Bool,
                FieldType::Binary,
                FieldType::Null
            ]
        );
        assert_eq!(
            fs.get("sport").map(|f| &f.value),
            Some(&FieldValue::Uint64(443))
        );
        assert!(fs.get("missing").is_none());
    }

    #[test]
    fn test_from_tagged() {
        let fields = [
            TaggedField::bytes("saddr", 0, b"10.0.0.1"),
            TaggedField::number("sport", 1, 443),
            TaggedField::number("success", 2, 1),
            TaggedField::bytes("data", 3, &[0xbe, 0xef]),
            TaggedField::number("tls", 4, 0),
        ];
        let fs = FieldSet::from_tagged(&fields).expect("valid tags");
        assert_eq!(
            fs,
            FieldSet::new()
                .with("saddr", "10.0.0.1")
                .with("sport", 443u64)
                .with("success", true)
                .with("data", vec![0xbeu8, 0xef])
                .with("tls", FieldValue::Null)
        );
    }

    #[test]
    fn test_from_tagged_rejects_unknown_tag() {
        let fields = [
            TaggedField::bytes("saddr", 0, b"10.0.0.1"),
            TaggedField::number("weird", 9, 1),
        ];
        assert!(matches!(
            FieldSet::from_tagged(&fields),
            Err(SinkError::UnknownFieldType { tag: 9 })
        ));
    }
}
