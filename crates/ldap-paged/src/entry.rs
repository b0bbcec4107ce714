//! Directory entries
//!
//! An [`Entry`] is one record returned by a search: a distinguished name and
//! a set of attributes. Attribute names are case-insensitive, as they are in
//! LDAP; the spelling returned by the server is kept for display.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A single attribute value.
///
/// In JSON a text value is a plain string and a binary value is an object
/// holding its base64 encoding: `{"base64": "3q0="}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireValue", try_from = "WireValue")]
pub enum AttributeValue {
    /// A UTF-8 value.
    Text(String),
    /// A value that is not valid UTF-8 (e.g. `objectGUID`, `jpegPhoto`).
    Binary(Vec<u8>),
}

impl AttributeValue {
    /// Get as a string if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::Binary(_) => None,
        }
    }

    /// Get the raw bytes of the value.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeValue::Text(s) => s.as_bytes(),
            AttributeValue::Binary(b) => b,
        }
    }

    /// Check if this is a binary value.
    pub fn is_binary(&self) -> bool {
        matches!(self, AttributeValue::Binary(_))
    }

    /// Render the value as a string; binary values are base64 encoded.
    pub fn to_display_string(&self) -> Cow<'_, str> {
        match self {
            AttributeValue::Text(s) => Cow::Borrowed(s),
            AttributeValue::Binary(b) => {
                Cow::Owned(base64::engine::general_purpose::STANDARD.encode(b))
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Text(String),
    Binary { base64: String },
}

impl From<AttributeValue> for WireValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Text(s) => WireValue::Text(s),
            AttributeValue::Binary(b) => WireValue::Binary {
                base64: base64::engine::general_purpose::STANDARD.encode(b),
            },
        }
    }
}

impl TryFrom<WireValue> for AttributeValue {
    type Error = base64::DecodeError;

    fn try_from(value: WireValue) -> Result<Self, Self::Error> {
        match value {
            WireValue::Text(s) => Ok(AttributeValue::Text(s)),
            WireValue::Binary { base64: encoded } => {
                let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
                Ok(AttributeValue::Binary(bytes))
            }
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Binary(bytes)
    }
}

/// An attribute as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name with its original capitalization.
    pub name: String,
    /// Attribute values in server order.
    pub values: Vec<AttributeValue>,
}

/// How attribute names are presented when an entry is turned into a map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeNameTreatment {
    /// `givenName` becomes `givenname`.
    #[default]
    Lower,
    /// `givenName` becomes `GIVENNAME`.
    Upper,
    /// Names are left as the server returned them.
    Native,
}

impl AttributeNameTreatment {
    /// Apply the treatment to an attribute name.
    pub fn apply<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            AttributeNameTreatment::Lower => Cow::Owned(name.to_lowercase()),
            AttributeNameTreatment::Upper => Cow::Owned(name.to_uppercase()),
            AttributeNameTreatment::Native => Cow::Borrowed(name),
        }
    }
}

/// One directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry")]
pub struct Entry {
    dn: String,
    /// Keyed by lowercased attribute name.
    attributes: BTreeMap<String, Attribute>,
}

/// Deserialized form of [`Entry`]; map keys are rebuilt from attribute names.
#[derive(Deserialize)]
struct RawEntry {
    dn: String,
    #[serde(default)]
    attributes: BTreeMap<String, Attribute>,
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        let mut entry = Entry::new(raw.dn);
        for attribute in raw.attributes.into_values() {
            entry.push_values(attribute.name, attribute.values);
        }
        entry
    }
}

impl Entry {
    /// Create an entry with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add values to an attribute using builder pattern.
    pub fn with<V: Into<AttributeValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.push_values(name, values);
        self
    }

    /// Append values to an attribute, creating it if needed.
    ///
    /// Names that differ only in case address the same attribute.
    pub fn push_values<V: Into<AttributeValue>>(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) {
        let name = name.into();
        let attribute = self
            .attributes
            .entry(name.to_lowercase())
            .or_insert_with(|| Attribute {
                name,
                values: Vec::new(),
            });
        attribute.values.extend(values.into_iter().map(Into::into));
    }

    /// The distinguished name.
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Get all values of an attribute.
    pub fn get(&self, name: &str) -> Option<&[AttributeValue]> {
        self.attribute(name).map(|a| a.values.as_slice())
    }

    /// Get an attribute including its original name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(&name.to_lowercase())
    }

    /// Get the first text value of an attribute.
    pub fn first_text(&self, name: &str) -> Option<&str> {
        self.get(name)?.iter().find_map(AttributeValue::as_text)
    }

    /// Get all text values of an attribute.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|values| values.iter().filter_map(AttributeValue::as_text).collect())
            .unwrap_or_default()
    }

    /// Check if an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_lowercase())
    }

    /// The key this entry sorts by for the given attribute.
    ///
    /// `dn` sorts by the distinguished name. Otherwise the first value of the
    /// attribute is used, and a missing attribute sorts as the empty string.
    pub fn sort_key(&self, attribute: &str) -> Cow<'_, str> {
        if attribute.eq_ignore_ascii_case("dn") {
            return Cow::Borrowed(&self.dn);
        }
        self.get(attribute)
            .and_then(|values| values.first())
            .map(AttributeValue::to_display_string)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Iterate over attributes in case-insensitive name order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the entry has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Convert to a map of treated attribute name to values, with a `dn` key.
    pub fn to_map(
        &self,
        treatment: AttributeNameTreatment,
    ) -> BTreeMap<String, Vec<AttributeValue>> {
        let mut map: BTreeMap<String, Vec<AttributeValue>> = self
            .attributes
            .values()
            .map(|a| (treatment.apply(&a.name).into_owned(), a.values.clone()))
            .collect();
        map.insert("dn".to_string(), vec![AttributeValue::Text(self.dn.clone())]);
        map
    }
}
