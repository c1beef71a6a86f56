//! PDF object types and the resolver interface.
//!
//! Objects arrive here already parsed by an external COS layer. This module
//! only models them and lets the pipeline follow indirect references through
//! an [`ObjectResolver`].

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Dictionary type. Insertion order is preserved so "first entry" lookups
/// (e.g. the first image XObject of a form) are deterministic.
pub type Dict = IndexMap<String, Object>;

/// Maximum length of a reference chain followed by [`ObjectResolver::deref`].
pub const MAX_REFERENCE_DEPTH: u32 = 16;

static NULL_OBJECT: Object = Object::Null;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (stored without the leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dict),
    /// Stream (dictionary + still-encoded data)
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Raw stream data, filters not yet applied
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Build a dictionary object from key/value pairs.
    pub fn dict<'a>(entries: impl IntoIterator<Item = (&'a str, Object)>) -> Object {
        Object::Dictionary(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Build a stream object from dictionary entries and raw data.
    pub fn stream<'a>(
        entries: impl IntoIterator<Item = (&'a str, Object)>,
        data: impl Into<bytes::Bytes>,
    ) -> Object {
        Object::Stream {
            dict: entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            data: data.into(),
        }
    }

    /// Build a name object.
    pub fn name(name: &str) -> Object {
        Object::Name(name.to_string())
    }

    /// Build an array of reals.
    pub fn numbers(values: &[f64]) -> Object {
        Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
    }

    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to read a number (integer or real) as `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) if r.is_finite() => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to stream, returning its dictionary and raw data.
    pub fn as_stream(&self) -> Option<(&Dict, &[u8])> {
        match self {
            Object::Stream { dict, data } => Some((dict, data)),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Decode a PDF text string.
    ///
    /// Handles the UTF-16BE and UTF-8 byte order marks; anything else is read
    /// as (lossy) UTF-8.
    pub fn as_text(&self) -> Option<String> {
        let bytes = self.as_string()?;
        Some(decode_text_string(bytes))
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

/// Decode the bytes of a PDF text string.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Lookup-by-reference access to an already parsed object graph.
///
/// Implementations must be shareable across worker threads; the pipeline
/// only ever reads through this trait.
pub trait ObjectResolver: Sync {
    /// Resolve an indirect reference.
    fn resolve(&self, reference: ObjectRef) -> Option<&Object>;

    /// Follow references until a direct object is reached.
    ///
    /// Dangling references and over-long chains resolve to [`Object::Null`]
    /// so callers can treat them like any other absent value.
    fn deref<'a>(&'a self, obj: &'a Object) -> &'a Object {
        let mut current = obj;
        for _ in 0..MAX_REFERENCE_DEPTH {
            match current {
                Object::Reference(r) => match self.resolve(*r) {
                    Some(next) => current = next,
                    None => {
                        log::debug!("Dangling reference {}", r);
                        return &NULL_OBJECT;
                    },
                },
                _ => return current,
            }
        }
        log::warn!("Reference chain longer than {} links", MAX_REFERENCE_DEPTH);
        &NULL_OBJECT
    }

    /// Resolve an indirect reference or fail with [`Error::ObjectNotFound`].
    fn resolve_required(&self, reference: ObjectRef) -> Result<&Object> {
        self.resolve(reference)
            .ok_or(Error::ObjectNotFound(reference.id, reference.gen))
    }

    /// Dictionary lookup with reference following. Null entries count as absent.
    fn get<'a>(&'a self, dict: &'a Dict, key: &str) -> Option<&'a Object> {
        let value = self.deref(dict.get(key)?);
        (!value.is_null()).then_some(value)
    }

    /// Look up a number.
    fn get_number(&self, dict: &Dict, key: &str) -> Option<f64> {
        self.get(dict, key)?.as_number()
    }

    /// Look up a name.
    fn get_name<'a>(&'a self, dict: &'a Dict, key: &str) -> Option<&'a str> {
        self.get(dict, key)?.as_name()
    }

    /// Look up a dictionary (or a stream's dictionary).
    fn get_dict<'a>(&'a self, dict: &'a Dict, key: &str) -> Option<&'a Dict> {
        self.get(dict, key)?.as_dict()
    }

    /// Look up an array.
    fn get_array<'a>(&'a self, dict: &'a Dict, key: &str) -> Option<&'a Vec<Object>> {
        self.get(dict, key)?.as_array()
    }

    /// Look up a text string.
    fn get_text(&self, dict: &Dict, key: &str) -> Option<String> {
        self.get(dict, key)?.as_text()
    }

    /// Look up an array of numbers. Elements are dereferenced individually;
    /// a single non-numeric element makes the whole array unusable.
    fn get_numbers(&self, dict: &Dict, key: &str) -> Option<Vec<f64>> {
        self.numbers(self.get(dict, key)?)
    }

    /// Read an array object as numbers.
    fn numbers(&self, obj: &Object) -> Option<Vec<f64>> {
        self.deref(obj)
            .as_array()?
            .iter()
            .map(|item| self.deref(item).as_number())
            .collect()
    }
}

/// In-memory resolver over a materialized object table.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    objects: HashMap<ObjectRef, Object>,
}

impl ObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object under `id 0 R` and return its reference.
    pub fn insert(&mut self, id: u32, obj: Object) -> ObjectRef {
        let reference = ObjectRef::new(id, 0);
        self.objects.insert(reference, obj);
        reference
    }

    /// Insert an object under an explicit reference.
    pub fn insert_ref(&mut self, reference: ObjectRef, obj: Object) {
        self.objects.insert(reference, obj);
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectResolver for ObjectStore {
    fn resolve(&self, reference: ObjectRef) -> Option<&Object> {
        self.objects.get(&reference)
    }
}
