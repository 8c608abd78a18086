//! Lookup primitives over [`MetaMap`].
//!
//! Every accessor is total: it returns the value, or says why there is no
//! value ([`LookupError::Missing`] or [`LookupError::WrongType`]). Callers
//! match on the outcome instead of probing types themselves.

use super::value::{MetaKind, MetaMap, MetaValue};
use crate::diagnostics::Diagnostics;
use crate::error::Error;

/// Why a lookup produced no value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The field is absent.
    #[error("field \"{0}\" not found")]
    Missing(String),

    /// The field is present with a different type.
    #[error("value of \"{field}\": expecting type \"{expected}\", but found type \"{found}\"")]
    WrongType {
        field: String,
        expected: MetaKind,
        found: MetaKind,
    },
}

impl From<LookupError> for Error {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Missing(field) => Error::MissingField(field),
            LookupError::WrongType {
                field,
                expected,
                found,
            } => Error::WrongType {
                field,
                expected: expected.to_string(),
                found: found.to_string(),
            },
        }
    }
}

/// Get a field of any type.
pub fn get<'a>(map: &'a MetaMap, key: &str) -> Result<&'a MetaValue, LookupError> {
    map.get(key)
        .ok_or_else(|| LookupError::Missing(key.to_string()))
}

/// Get a field, requiring a particular type.
pub fn get_typed<'a>(
    map: &'a MetaMap,
    key: &str,
    expected: MetaKind,
) -> Result<&'a MetaValue, LookupError> {
    let value = get(map, key)?;
    if value.kind() != expected {
        return Err(wrong_type(key, expected, value));
    }
    Ok(value)
}

pub fn get_map<'a>(map: &'a MetaMap, key: &str) -> Result<&'a MetaMap, LookupError> {
    match get(map, key)? {
        MetaValue::Map(inner) => Ok(inner),
        other => Err(wrong_type(key, MetaKind::Map, other)),
    }
}

pub fn get_list<'a>(map: &'a MetaMap, key: &str) -> Result<&'a [MetaValue], LookupError> {
    match get(map, key)? {
        MetaValue::List(items) => Ok(items),
        other => Err(wrong_type(key, MetaKind::List, other)),
    }
}

pub fn get_bool(map: &MetaMap, key: &str) -> Result<bool, LookupError> {
    match get(map, key)? {
        MetaValue::Bool(b) => Ok(*b),
        other => Err(wrong_type(key, MetaKind::Bool, other)),
    }
}

/// Get a text field (`Inlines` or `String`) as a plain string.
pub fn get_text(map: &MetaMap, key: &str) -> Result<String, LookupError> {
    let value = get(map, key)?;
    value
        .to_plain_string()
        .ok_or_else(|| wrong_type(key, MetaKind::Inlines, value))
}

/// Set a field, replacing any previous value.
pub fn set(map: &mut MetaMap, key: impl Into<String>, value: MetaValue) {
    map.insert(key.into(), value);
}

/// Walk `keys` left to right through nested maps.
///
/// Every key but the last must hold a `Map`. If `leaf` is given, the final
/// value must have that type.
pub fn get_nested<'a>(
    map: &'a MetaMap,
    keys: &[&str],
    leaf: Option<MetaKind>,
) -> Result<&'a MetaValue, LookupError> {
    let (last, branches) = keys
        .split_last()
        .ok_or_else(|| LookupError::Missing(String::new()))?;
    let mut current = map;
    for key in branches {
        current = get_map(current, key)?;
    }
    match leaf {
        Some(kind) => get_typed(current, last, kind),
        None => get(current, last),
    }
}

/// Nested lookup of a map, collapsing any failure to an empty map.
///
/// An absent path is silent; a type mismatch anywhere on the path is reported
/// as a warning. Either way the caller sees "no contribution".
pub fn nested_map(map: &MetaMap, keys: &[&str], diag: &Diagnostics) -> MetaMap {
    match get_nested(map, keys, Some(MetaKind::Map)) {
        Ok(MetaValue::Map(inner)) => inner.clone(),
        Ok(_) | Err(LookupError::Missing(_)) => MetaMap::new(),
        Err(err) => {
            diag.warn(err);
            MetaMap::new()
        }
    }
}

/// Read a field that may hold one text value or a list of them.
pub fn list_or_scalar(map: &MetaMap, key: &str) -> Result<Vec<String>, LookupError> {
    let value = get(map, key)?;
    if let Some(text) = value.to_plain_string() {
        return Ok(vec![text]);
    }
    match value {
        MetaValue::List(items) => items
            .iter()
            .map(|item| {
                item.to_plain_string()
                    .ok_or_else(|| wrong_type(key, MetaKind::Inlines, item))
            })
            .collect(),
        other => Err(wrong_type(key, MetaKind::List, other)),
    }
}

fn wrong_type(key: &str, expected: MetaKind, found: &MetaValue) -> LookupError {
    LookupError::WrongType {
        field: key.to_string(),
        expected,
        found: found.kind(),
    }
}
