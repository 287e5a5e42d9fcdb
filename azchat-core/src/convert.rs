//! Emptiness predicates and numeric conversions

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{Error, Result};

const BYTES_PER_MEGABYTE: i64 = 1_000_000;

/// Containers that can report whether they hold anything.
pub trait IsEmpty {
    fn is_empty(&self) -> bool;
}

impl<T> IsEmpty for [T] {
    fn is_empty(&self) -> bool {
        <[T]>::is_empty(self)
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<K, V, S> IsEmpty for HashMap<K, V, S> {
    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl<K, V> IsEmpty for BTreeMap<K, V> {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

impl<T, S> IsEmpty for HashSet<T, S> {
    fn is_empty(&self) -> bool {
        HashSet::is_empty(self)
    }
}

impl IsEmpty for str {
    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl IsEmpty for String {
    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }
}

/// True when `value` is absent or holds nothing.
///
/// # Examples
///
/// ```
/// use azchat_core::convert::is_empty;
///
/// assert!(is_empty::<Vec<u8>>(None));
/// assert!(is_empty(Some(&Vec::<u8>::new())));
/// assert!(!is_empty(Some(&vec![1])));
/// ```
pub fn is_empty<T: IsEmpty + ?Sized>(value: Option<&T>) -> bool {
    value.is_none_or(|v| v.is_empty())
}

/// True when `value` is absent or the empty string.
pub fn is_empty_or_null(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Strips every non-digit character and parses what remains.
///
/// Absent input yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`Error::NumberFormat`] when no digits remain or the digits
/// overflow an `i64`.
///
/// # Examples
///
/// ```
/// use azchat_core::convert::numbers;
///
/// assert_eq!(numbers(Some("abc123def45")).unwrap(), Some(12345));
/// assert_eq!(numbers(None).unwrap(), None);
/// assert!(numbers(Some("abc")).is_err());
/// ```
pub fn numbers(input: Option<&str>) -> Result<Option<i64>> {
    let Some(input) = input else {
        return Ok(None);
    };

    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<i64>()
        .map(Some)
        .map_err(|source| Error::NumberFormat {
            input: input.to_string(),
            source,
        })
}

/// Converts bytes to whole megabytes (1,000,000 bytes), truncating.
pub fn mega_bytes(bytes: Option<i64>) -> Option<i64> {
    bytes.map(|b| b / BYTES_PER_MEGABYTE)
}
