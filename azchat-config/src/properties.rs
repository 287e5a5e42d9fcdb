//! Key/value property resources
//!
//! Parses the line-oriented `key=value` format used by the packaged resource
//! files. The accepted syntax is the common subset of Java `.properties`:
//!
//! - `#` and `!` start a comment line
//! - keys end at the first unescaped `=`, `:` or whitespace
//! - a line ending in an odd number of backslashes continues on the next line
//! - `\t`, `\n`, `\r`, `\f`, `\uXXXX` and `\<char>` escapes in keys and values

use std::collections::HashMap;

use crate::ConfigError;

/// A flat map of property names to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    /// Creates an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a property map from literal pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use azchat_config::Properties;
    ///
    /// let props = Properties::from_pairs([("db.url", "host1"), ("db.user", "u1")]);
    /// assert_eq!(props.get("db.url"), Some("host1"));
    /// assert_eq!(props.get("db.password"), None);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses `contents` and merges the entries into this map.
    ///
    /// Entries already present are overwritten, so loading several resources
    /// in turn gives precedence to the last one.
    ///
    /// # Arguments
    ///
    /// * `source_name` - Name used in error messages (file path or resource name)
    /// * `contents` - The resource text
    pub fn load(&mut self, source_name: &str, contents: &str) -> Result<(), ConfigError> {
        let mut lines = contents.lines().enumerate();

        while let Some((index, line)) = lines.next() {
            let trimmed = line.trim_start_matches(is_blank);
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let line_no = index + 1;
            let mut logical = String::from(trimmed);
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                    None => break,
                }
            }

            let (raw_key, raw_value) = split_entry(&logical);
            let parse_error = |message: String| ConfigError::Parse {
                source_name: source_name.to_string(),
                line: line_no,
                message,
            };
            let key = unescape(raw_key).map_err(parse_error)?;
            let value = unescape(raw_value).map_err(parse_error)?;
            self.entries.insert(key, value);
        }

        Ok(())
    }

    /// Looks up a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses a single property resource into a new map.
///
/// # Examples
///
/// ```
/// use azchat_config::properties;
///
/// let props = properties::parse("inline", "# comment\ndb.url = host1\ndb.user:u1\n").unwrap();
/// assert_eq!(props.get("db.url"), Some("host1"));
/// assert_eq!(props.get("db.user"), Some("u1"));
/// ```
pub fn parse(source_name: &str, contents: &str) -> Result<Properties, ConfigError> {
    let mut properties = Properties::new();
    properties.load(source_name, contents)?;
    Ok(properties)
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                let value = line[i + 1..].trim_start_matches(is_blank);
                return (&line[..i], value);
            }
            c if is_blank(c) => {
                let mut rest = line[i..].trim_start_matches(is_blank);
                if let Some(stripped) = rest.strip_prefix(['=', ':']) {
                    rest = stripped.trim_start_matches(is_blank);
                }
                return (&line[..i], rest);
            }
            _ => {}
        }
    }

    (line, "")
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0C'),
            Some('u') => {
                let unit = read_utf16_unit(&mut chars)?;
                if (0xD800..0xDC00).contains(&unit) {
                    // High surrogate: the low half must follow as another \u escape
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(format!("unpaired surrogate \\u{unit:04X}"));
                    }
                    let low = read_utf16_unit(&mut chars)?;
                    let decoded = char::decode_utf16([unit, low])
                        .next()
                        .and_then(Result::ok)
                        .ok_or_else(|| format!("invalid surrogate pair \\u{unit:04X}\\u{low:04X}"))?;
                    out.push(decoded);
                } else {
                    let decoded = char::from_u32(u32::from(unit))
                        .ok_or_else(|| format!("unpaired surrogate \\u{unit:04X}"))?;
                    out.push(decoded);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_utf16_unit(chars: &mut std::str::Chars<'_>) -> Result<u16, String> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.chars().count() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("malformed \\uxxxx encoding: \\u{hex}"));
    }
    u16::from_str_radix(&hex, 16).map_err(|e| format!("malformed \\uxxxx encoding: {e}"))
}
