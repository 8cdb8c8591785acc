//! # Path Notations
//!
//! A path addresses one node inside an instance of a schema. It has two
//! interchangeable notations:
//!
//! - dot notation: `"books.3.name"`
//! - segmented notation: `["books", "3", "name"]`
//!
//! Splitting a well-formed dot path on `.` and joining the segments with
//! `.` reproduces it exactly. Whether a segment is a field name or an index
//! is decided by the schema position it lands on, so segments stay text
//! until they are checked against a grammar.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Separator between segments in dot notation.
pub const SEPARATOR: char = '.';

/// One resolved step of a path: a record field name or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Index(usize),
    Field(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

/// Parse a sequence index in canonical decimal form.
///
/// Accepts `0` and digit strings without a leading zero that fit in
/// `usize`. Signs, whitespace, fractions, and leading zeros are rejected so
/// that each index has exactly one spelling.
pub fn parse_index(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes {
        [] => None,
        [b'0'] => Some(0),
        [b'0', ..] => None,
        _ if bytes.iter().all(u8::is_ascii_digit) => text.parse().ok(),
        _ => None,
    }
}

/// Render segments in dot notation.
pub fn join_dotted<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(segment.as_ref());
    }
    out
}

/// Split a dot-notation path into borrowed segments.
///
/// # Errors
///
/// Returns [`PathError::Malformed`] for an empty string or a leading,
/// trailing, or doubled separator.
pub fn split_dotted(path: &str) -> Result<Vec<&str>, PathError> {
    let malformed = |reason: &str| PathError::Malformed {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(malformed("path is empty"));
    }
    if path.starts_with(SEPARATOR) {
        return Err(malformed("leading separator"));
    }
    if path.ends_with(SEPARATOR) {
        return Err(malformed("trailing separator"));
    }

    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(malformed("consecutive separators"));
    }
    Ok(segments)
}

/// A non-empty sequence of path segments, not yet checked against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse dot notation.
    pub fn parse_dotted(path: &str) -> Result<Self, PathError> {
        let segments = split_dotted(path)?;
        Ok(Self {
            segments: segments.into_iter().map(str::to_string).collect(),
        })
    }

    /// Build from segmented notation.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Empty`] when no segments are supplied.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Never true for a constructed path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn to_dotted(&self) -> String {
        join_dotted(&self.segments)
    }

    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl TryFrom<Vec<String>> for FieldPath {
    type Error = PathError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_segments(segments)
    }
}

impl From<FieldPath> for Vec<String> {
    fn from(path: FieldPath) -> Self {
        path.segments
    }
}

impl AsRef<[String]> for FieldPath {
    fn as_ref(&self) -> &[String] {
        &self.segments
    }
}

/// Either shape accepted by the segmented validator: one path, or several
/// paths checked together (a field's dependency list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamePath {
    Single(Vec<String>),
    Many(Vec<Vec<String>>),
}

impl NamePath {
    /// Iterate the contained paths as segment slices.
    pub fn paths(&self) -> Box<dyn Iterator<Item = &[String]> + '_> {
        match self {
            Self::Single(path) => Box::new(std::iter::once(path.as_slice())),
            Self::Many(paths) => Box::new(paths.iter().map(Vec::as_slice)),
        }
    }

    /// Number of contained paths.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<FieldPath> for NamePath {
    fn from(path: FieldPath) -> Self {
        Self::Single(path.into_segments())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_must_be_canonical_decimal() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("3"), Some(3));
        assert_eq!(parse_index("120"), Some(120));
        for bad in ["", "-1", "+1", "01", "1.5", " 1", "1e3", "x", "00"] {
            assert_eq!(parse_index(bad), None, "{bad:?} accepted");
        }
        assert_eq!(parse_index("99999999999999999999999999"), None);
    }

    #[test]
    fn dotted_split_rejects_separator_misuse() {
        assert_eq!(split_dotted("a.0.d").unwrap(), ["a", "0", "d"]);
        for (bad, reason) in [
            ("", "path is empty"),
            (".a", "leading separator"),
            ("a.", "trailing separator"),
            ("a..b", "consecutive separators"),
            (".", "leading separator"),
        ] {
            match split_dotted(bad) {
                Err(PathError::Malformed { reason: r, .. }) => assert_eq!(r, reason),
                other => panic!("{bad:?}: expected Malformed, got {other:?}"),
            }
        }
    }

    #[test]
    fn field_path_rejects_empty_segment_list() {
        let err = FieldPath::from_segments(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, PathError::Empty);
    }

    #[test]
    fn field_path_displays_dotted() {
        let path = FieldPath::from_segments(["books", "3", "name"]).unwrap();
        assert_eq!(path.to_string(), "books.3.name");
        assert_eq!(FieldPath::parse_dotted("books.3.name").unwrap(), path);
    }

    #[test]
    fn name_path_deserializes_either_shape() {
        let single: NamePath = serde_json::from_str(r#"["address","0"]"#).unwrap();
        assert_eq!(single, NamePath::Single(vec!["address".into(), "0".into()]));

        let many: NamePath =
            serde_json::from_str(r#"[["address","0"],["address","1"]]"#).unwrap();
        assert_eq!(many.len(), 2);
        let joined: Vec<String> = many.paths().map(|p| join_dotted(p)).collect();
        assert_eq!(joined, ["address.0", "address.1"]);
    }

    #[test]
    fn field_path_serde_refuses_empty() {
        assert!(serde_json::from_str::<FieldPath>("[]").is_err());
        let path: FieldPath = serde_json::from_str(r#"["name"]"#).unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["name"]"#);
    }

    #[test]
    fn segment_display() {
        assert_eq!(Segment::Index(4).to_string(), "4");
        assert_eq!(Segment::Field("name".into()).to_string(), "name");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Splitting an accepted dot path and joining it again is the identity.
        #[test]
        fn dotted_round_trip(segments in prop::collection::vec("[a-zA-Z0-9_]{1,8}", 1..6)) {
            let dotted = segments.join(".");
            let split = split_dotted(&dotted).unwrap();
            prop_assert_eq!(join_dotted(&split), dotted.clone());
            prop_assert_eq!(FieldPath::parse_dotted(&dotted).unwrap().to_dotted(), dotted);
        }

        /// Every usize renders to text that parses back to itself.
        #[test]
        fn index_text_round_trip(index in any::<usize>()) {
            prop_assert_eq!(parse_index(&index.to_string()), Some(index));
        }

        /// Negative numbers never parse as indices.
        #[test]
        fn negative_index_rejected(index in 1..i64::MAX) {
            let text = format!("-{index}");
            prop_assert_eq!(parse_index(&text), None);
        }
    }
}
