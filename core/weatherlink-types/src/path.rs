//! Node paths used to address values in the node tree.
//!
//! A path is absolute and `/`-separated (`/`, `/temp`, `/station/temp`).
//! Field names coming from upstream documents may contain any character,
//! so [`NodePath::child`] percent-encodes the characters that are not
//! allowed inside a segment. Distinct names always map to distinct paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters that are escaped when a name becomes a path segment.
const RESERVED: &[char] = &[
    '/', '\\', '?', '*', ':', '|', '<', '>', '$', '@', ',', '\'', '"', '%',
];

/// Errors produced when building or parsing node paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("node path must start with '/': {0:?}")]
    NotAbsolute(String),

    #[error("node path contains an empty segment: {0:?}")]
    EmptySegment(String),

    #[error("node path contains a control character: {0:?}")]
    ControlCharacter(String),

    #[error("invalid percent-encoding in segment: {0:?}")]
    InvalidEncoding(String),
}

/// Absolute path of a node in the tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parses an absolute path.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if !s.starts_with('/') {
            return Err(PathError::NotAbsolute(s.to_string()));
        }
        if s == "/" {
            return Ok(Self::root());
        }
        if s.chars().any(char::is_control) {
            return Err(PathError::ControlCharacter(s.to_string()));
        }
        if s[1..].split('/').any(str::is_empty) {
            return Err(PathError::EmptySegment(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Resolves a percent-encoded URL path (leading `/` optional) to a node
    /// path. Each segment is decoded, then re-encoded with
    /// [`encode_segment`], so `rain%2F1h` and `sdk%20version` land on the
    /// nodes `/rain%2F1h` and `/sdk version`.
    pub fn from_url_path(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut path = String::with_capacity(trimmed.len() + 1);
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            path.push('/');
            path.push_str(&encode_segment(&decode_segment(segment)?));
        }
        Ok(Self(path))
    }

    /// Returns the path of a child node named `name`.
    ///
    /// The name is encoded with [`encode_segment`], so it always lands in a
    /// single segment directly below `self`.
    pub fn child(&self, name: &str) -> Result<Self, PathError> {
        if name.is_empty() {
            return Err(PathError::EmptySegment(self.0.clone()));
        }
        let segment = encode_segment(name);
        if self.is_root() {
            Ok(Self(format!("/{segment}")))
        } else {
            Ok(Self(format!("{}/{segment}", self.0)))
        }
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The last (still encoded) segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// The parent path, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodePath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encodes a name into a single path segment.
///
/// Reserved characters and control characters are replaced by the
/// uppercase `%XX` form of each of their UTF-8 bytes.
pub fn encode_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if RESERVED.contains(&ch) || ch.is_control() {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Reverses [`encode_segment`].
pub fn decode_segment(segment: &str) -> Result<String, PathError> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment
                .get(i + 1..i + 3)
                .ok_or_else(|| PathError::InvalidEncoding(segment.to_string()))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| PathError::InvalidEncoding(segment.to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| PathError::InvalidEncoding(segment.to_string()))
}
