//! Payload codecs selected by an element's `type` attribute.
//!
//! | tag     | encoding                               |
//! |---------|----------------------------------------|
//! | `qword` | lowercase hex of a 64-bit integer      |
//! | `text`  | the string itself                      |
//! | `hex`   | lowercase hex of raw bytes             |
//! | other   | domain specific named sub-attributes   |

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Qword,
    Text,
    Hex,
    Custom(String),
}

impl TypeTag {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "qword" => Self::Qword,
            "text" => Self::Text,
            "hex" => Self::Hex,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Qword => "qword",
            Self::Text => "text",
            Self::Hex => "hex",
            Self::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────
// Numbers
// ────────────────────────────────────────────────────────────────

/// Zero-padded lowercase hex of the two's complement bit pattern.
pub fn encode_qword(value: i64) -> String {
    format!("{:016x}", value as u64)
}

/// Accepts any digit count up to 16; negative values come back through the
/// bit pattern, so `encode_qword(-1)` decodes to `-1`.
pub fn decode_qword(text: &str) -> Option<i64> {
    u64::from_str_radix(text.trim(), 16).ok().map(|v| v as i64)
}

pub fn encode_dword(value: u32) -> String {
    format!("{:08x}", value)
}

pub fn decode_dword(text: &str) -> Option<u32> {
    u32::from_str_radix(text.trim(), 16).ok()
}

// ────────────────────────────────────────────────────────────────
// Blobs
// ────────────────────────────────────────────────────────────────

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn decode_hex(text: &str) -> Option<Vec<u8>> {
    hex::decode(text.trim()).ok()
}

// ────────────────────────────────────────────────────────────────
// Flag lists
// ────────────────────────────────────────────────────────────────

/// Render the known bits of `flags` as a space separated list of names.
/// Bits without a name are dropped.
pub fn flags_to_string(flags: u64, names: &[(u64, &str)]) -> String {
    names
        .iter()
        .filter(|(bit, _)| flags & bit == *bit && *bit != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inverse of [`flags_to_string`]. Separators may be spaces, `|` or `,`;
/// names are matched case-insensitively and unknown names are ignored.
pub fn string_to_flags(text: &str, names: &[(u64, &str)]) -> u64 {
    text.split(|c: char| c.is_whitespace() || c == '|' || c == ',')
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            names
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(token))
                .map(|(bit, _)| *bit)
        })
        .fold(0, |acc, bit| acc | bit)
}
