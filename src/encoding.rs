//! Text encoding strategy used by string fields.
//!
//! String accessors never encode text themselves: they call the
//! [TextEncoder] installed on the [crate::context::Context] at the time the
//! record type was defined. [StdEncoder] is a dependency-free reference
//! implementation covering UTF-8, ASCII and Latin-1.

use std::fmt;

use crate::errors::{Error, Result};

/// Pluggable conversion between text and its encoded bytes.
pub trait TextEncoder: Send + Sync + fmt::Debug {
    /// Whether `name` is an encoding this strategy understands.
    fn encoding_exists(&self, name: &str) -> bool;

    /// Encodes `text` using the encoding `name`.
    fn encode(&self, text: &str, name: &str) -> Result<Vec<u8>>;

    /// Decodes `bytes` using the encoding `name`.
    fn decode(&self, bytes: &[u8], name: &str) -> Result<String>;
}

/// Character encodings understood by [StdEncoder].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8. Any valid UTF-8 byte sequence is accepted.
    Utf8,
    /// ASCII. Every byte must be in 0..=0x7F.
    Ascii,
    /// ISO-8859-1. Every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Looks up an encoding by its (case-insensitive) label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Some(Encoding::Utf8),
            "ascii" | "us-ascii" => Some(Encoding::Ascii),
            "latin1" | "latin-1" | "iso-8859-1" => Some(Encoding::Latin1),
            _ => None,
        }
    }
}

/// [TextEncoder] built on the standard library.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEncoder;

impl StdEncoder {
    fn lookup(name: &str) -> Result<Encoding> {
        Encoding::from_label(name)
            .ok_or_else(|| Error::Configuration(format!("unknown encoding {name:?}")))
    }
}

impl TextEncoder for StdEncoder {
    fn encoding_exists(&self, name: &str) -> bool {
        Encoding::from_label(name).is_some()
    }

    fn encode(&self, text: &str, name: &str) -> Result<Vec<u8>> {
        match Self::lookup(name)? {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => {
                if !text.is_ascii() {
                    return Err(Error::Encoding {
                        encoding: name.to_string(),
                        reason: "text contains non-ASCII characters".to_string(),
                    });
                }
                Ok(text.as_bytes().to_vec())
            }
            Encoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| Error::Encoding {
                        encoding: name.to_string(),
                        reason: format!("{c:?} is outside Latin-1"),
                    })
                })
                .collect(),
        }
    }

    fn decode(&self, bytes: &[u8], name: &str) -> Result<String> {
        match Self::lookup(name)? {
            Encoding::Ascii => {
                if let Some(b) = bytes.iter().find(|b| **b > 0x7F) {
                    return Err(Error::Encoding {
                        encoding: name.to_string(),
                        reason: format!("byte 0x{b:02x} is not ASCII"),
                    });
                }
                utf8(bytes, name)
            }
            Encoding::Utf8 => utf8(bytes, name),
            Encoding::Latin1 => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
        }
    }
}

fn utf8(bytes: &[u8], name: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::Encoding {
        encoding: name.to_string(),
        reason: e.to_string(),
    })
}
