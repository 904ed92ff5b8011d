//! DataType tokens: the external vocabulary resolved to [Accessor]s.
//!
//! Grammar of textual tokens (whitespace inside parentheses is ignored):
//!
//! ```text
//! int8  | int16  | int32  | int(8|16|32)
//! uint8 | uint16 | uint32 | uint(8|16|32)
//! float32 | float64 | float(32|64)
//! bit0 .. bit7 | bit(0..7)
//! string(<encoding>, <byteLength>)
//! ```
//!
//! A previously compiled record type is referenced directly with
//! [DataType::Record].

use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    accessor::Accessor,
    errors::{Error, Result},
    record::RecordType,
};

/// Designates exactly one [Accessor].
#[derive(Debug, Clone)]
pub enum DataType {
    /// Textual primitive token, parsed on resolution.
    Named(String),
    /// Already-resolved accessor.
    Accessor(Accessor),
    /// Nested record type.
    Record(Arc<RecordType>),
}

impl DataType {
    /// Resolves the token to its accessor.
    pub fn resolve(&self) -> Result<Accessor> {
        match self {
            DataType::Named(token) => parse_token(token),
            DataType::Accessor(accessor) => Ok(accessor.clone()),
            DataType::Record(record) => Ok(Accessor::Record(record.clone())),
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parses and validates a token eagerly.
    fn from_str(s: &str) -> Result<Self> {
        parse_token(s).map(DataType::Accessor)
    }
}

impl From<&str> for DataType {
    fn from(value: &str) -> Self {
        DataType::Named(value.to_string())
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        DataType::Named(value)
    }
}

impl From<Accessor> for DataType {
    fn from(value: Accessor) -> Self {
        DataType::Accessor(value)
    }
}

impl From<Arc<RecordType>> for DataType {
    fn from(value: Arc<RecordType>) -> Self {
        DataType::Record(value)
    }
}

impl From<&Arc<RecordType>> for DataType {
    fn from(value: &Arc<RecordType>) -> Self {
        DataType::Record(value.clone())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Named(token) => f.write_str(token),
            DataType::Accessor(accessor) => f.write_str(&accessor.name()),
            DataType::Record(record) => f.write_str(record.name()),
        }
    }
}

/// Parses a primitive token into its accessor.
pub fn parse_token(token: &str) -> Result<Accessor> {
    let unknown = || Error::UnknownType(token.to_string());
    let token = token.trim();

    let (head, args) = match token.find('(') {
        Some(open) => {
            let inner = token[open + 1..].strip_suffix(')').ok_or_else(unknown)?;
            let args: Vec<&str> = inner.split(',').map(str::trim).collect();
            (token[..open].trim(), Some(args))
        }
        None => {
            let split = token
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(token.len());
            let (head, width) = token.split_at(split);
            (head, (!width.is_empty()).then(|| vec![width]))
        }
    };

    let width = |args: &Option<Vec<&str>>| -> Result<u32> {
        match args.as_deref() {
            Some([w]) => w.parse().map_err(|_| unknown()),
            _ => Err(unknown()),
        }
    };

    let accessor = match head {
        "bit" => Accessor::bit(width(&args)?),
        "int" => Accessor::int(width(&args)?),
        "uint" => Accessor::uint(width(&args)?),
        "float" => Accessor::float(width(&args)?),
        "string" => match args.as_deref() {
            Some([encoding, len]) if !encoding.is_empty() => {
                let byte_length = len.parse().map_err(|_| unknown())?;
                Ok(Accessor::string(*encoding, byte_length))
            }
            _ => Err(unknown()),
        },
        _ => Err(unknown()),
    };

    accessor.map_err(|_| unknown())
}
