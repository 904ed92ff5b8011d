//! # bitrecord
//!
//! Declarative binary record layouts compiled into typed accessors over
//! shared byte buffers.
//!
//! Describe an object record as an ordered list of named fields (bitfields,
//! big-endian integers and floats, fixed-capacity strings or nested records)
//! or an array record as `n` elements of one type. Compiling the description
//! allocates bit offsets and generates the get/set logic once; binding the
//! compiled type to a buffer yields a zero-copy [Record] view whose setters
//! validate every value before writing.
//!
//! ## Example
//!
//! ```
//! use bitrecord::{Buffer, Context, ObjectDef, Value};
//!
//! let ctx = Context::new();
//! let example = ctx
//!     .define_object(
//!         &ObjectDef::new("Example")
//!             .field_at("a", "uint8", 0)
//!             .field_at("flag", "bit1", 8)
//!             .field_at("b", "int16", 16),
//!     )
//!     .unwrap();
//! assert_eq!(example.byte_length(), 4);
//!
//! let buffer = Buffer::new(4);
//! let record = example.bind(&buffer, 0).unwrap();
//! record.set("a", 255).unwrap();
//! record.set("flag", 1).unwrap();
//! record.set("b", -2).unwrap();
//!
//! assert_eq!(record.get("b").unwrap(), Value::Int(-2));
//! assert_eq!(buffer.to_vec(), vec![0xff, 0x80, 0xff, 0xfe]);
//! assert!(record.set("a", 256).is_err());
//! ```

pub mod accessor;
pub mod array;
pub mod bits;
pub mod buffer;
pub mod context;
pub mod data_type;
pub mod encoding;
pub mod errors;
pub mod field;
mod object;
pub mod record;
pub mod sequence;
#[cfg(feature = "serde")]
pub mod serde;
pub mod uid;
pub mod value;

pub use accessor::Accessor;
pub use array::ArrayRecord;
pub use buffer::{Buffer, ByteView};
pub use context::Context;
pub use data_type::DataType;
pub use encoding::{StdEncoder, TextEncoder};
pub use errors::{Error, Result};
pub use field::ObjectDef;
pub use record::{Record, RecordType};
pub use sequence::IndexedSequence;
pub use uid::Uid;
pub use value::Value;
