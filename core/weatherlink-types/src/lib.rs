//! Core type definitions for the weather responder link.
//!
//! This crate defines the types shared by the node store, the field
//! synchronizer and the link binary:
//! - Node paths, including the encoding of arbitrary field names into a
//!   single path segment
//! - Value types and dynamically typed node values

mod path;
mod value;

pub use path::{NodePath, PathError, decode_segment, encode_segment};
pub use value::{Value, ValueType};
