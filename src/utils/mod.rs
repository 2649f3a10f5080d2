//! Shared helpers.

pub mod encoding;

pub use encoding::{decode_text, DecodeError};
