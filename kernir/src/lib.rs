//! Intermediate representation of kerning for feature writing.
//!
//! Sources (UFO, designspace, in-memory) expose kerning through
//! [`source::KerningSource`]; the backend classifies it and writes feature text.

pub mod error;
pub mod groups;
pub mod ir;
pub mod source;
pub mod types;
