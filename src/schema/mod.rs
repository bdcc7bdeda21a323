//! History export schema
//!
//! This module defines the raw record shape of watch and search history
//! exports, the adapter that turns records into normalized events, and the
//! reader that pulls the history files out of an export archive.

mod adapter;
mod archive;
mod record;

pub use adapter::*;
pub use archive::*;
pub use record::*;
