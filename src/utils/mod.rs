//! Collaborators used by the conversion pipeline
//!
//! - `http`: fetching source bytes
//! - `images`: decoding and the output format table
//! - `files`: output naming and writing

pub mod files;
pub mod http;
pub mod images;
