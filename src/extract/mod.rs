//! Text extraction module
//!
//! This module handles pulling structured data out of raw text:
//! - Comments from C-style and JSX source files
//! - `path:line` style file references from free text (source or model replies)

pub mod comment;
pub mod reference;

pub use comment::{CommentExtractor, CommentForm, CommentRecord};
pub use reference::{
    extract_references, linkify, parse_single_reference, FileReference, LinkPayload,
};
