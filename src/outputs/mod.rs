//! Rendered views of the article list.
//!
//! # Submodules
//!
//! - [`email`]: Plain-text and HTML bodies of the new-article digest
//! - [`page`]: HTML home page listing recently published articles

pub mod email;
pub mod page;
