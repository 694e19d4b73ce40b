//! The library code for the `folio` site tool. A build is a single pass over
//! the articles directory, in four steps:
//!
//! 1. Scanning the article documents into records ([`crate::parser`], which
//!    delegates the per-document rules to [`crate::article`])
//! 2. Sorting the records newest first and cutting them into pages
//!    ([`crate::write`])
//! 3. Rendering each page into the listing template and writing it to disk
//!    ([`crate::listing`], [`crate::write`])
//! 4. Writing the search index ([`crate::search`])
//!
//! [`crate::build`] runs the steps in order. Nothing is cached between runs:
//! the records are rebuilt from the documents every time, so the output is a
//! function of the documents alone.
//!
//! Documents are read with [`scraper`] and edited through [`crate::html`],
//! which applies edits to a copy of the parsed tree and serializes it with
//! html5ever. The same edits back the management commands in
//! [`crate::manage`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod build;
pub mod config;
pub mod html;
pub mod listing;
pub mod manage;
pub mod markdown;
pub mod palette;
pub mod parser;
pub mod search;
pub mod util;
pub mod write;
