//! # SearchSync FTS
//!
//! An in-memory [`IndexingEngine`](searchsync_core::IndexingEngine) backed by
//! an inverted index. It is small enough to embed in tests and tools, and it
//! answers the same token queries a hosted engine would.
//!
//! - [`Tokenizer`] splits attribute text into normalized tokens
//! - [`FtsEngine`] stores one token set per document and answers queries

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod tokenizer;

pub use engine::FtsEngine;
pub use tokenizer::{Tokenizer, TokenizerConfig};
