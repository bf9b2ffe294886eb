//! Wordstream Server Library
//!
//! Document ingestion for word-at-a-time reading: plain text, EPUB and PDF
//! (or pasted text) reduced to one flat word stream with a position index.
//!
//! # Modules
//!
//! - `document`: Canonical model, error taxonomy, extractor traits, position lookups
//! - `validator`: Size/format checks run before any extraction
//! - `formats`: Per-format extractors (TXT, EPUB, PDF)
//! - `tokenizer`: Word stream with ORP and delay metadata
//! - `pipeline`: End-to-end parse and the single-flight loader
//! - `routes`: HTTP reading-session API

pub mod config;
pub mod document;
pub mod error;
pub mod formats;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod tokenizer;
pub mod validator;
