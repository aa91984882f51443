//! PDF accessibility audit engine.
//!
//! Loads a document with `lopdf`, walks its structure tree and runs the
//! EGOVMON and WCAG 2.0 PDF checks, producing an AWAM result map and a
//! per-test memo (see [`analyze`]).

use thiserror::Error;

pub mod analysis;
pub mod artifacts;
pub mod backend;
pub mod checks;
pub mod config;
pub mod numbers;
pub mod pages;
pub mod structure;
pub mod wcag;

#[cfg(test)]
mod fixtures;

pub use analysis::{analyze, analyze_document, inspect, Analysis, AnalysisOutcome};
pub use backend::{LopdfBackend, PdfBackend};
pub use checks::DocumentSummary;
pub use config::AnalysisConfig;

#[derive(Debug, Error)]
pub enum WamError {
    #[error("cannot decrypt document: {0}")]
    DecryptionFailed(String),
    #[error("unsupported encryption: {0}")]
    UnsupportedAlgorithm(String),
    #[error("unreadable document: {0}")]
    UnreadableDocument(String),
    #[error("content stream error: {0}")]
    Content(String),
    #[error("unexpected {class}: {message}")]
    UnexpectedInternalError { class: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
