//! Error type definitions for the EPG merger
//!
//! This module defines all error types used throughout the crate. It uses
//! `thiserror` for the trait implementations and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Filesystem errors outside of input loading (output, config)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML tree or serialization errors
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// The first input of a merge group could not be loaded
    #[error("Base document unavailable for {output}: {reason}")]
    MissingBase { output: PathBuf, reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Reasons an input document is skipped
#[derive(Error, Debug)]
pub enum LoadError {
    /// The path does not exist
    #[error("File does not exist: {}", path.display())]
    Missing { path: PathBuf },

    /// The file exists but could not be read or is not well-formed XML
    #[error("Failed to parse {}: {message}", path.display())]
    Unparseable { path: PathBuf, message: String },
}

/// XML tree construction and serialization errors
#[derive(Error, Debug)]
pub enum XmlError {
    /// Reader errors from quick-xml
    #[error("XML parsing error at byte {position}: {source}")]
    Parse {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// Structurally broken documents (mismatched tags, stray content)
    #[error("Malformed document: {message}")]
    Malformed { message: String },

    /// The document contained no root element
    #[error("Document has no root element")]
    NoRoot,

    /// Serialization failures
    #[error("Failed to write XML: {0}")]
    Write(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing base error for a merge group output
    pub fn missing_base<P: Into<PathBuf>, S: Into<String>>(output: P, reason: S) -> Self {
        Self::MissingBase {
            output: output.into(),
            reason: reason.into(),
        }
    }
}

impl LoadError {
    /// Create a missing file error
    pub fn missing<P: Into<PathBuf>>(path: P) -> Self {
        Self::Missing { path: path.into() }
    }

    /// Create an unparseable file error
    pub fn unparseable<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Unparseable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Path of the input that failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Missing { path } | Self::Unparseable { path, .. } => path,
        }
    }
}

impl XmlError {
    /// Create a malformed document error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
