// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error handling for partitioning runs
//!
//! Fatal errors (missing keys, bad bucket counts, unconvertible key values)
//! abort a run before or during the scan. Sink failures are collected per
//! segment and surfaced together once every segment has been attempted.

use std::fmt;

use crate::partition::bucket_index::SegmentKey;

/// Coarse classification of a [`SkyhookError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    KeyError = 2,
    TypeError = 3,
    Invalid = 4,
    IoError = 5,
    IndexError = 7,
    SerializationError = 11,
    ConfigError = 15,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::KeyError => write!(f, "Key error"),
            Code::TypeError => write!(f, "Type error"),
            Code::Invalid => write!(f, "Invalid"),
            Code::IoError => write!(f, "IO error"),
            Code::IndexError => write!(f, "Index error"),
            Code::SerializationError => write!(f, "Serialization error"),
            Code::ConfigError => write!(f, "Configuration error"),
        }
    }
}

/// An object that could not be stored
#[derive(Debug)]
pub struct WriteFailure {
    pub object_name: String,
    /// Segment the object was written for; `None` for column partitions
    pub segment: Option<SegmentKey>,
    pub error: SkyhookError,
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.segment {
            Some(segment) => write!(f, "{} ({}): {}", self.object_name, segment, self.error),
            None => write!(f, "{}: {}", self.object_name, self.error),
        }
    }
}

/// Main error type for partitioning operations
#[derive(thiserror::Error, Debug)]
pub enum SkyhookError {
    #[error("Missing primary key column: {0}")]
    MissingPrimaryKey(String),

    #[error("Key column not found: {0}")]
    MissingKeyColumn(String),

    #[error("Invalid bucket count {0}: must be >= 1")]
    InvalidBucketCount(i64),

    #[error("Key column '{column}' row {row}: {reason}")]
    KeyConversion {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Sink error for object '{object}': {message}")]
    Sink { object: String, message: String },

    #[error("{} object write(s) failed ({written} written): {}", .failures.len(), format_failures(.failures))]
    SegmentWrites {
        failures: Vec<WriteFailure>,
        written: usize,
    },

    #[error("Invalid operation: {0}")]
    Invalid(String),

    #[error("Index out of bounds: {0}")]
    IndexError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_failures(failures: &[WriteFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SkyhookError {
    /// Build a sink error for a named object
    pub fn sink(object: impl Into<String>, message: impl fmt::Display) -> Self {
        SkyhookError::Sink {
            object: object.into(),
            message: message.to_string(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> Code {
        match self {
            SkyhookError::MissingPrimaryKey(_) => Code::KeyError,
            SkyhookError::MissingKeyColumn(_) => Code::KeyError,
            SkyhookError::InvalidBucketCount(_) => Code::Invalid,
            SkyhookError::KeyConversion { .. } => Code::TypeError,
            SkyhookError::Sink { .. } => Code::IoError,
            SkyhookError::SegmentWrites { .. } => Code::IoError,
            SkyhookError::Invalid(_) => Code::Invalid,
            SkyhookError::IndexError(_) => Code::IndexError,
            SkyhookError::Serialization(_) => Code::SerializationError,
            SkyhookError::Config(_) => Code::ConfigError,
            SkyhookError::Arrow(_) => Code::Invalid,
            SkyhookError::Io(_) => Code::IoError,
            SkyhookError::Json(_) => Code::ConfigError,
        }
    }

    /// Whether the error aborts the run before or during the scan
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SkyhookError::MissingPrimaryKey(_)
                | SkyhookError::MissingKeyColumn(_)
                | SkyhookError::InvalidBucketCount(_)
                | SkyhookError::KeyConversion { .. }
        )
    }
}

/// Type alias for Results using SkyhookError
pub type SkyhookResult<T> = Result<T, SkyhookError>;
