// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for layer operations.
//!
//! Every error here is detected before the registry is mutated: a failed
//! operation leaves layers, list, and persisted state exactly as they were.
//! Operations on ids that are no longer registered are not errors; they are
//! silent no-ops, since persisted state may legitimately lag the registry.

use alloc::string::String;

use thiserror::Error;

use crate::layer::{BuildError, LayerId, LayerKind};

/// Errors reported by layer creation, import, and export.
#[derive(Debug, Error, PartialEq)]
pub enum LayerError {
    /// The map layer names a projection the map cannot display.
    #[error("projection `{0}` is not registered")]
    UnregisteredProjection(String),

    /// The map layer extent is not a finite rectangle with positive area.
    #[error("layer extent must be finite with a positive area")]
    InvalidExtent,

    /// A layer with the requested id is already registered.
    #[error("{kind} layer `{id}` already exists")]
    DuplicateId {
        /// Collection the id collides in.
        kind: LayerKind,
        /// The colliding id.
        id: LayerId,
    },

    /// No serialization format is registered under this key, or the format
    /// cannot perform the requested direction.
    #[error("unsupported format `{0}`")]
    UnsupportedFormat(String),

    /// Input could not be parsed in the selected format.
    #[error("malformed {format} input: {message}")]
    Parse {
        /// Format name.
        format: &'static str,
        /// What went wrong.
        message: String,
    },

    /// The rendering library failed to build the layer.
    #[error("failed to create layer `{name}`")]
    Construction {
        /// Name from the spec.
        name: String,
        /// The factory's error.
        #[source]
        source: BuildError,
    },

    /// Tool configuration could not be decoded.
    #[error("invalid layer tool configuration: {0}")]
    Config(String),
}

/// Result type for layer operations.
pub type Result<T> = core::result::Result<T, LayerError>;
