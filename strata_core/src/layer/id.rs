// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer identity types.

use alloc::format;
use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};

/// The population a layer belongs to.
///
/// Map layers and feature layers are kept in separate collections with their
/// own dense ordering; a layer is never reordered against the other kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Base and background layers (tiles, imagery, reference vectors).
    Map,
    /// User vector/marker layers. Exactly one may be active.
    Feature,
}

impl LayerKind {
    /// Both kinds, map first.
    pub const ALL: [Self; 2] = [Self::Map, Self::Feature];

    /// Returns the lowercase name used in storage keys and DOM ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Feature => "feature",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque layer identifier, unique within its [`LayerKind`].
///
/// Configured layers carry their own id so that persisted state can be matched
/// to them after a reload; runtime layers get one from an [`IdSource`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Wraps a string as a layer id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Produces ids for layers created without one.
pub trait IdSource {
    /// Returns a fresh id for a layer of `kind`.
    ///
    /// The registry skips ids that collide with a live layer, so sources only
    /// need to be unique in practice, not provably.
    fn next_id(&mut self, kind: LayerKind) -> LayerId;
}

/// Counter-based ids of the form `<prefix>-<kind>-<n>`.
#[derive(Clone, Debug)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    /// Creates a source whose ids start with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("layer")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, kind: LayerKind) -> LayerId {
        let n = self.next;
        self.next += 1;
        LayerId(format!("{}-{}-{n}", self.prefix, kind.as_str()))
    }
}
