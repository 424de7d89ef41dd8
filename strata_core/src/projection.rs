// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registered projection codes.
//!
//! Map layers name the projection their source is published in. Creating a
//! layer in a projection the map cannot transform is rejected up front, before
//! any renderable is built.

use alloc::collections::BTreeSet;
use alloc::string::String;

/// Projection assumed when a map layer spec does not name one.
pub const DEFAULT_PROJECTION: &str = "EPSG:3857";

/// The set of projection codes the map can display.
///
/// Codes are compared case-insensitively (`epsg:4326` matches `EPSG:4326`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectionRegistry {
    codes: BTreeSet<String>,
}

impl Default for ProjectionRegistry {
    /// Web Mercator and WGS 84, which every map supports.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_PROJECTION);
        registry.register("EPSG:4326");
        registry
    }
}

impl ProjectionRegistry {
    /// Creates a registry with no codes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            codes: BTreeSet::new(),
        }
    }

    /// Registers `code`. Returns `false` if it was already present.
    pub fn register(&mut self, code: &str) -> bool {
        self.codes.insert(normalize(code))
    }

    /// Returns whether `code` is registered.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&normalize(code))
    }

    /// Iterates the registered codes in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
