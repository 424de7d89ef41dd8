// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event pretty-printing, JSON journals, and registry snapshots for strata
//! diagnostics.
//!
//! Everything here listens on a
//! [`LayerManager`](strata_core::registry::LayerManager) from the outside:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`journal::Journal`]: events as JSON values, exportable as an array.
//! - [`snapshot`]: the registry's current contents as JSON, plus
//!   [`snapshot::check`] for order and visibility consistency.

pub mod journal;
pub mod pretty;
pub mod snapshot;
