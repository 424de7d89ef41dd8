// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tool configuration and user callbacks.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LayerError, Result};
use crate::layer::{LayerKind, LayerRecord};
use crate::ordering::ReorderDelta;

/// Tool-wide button switches for one list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KindButtons {
    /// Hide the create button above the list.
    pub disable_create: bool,
    /// Hide every item's rename button.
    pub disable_edit: bool,
    /// Hide every item's download button.
    pub disable_download: bool,
    /// Hide every item's delete button.
    pub disable_delete: bool,
}

impl KindButtons {
    /// Every button shown.
    #[must_use]
    pub const fn editable() -> Self {
        Self {
            disable_create: false,
            disable_edit: false,
            disable_download: false,
            disable_delete: false,
        }
    }

    /// Only visibility and ordering remain available.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            disable_create: true,
            disable_edit: true,
            disable_download: true,
            disable_delete: true,
        }
    }
}

/// Configuration for a [`LayerTool`](super::LayerTool).
///
/// Decodes from camelCase JSON; every field has a default, so `{}` is a valid
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerToolConfig {
    /// Key the tool state is stored under.
    pub storage_key: String,
    /// Prefix of the per-list collapse flags.
    pub toolbox_id: String,
    /// Characters of a layer name shown before the ellipsis.
    pub name_display_length: usize,
    /// Map layer list buttons.
    pub map: KindButtons,
    /// Feature layer list buttons.
    pub feature: KindButtons,
    /// Format preselected in the download dialog.
    pub default_download_format: String,
}

impl Default for LayerToolConfig {
    fn default() -> Self {
        Self {
            storage_key: String::from(Self::DEFAULT_STORAGE_KEY),
            toolbox_id: String::from("strata-toolbox"),
            name_display_length: 20,
            map: KindButtons::editable(),
            feature: KindButtons::editable(),
            default_download_format: String::from("geojson"),
        }
    }
}

impl LayerToolConfig {
    /// Storage key used when none is configured.
    pub const DEFAULT_STORAGE_KEY: &'static str = "strata-layer-tool";

    /// Configuration for an embedded map whose layers the user may only show,
    /// hide, and reorder.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            map: KindButtons::read_only(),
            feature: KindButtons::read_only(),
            ..Self::default()
        }
    }

    /// Decodes a configuration from JSON, filling in missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Config`] if `json` is not a valid configuration
    /// object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| LayerError::Config(err.to_string()))
    }

    /// Button switches for `kind`.
    #[must_use]
    pub fn buttons(&self, kind: LayerKind) -> &KindButtons {
        match kind {
            LayerKind::Map => &self.map,
            LayerKind::Feature => &self.feature,
        }
    }
}

/// Callback receiving the affected record.
pub type RecordCallback = Rc<dyn Fn(&LayerRecord)>;

/// Callback receiving a finished reorder.
pub type DragCallback = Rc<dyn Fn(&ReorderDelta)>;

/// User callbacks for one list.
#[derive(Clone, Default)]
pub struct KindCallbacks {
    /// A layer was added by a user action.
    pub added: Option<RecordCallback>,
    /// A layer was removed by a user action.
    pub removed: Option<RecordCallback>,
    /// A layer was renamed.
    pub renamed: Option<RecordCallback>,
    /// A layer was shown or hidden.
    pub visibility_changed: Option<RecordCallback>,
    /// The list was reordered.
    pub dragged: Option<DragCallback>,
}

impl fmt::Debug for KindCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindCallbacks")
            .field("added", &self.added.is_some())
            .field("removed", &self.removed.is_some())
            .field("renamed", &self.renamed.is_some())
            .field("visibility_changed", &self.visibility_changed.is_some())
            .field("dragged", &self.dragged.is_some())
            .finish()
    }
}

/// User callbacks for both lists.
#[derive(Clone, Debug, Default)]
pub struct LayerCallbacks {
    /// Map layer callbacks.
    pub map: KindCallbacks,
    /// Feature layer callbacks.
    pub feature: KindCallbacks,
}

impl LayerCallbacks {
    /// Callbacks for `kind`.
    #[must_use]
    pub fn for_kind(&self, kind: LayerKind) -> &KindCallbacks {
        match kind {
            LayerKind::Map => &self.map,
            LayerKind::Feature => &self.feature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(LayerToolConfig::from_json("{}").unwrap(), LayerToolConfig::default());
    }

    #[test]
    fn partial_json_fills_the_rest() {
        let config = LayerToolConfig::from_json(
            r#"{"toolboxId":"left","nameDisplayLength":8,"feature":{"disableDelete":true}}"#,
        )
        .unwrap();
        assert_eq!(config.toolbox_id, "left");
        assert_eq!(config.name_display_length, 8);
        assert!(config.buttons(LayerKind::Feature).disable_delete);
        assert!(!config.buttons(LayerKind::Map).disable_delete);
        assert_eq!(config.storage_key, LayerToolConfig::DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = LayerToolConfig::from_json(r#"{"nameDisplayLength":"long"}"#).unwrap_err();
        assert!(matches!(err, LayerError::Config(_)));
    }

    #[test]
    fn read_only_preset_disables_every_button() {
        let config = LayerToolConfig::read_only();
        assert_eq!(config.map, KindButtons::read_only());
        assert_eq!(config.feature, KindButtons::read_only());
    }
}
