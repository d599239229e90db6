//! A widget placed on the dashboard.

use crate::geometry::GridPosition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn empty_config() -> Value {
    Value::Object(Default::default())
}

/// One widget record, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetInstance {
    pub id: String,
    /// Widget type id. Canonical after migration, but unknown values are kept.
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub position: GridPosition,
    /// Per-type settings, opaque to the layout engine.
    #[serde(default = "empty_config")]
    pub config: Value,
    #[serde(default)]
    pub locked: bool,
}

impl WidgetInstance {
    /// Create an unlocked widget with empty settings.
    pub fn new(id: impl Into<String>, widget_type: impl Into<String>, position: GridPosition) -> Self {
        Self {
            id: id.into(),
            widget_type: widget_type.into(),
            position,
            config: empty_config(),
            locked: false,
        }
    }

    /// Set the settings blob.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Set the locked flag.
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_persisted_record() {
        let widget: WidgetInstance = serde_json::from_value(json!({
            "id": "w1",
            "type": "todo-list",
            "position": { "x": 1, "y": 0, "width": 2, "height": 1 },
            "config": { "showDone": true },
            "locked": true
        }))
        .unwrap();
        assert_eq!(widget.widget_type, "todo-list");
        assert_eq!(widget.position, GridPosition::new(1, 0, 2, 1));
        assert_eq!(widget.config["showDone"], json!(true));
        assert!(widget.locked);
    }

    #[test]
    fn test_missing_optional_fields() {
        let widget: WidgetInstance =
            serde_json::from_value(json!({ "id": "w2", "type": "calendar" })).unwrap();
        assert_eq!(widget.position, GridPosition::default());
        assert_eq!(widget.config, json!({}));
        assert!(!widget.locked);
    }

    #[test]
    fn test_serializes_type_field() {
        let widget = WidgetInstance::new("w3", "pomodoro", GridPosition::default());
        let value = serde_json::to_value(&widget).unwrap();
        assert_eq!(value["type"], json!("pomodoro"));
        assert!(value.get("widget_type").is_none());
    }
}
