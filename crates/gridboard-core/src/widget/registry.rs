//! Registry of mountable widget kinds.

use super::types::{WidgetType, resolve_widget_type};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Static facts about one widget kind.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDescriptor {
    pub widget_type: WidgetType,
    /// Default span as `(width, height)` in grid units.
    pub default_size: (u32, u32),
    /// Smallest span the widget can be resized to.
    pub min_size: (u32, u32),
    /// Mount a placeholder until the widget scrolls into view.
    pub lazy: bool,
    pub default_config: Value,
}

impl WidgetDescriptor {
    pub fn new(widget_type: WidgetType) -> Self {
        Self {
            widget_type,
            default_size: (1, 1),
            min_size: (1, 1),
            lazy: false,
            default_config: json!({}),
        }
    }

    pub fn with_default_size(mut self, width: u32, height: u32) -> Self {
        self.default_size = (width.max(1), height.max(1));
        self
    }

    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_size = (width.max(1), height.max(1));
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn with_default_config(mut self, config: Value) -> Self {
        self.default_config = config;
        self
    }

    pub fn display_name(&self) -> &'static str {
        self.widget_type.display_name()
    }
}

/// Maps widget types to their descriptors.
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    map: HashMap<WidgetType, WidgetDescriptor>,
}

impl WidgetRegistry {
    /// Registry with every built-in widget kind.
    pub fn with_defaults() -> Self {
        let mut reg = Self::default();
        reg.register(WidgetDescriptor::new(WidgetType::ProjectSummary).with_default_size(2, 1));
        reg.register(
            WidgetDescriptor::new(WidgetType::TaskTracker)
                .with_default_size(1, 2)
                .with_default_config(json!({ "showCompleted": false })),
        );
        reg.register(WidgetDescriptor::new(WidgetType::TaxDeadline));
        reg.register(WidgetDescriptor::new(WidgetType::TaxCalculator));
        reg.register(
            WidgetDescriptor::new(WidgetType::RevenueChart)
                .with_default_size(2, 1)
                .with_min_size(2, 1)
                .lazy()
                .with_default_config(json!({ "period": "monthly" })),
        );
        reg.register(WidgetDescriptor::new(WidgetType::KpiMetrics).with_default_size(2, 1).lazy());
        reg.register(WidgetDescriptor::new(WidgetType::TodoList).with_default_size(1, 2));
        reg.register(WidgetDescriptor::new(WidgetType::Calendar).lazy());
        reg.register(WidgetDescriptor::new(WidgetType::RecentActivity).with_default_size(1, 2));
        reg.register(WidgetDescriptor::new(WidgetType::TimeTracker));
        reg.register(
            WidgetDescriptor::new(WidgetType::Pomodoro)
                .with_default_config(json!({ "workMinutes": 25, "breakMinutes": 5 })),
        );
        reg.register(WidgetDescriptor::new(WidgetType::Custom));
        reg
    }

    /// Add or replace a descriptor.
    pub fn register(&mut self, descriptor: WidgetDescriptor) {
        self.map.insert(descriptor.widget_type, descriptor);
    }

    /// Descriptor for any known spelling of a widget type.
    pub fn resolve(&self, widget_type: &str) -> Option<&WidgetDescriptor> {
        resolve_widget_type(widget_type).and_then(|t| self.map.get(&t))
    }

    pub fn get(&self, widget_type: WidgetType) -> Option<&WidgetDescriptor> {
        self.map.get(&widget_type)
    }

    pub fn contains(&self, widget_type: &str) -> bool {
        self.resolve(widget_type).is_some()
    }

    /// Default settings for a widget type, if registered.
    pub fn default_config(&self, widget_type: &str) -> Option<Value> {
        self.resolve(widget_type).map(|d| d.default_config.clone())
    }

    /// Default span, or 1x1 for unregistered types.
    pub fn default_size(&self, widget_type: &str) -> (u32, u32) {
        self.resolve(widget_type).map(|d| d.default_size).unwrap_or((1, 1))
    }

    /// Minimum span, or 1x1 for unregistered types.
    pub fn min_size(&self, widget_type: &str) -> (u32, u32) {
        self.resolve(widget_type).map(|d| d.min_size).unwrap_or((1, 1))
    }

    /// Registered types in canonical order.
    pub fn types(&self) -> Vec<WidgetType> {
        WidgetType::ALL
            .into_iter()
            .filter(|t| self.map.contains_key(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_all_types() {
        let reg = WidgetRegistry::with_defaults();
        assert_eq!(reg.types().len(), WidgetType::ALL.len());
    }

    #[test]
    fn test_resolve_legacy_names() {
        let reg = WidgetRegistry::with_defaults();
        let d = reg.resolve("할 일 목록").unwrap();
        assert_eq!(d.widget_type, WidgetType::TodoList);
        assert!(reg.resolve("RevenueChart").is_none());
        assert!(reg.resolve("revenue-chart").unwrap().lazy);
    }

    #[test]
    fn test_unknown_type_defaults() {
        let reg = WidgetRegistry::with_defaults();
        assert!(!reg.contains("weather"));
        assert_eq!(reg.default_size("weather"), (1, 1));
        assert_eq!(reg.default_config("weather"), None);
        assert_eq!(
            reg.default_config("pomodoro"),
            Some(json!({ "workMinutes": 25, "breakMinutes": 5 }))
        );
    }
}
