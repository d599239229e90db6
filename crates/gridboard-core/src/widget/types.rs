//! Canonical widget type identifiers and legacy name normalization.
//!
//! Layouts saved by older versions store widget types either as PascalCase
//! identifiers or as Korean display names. [`normalize_widget_type`] maps
//! both onto the canonical kebab-case ids and passes anything else through.

use super::instance::WidgetInstance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of widget kinds the dashboard can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    ProjectSummary,
    TaskTracker,
    TaxDeadline,
    TaxCalculator,
    RevenueChart,
    KpiMetrics,
    TodoList,
    Calendar,
    RecentActivity,
    TimeTracker,
    Pomodoro,
    Custom,
}

impl WidgetType {
    pub const ALL: [WidgetType; 12] = [
        WidgetType::ProjectSummary,
        WidgetType::TaskTracker,
        WidgetType::TaxDeadline,
        WidgetType::TaxCalculator,
        WidgetType::RevenueChart,
        WidgetType::KpiMetrics,
        WidgetType::TodoList,
        WidgetType::Calendar,
        WidgetType::RecentActivity,
        WidgetType::TimeTracker,
        WidgetType::Pomodoro,
        WidgetType::Custom,
    ];

    /// Canonical kebab-case id.
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetType::ProjectSummary => "project-summary",
            WidgetType::TaskTracker => "task-tracker",
            WidgetType::TaxDeadline => "tax-deadline",
            WidgetType::TaxCalculator => "tax-calculator",
            WidgetType::RevenueChart => "revenue-chart",
            WidgetType::KpiMetrics => "kpi-metrics",
            WidgetType::TodoList => "todo-list",
            WidgetType::Calendar => "calendar",
            WidgetType::RecentActivity => "recent-activity",
            WidgetType::TimeTracker => "time-tracker",
            WidgetType::Pomodoro => "pomodoro",
            WidgetType::Custom => "custom",
        }
    }

    /// Human-readable name shown in the UI.
    pub fn display_name(self) -> &'static str {
        match self {
            WidgetType::ProjectSummary => "프로젝트 요약",
            WidgetType::TaskTracker => "작업 추적기",
            WidgetType::TaxDeadline => "세무 일정",
            WidgetType::TaxCalculator => "세금 계산기",
            WidgetType::RevenueChart => "매출 차트",
            WidgetType::KpiMetrics => "KPI 지표",
            WidgetType::TodoList => "할 일 목록",
            WidgetType::Calendar => "캘린더",
            WidgetType::RecentActivity => "최근 활동",
            WidgetType::TimeTracker => "시간 추적기",
            WidgetType::Pomodoro => "뽀모도로 타이머",
            WidgetType::Custom => "사용자 정의",
        }
    }

    /// Look up a canonical id. Legacy names are not accepted here.
    pub fn from_canonical(id: &str) -> Option<Self> {
        WidgetType::ALL.into_iter().find(|t| t.as_str() == id)
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PascalCase identifiers written by the first layout format.
const LEGACY_IDENTIFIERS: &[(&str, WidgetType)] = &[
    ("ProjectSummary", WidgetType::ProjectSummary),
    ("TaskTracker", WidgetType::TaskTracker),
    ("TaxDeadline", WidgetType::TaxDeadline),
    ("TaxCalculator", WidgetType::TaxCalculator),
    ("KPIMetrics", WidgetType::KpiMetrics),
    ("TodoList", WidgetType::TodoList),
    ("Calendar", WidgetType::Calendar),
    ("RecentActivity", WidgetType::RecentActivity),
    ("TimeTracker", WidgetType::TimeTracker),
    ("Pomodoro", WidgetType::Pomodoro),
];

/// Display names (and their aliases) written by the second layout format.
const DISPLAY_NAMES: &[(&str, WidgetType)] = &[
    ("프로젝트 요약", WidgetType::ProjectSummary),
    ("작업 추적기", WidgetType::TaskTracker),
    ("세무 일정", WidgetType::TaxDeadline),
    ("세금 마감일", WidgetType::TaxDeadline),
    ("세금 계산기", WidgetType::TaxCalculator),
    ("매출 차트", WidgetType::RevenueChart),
    ("수익 차트", WidgetType::RevenueChart),
    ("KPI 지표", WidgetType::KpiMetrics),
    ("할 일 목록", WidgetType::TodoList),
    ("캘린더", WidgetType::Calendar),
    ("최근 활동", WidgetType::RecentActivity),
    ("시간 추적기", WidgetType::TimeTracker),
    ("뽀모도로 타이머", WidgetType::Pomodoro),
    ("뽀모도로", WidgetType::Pomodoro),
    ("사용자 정의", WidgetType::Custom),
];

fn lookup(table: &[(&str, WidgetType)], key: &str) -> Option<WidgetType> {
    table.iter().find(|(name, _)| *name == key).map(|(_, t)| *t)
}

/// Resolve any known spelling of a widget type.
pub fn resolve_widget_type(input: &str) -> Option<WidgetType> {
    WidgetType::from_canonical(input)
        .or_else(|| lookup(LEGACY_IDENTIFIERS, input))
        .or_else(|| lookup(DISPLAY_NAMES, input))
}

/// Map a stored widget type onto its canonical id.
///
/// Unrecognized input is returned unchanged with a warning.
pub fn normalize_widget_type(input: &str) -> String {
    match resolve_widget_type(input) {
        Some(t) => t.as_str().to_string(),
        None => {
            log::warn!("Unknown widget type '{}', leaving as-is", input);
            input.to_string()
        }
    }
}

/// Display name for a canonical id. Unrecognized ids pass through.
pub fn get_widget_display_name(widget_type: &str) -> String {
    WidgetType::from_canonical(widget_type)
        .map(|t| t.display_name().to_string())
        .unwrap_or_else(|| widget_type.to_string())
}

/// Normalize the type of every widget record.
pub fn migrate_widget_types(widgets: Vec<WidgetInstance>) -> Vec<WidgetInstance> {
    widgets
        .into_iter()
        .map(|mut widget| {
            let normalized = normalize_widget_type(&widget.widget_type);
            if normalized != widget.widget_type {
                log::debug!(
                    "Migrated widget {} type '{}' -> '{}'",
                    widget.id,
                    widget.widget_type,
                    normalized
                );
                widget.widget_type = normalized;
            }
            widget
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GridPosition;

    #[test]
    fn test_canonical_passes_through() {
        for t in WidgetType::ALL {
            assert_eq!(normalize_widget_type(t.as_str()), t.as_str());
        }
    }

    #[test]
    fn test_display_name_maps_to_canonical() {
        assert_eq!(normalize_widget_type("프로젝트 요약"), "project-summary");
        assert_eq!(normalize_widget_type("매출 차트"), "revenue-chart");
        assert_eq!(normalize_widget_type("수익 차트"), "revenue-chart");
    }

    #[test]
    fn test_legacy_identifier_maps_to_canonical() {
        assert_eq!(normalize_widget_type("TaxCalculator"), "tax-calculator");
        assert_eq!(normalize_widget_type("KPIMetrics"), "kpi-metrics");
    }

    #[test]
    fn test_revenue_chart_identifier_is_not_legacy() {
        assert_eq!(normalize_widget_type("RevenueChart"), "RevenueChart");
        assert_eq!(resolve_widget_type("RevenueChart"), None);
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(normalize_widget_type("weather"), "weather");
    }

    #[test]
    fn test_display_name_roundtrip() {
        for t in WidgetType::ALL {
            let name = get_widget_display_name(t.as_str());
            assert_eq!(normalize_widget_type(&name), t.as_str());
        }
        assert_eq!(get_widget_display_name("weather"), "weather");
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&WidgetType::KpiMetrics).unwrap();
        assert_eq!(json, "\"kpi-metrics\"");
    }

    #[test]
    fn test_migrate_widget_types() {
        let widgets = vec![
            WidgetInstance::new("a", "TaskTracker", GridPosition::default()),
            WidgetInstance::new("b", "캘린더", GridPosition::default()),
            WidgetInstance::new("c", "mystery", GridPosition::default()),
        ];
        let migrated = migrate_widget_types(widgets);
        let types: Vec<_> = migrated.iter().map(|w| w.widget_type.as_str()).collect();
        assert_eq!(types, vec!["task-tracker", "calendar", "mystery"]);
    }
}
