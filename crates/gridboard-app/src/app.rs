//! Headless dashboard shell: inspect, migrate and simulate layouts.

use gridboard_core::scheduler::Duration;
use gridboard_core::{
    ConfigError, ContextError, Dashboard, DashboardConfig, DashboardController, FrameScheduler,
    GridInputs, GridProvider, GridSize, LayoutError, LayoutEvent, ManualClock, SizeSource,
    cell_size, get_widget_display_name, widget_rect,
};
use kurbo::{Rect, Vec2};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Frame cap for settling springs in a simulation.
const MAX_SIMULATION_FRAMES: usize = 10_000;

/// Errors surfaced by the command-line shell.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("{0}")]
    Context(#[from] ContextError),
    #[error("no widget with id `{0}` in the layout")]
    UnknownWidget(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Application configuration: the dashboard file plus the host container.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub dashboard: DashboardConfig,
    /// Container width in pixels.
    pub width: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dashboard: DashboardConfig::default(),
            width: 964.0,
        }
    }
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub grid: Option<String>,
    pub width: Option<f64>,
    pub gap: Option<f64>,
    pub padding: Option<f64>,
}

impl AppConfig {
    /// Load the dashboard config (defaults if absent) and apply overrides.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, CliError> {
        let dashboard = match path {
            Some(path) => DashboardConfig::load(path)?,
            None => DashboardConfig::default(),
        };
        let mut config = Self {
            dashboard,
            ..Self::default()
        };
        if let Some(grid) = overrides.grid {
            config.dashboard.grid_size = Some(grid);
        }
        if let Some(width) = overrides.width {
            config.width = width;
        }
        if let Some(gap) = overrides.gap {
            config.dashboard.gap = gap;
        }
        if let Some(padding) = overrides.padding {
            config.dashboard.padding = padding;
        }
        config.dashboard.sanitize();
        Ok(config)
    }
}

/// Result of a simulated drag.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub committed: bool,
    /// Frames run until every spring settled.
    pub frames: usize,
    pub rect: Option<Rect>,
    pub announcements: Vec<String>,
}

/// The headless application.
pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn load_layout(&self, layout: &Path) -> Result<Dashboard, CliError> {
        let mut dashboard = Dashboard::load(layout)?;
        let current = dashboard.grid_size();
        if let Some(grid) = self.config.dashboard.grid_override().filter(|g| *g != current) {
            log::info!("Resizing layout grid from {} to {}", current, grid);
            dashboard.set_grid_size(grid);
        }
        log::info!(
            "Loaded {} widget(s) from {}",
            dashboard.len(),
            layout.display()
        );
        Ok(dashboard)
    }

    /// Print every widget with its grid placement and pixel rect.
    pub fn inspect(&self, layout: &Path, out: &mut dyn Write) -> Result<(), CliError> {
        let dashboard = self.load_layout(layout)?;
        let cfg = &self.config.dashboard;
        let grid = dashboard.grid_size();
        let cell = cell_size(self.config.width, grid, cfg.gap, cfg.padding);
        writeln!(
            out,
            "grid {} ({} columns), width {}px, cell {}px",
            grid,
            grid.columns(),
            self.config.width,
            cell
        )?;
        for widget in dashboard.widgets() {
            let rect = widget_rect(&widget.position, cell, cfg.gap, cfg.padding);
            let lazy = dashboard
                .registry()
                .resolve(&widget.widget_type)
                .is_some_and(|d| d.lazy);
            writeln!(
                out,
                "{:<38} {:<16} {:<12} at ({}, {}) {}x{}  px [{:.0}, {:.0}, {:.0}, {:.0}]{}{}",
                widget.id,
                widget.widget_type,
                get_widget_display_name(&widget.widget_type),
                widget.position.x,
                widget.position.y,
                widget.position.width,
                widget.position.height,
                rect.x0,
                rect.y0,
                rect.x1,
                rect.y1,
                if widget.locked { "  locked" } else { "" },
                if lazy { "  lazy" } else { "" },
            )?;
        }
        Ok(())
    }

    /// Normalize a layout and write it to `output`, or to `out` when absent.
    pub fn migrate(
        &self,
        layout: &Path,
        output: Option<&PathBuf>,
        out: &mut dyn Write,
    ) -> Result<usize, CliError> {
        let dashboard = self.load_layout(layout)?;
        match output {
            Some(path) => {
                dashboard.save(path)?;
                log::info!("Wrote migrated layout to {}", path.display());
            }
            None => writeln!(out, "{}", dashboard.to_json()?)?,
        }
        Ok(dashboard.len())
    }

    /// Drag widget `id` by a pixel delta in edit mode and let it settle.
    pub fn simulate(
        &self,
        layout: &Path,
        id: &str,
        delta: Vec2,
        out: &mut dyn Write,
    ) -> Result<SimulationReport, CliError> {
        let dashboard = self.load_layout(layout)?;
        let cfg = &self.config.dashboard;
        let grid: GridSize = dashboard.grid_size();

        let container = SizeSource::with_width(self.config.width);
        let root = GridProvider::new(GridInputs {
            grid_size: grid,
            gap: cfg.gap,
            padding: cfg.padding,
            cell_size: cell_size(self.config.width, grid, cfg.gap, cfg.padding),
            is_edit_mode: false,
            container,
            viewport: None,
        });
        let scheduler = FrameScheduler::new();
        let clock = ManualClock::new();
        let mut controller = DashboardController::new(
            &root.scope(),
            dashboard,
            cfg.clone(),
            &scheduler,
            clock.clone(),
        )?;
        controller.set_edit_mode(true);

        let start = controller
            .target_frame(id)
            .ok_or_else(|| CliError::UnknownWidget(id.to_string()))?
            .center();
        controller.pointer_down(start);
        controller.pointer_move(start + delta);
        let result = controller.pointer_up(start + delta);
        let committed = matches!(
            result,
            Some(Ok(LayoutEvent::Moved { .. } | LayoutEvent::Resized { .. }))
        );

        let frames = scheduler.run_until_idle(MAX_SIMULATION_FRAMES);
        if controller.is_animating() {
            log::warn!("Springs still moving after {} frames", frames);
        }
        clock.advance(cfg.announce_delay() + Duration::from_millis(1));
        controller.poll();

        let rect = controller
            .widget_frames()
            .into_iter()
            .find(|frame| frame.id == id)
            .map(|frame| frame.rect);
        let report = SimulationReport {
            committed,
            frames,
            rect,
            announcements: controller.announcements().to_vec(),
        };

        let outcome = if committed { "moved" } else { "unchanged" };
        writeln!(out, "{} after {} frame(s)", outcome, frames)?;
        if let Some(rect) = report.rect {
            writeln!(
                out,
                "final rect [{:.1}, {:.1}, {:.1}, {:.1}]",
                rect.x0, rect.y0, rect.x1, rect.y1
            )?;
        }
        for message in &report.announcements {
            writeln!(out, "announce: {}", message)?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::GridPosition;
    use std::fs;

    fn write_layout(dir: &Path) -> PathBuf {
        let path = dir.join("layout.json");
        fs::write(
            &path,
            r#"{"gridSize": "3x3", "widgets": [
                {"id": "a", "type": "Calendar", "position": {"x": 0, "y": 0, "width": 1, "height": 1}},
                {"id": "b", "type": "매출 차트", "position": {"x": 1, "y": 0, "width": 2, "height": 1}}
            ]}"#,
        )
        .unwrap();
        path
    }

    fn app() -> App {
        App::new(AppConfig::load(None, Overrides::default()).unwrap())
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        fs::write(&path, r#"{ "grid_size": "2x2", "gap": 8 }"#).unwrap();
        let config = AppConfig::load(
            Some(&path),
            Overrides {
                grid: Some("5x5".to_string()),
                width: Some(1200.0),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.dashboard.grid(), GridSize::FiveByFive);
        assert_eq!(config.dashboard.gap, 8.0);
        assert_eq!(config.width, 1200.0);
    }

    #[test]
    fn test_inspect_lists_widgets() {
        let dir = tempfile::tempdir().unwrap();
        let layout = write_layout(dir.path());
        let mut out = Vec::new();
        app().inspect(&layout, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("grid 3x3 (3 columns), width 964px, cell 300px"));
        assert!(text.contains("revenue-chart"));
        assert!(text.contains("px [16, 16, 316, 316]"));
    }

    #[test]
    fn test_migrate_writes_canonical_types() {
        let dir = tempfile::tempdir().unwrap();
        let layout = write_layout(dir.path());
        let output = dir.path().join("out.json");
        let count = app().migrate(&layout, Some(&output), &mut Vec::new()).unwrap();
        assert_eq!(count, 2);
        let migrated = Dashboard::load(&output).unwrap();
        assert_eq!(migrated.get("a").unwrap().widget_type, "calendar");
        assert_eq!(migrated.get("b").unwrap().widget_type, "revenue-chart");
    }

    #[test]
    fn test_migrate_keeps_layout_grid_size() {
        let dir = tempfile::tempdir().unwrap();
        let layout = dir.path().join("wide.json");
        fs::write(
            &layout,
            r#"{"gridSize": "5x5", "widgets": [
                {"id": "a", "type": "Pomodoro", "position": {"x": 4, "y": 4, "width": 1, "height": 1}}
            ]}"#,
        )
        .unwrap();
        let output = dir.path().join("out.json");
        app().migrate(&layout, Some(&output), &mut Vec::new()).unwrap();
        let migrated = Dashboard::load(&output).unwrap();
        assert_eq!(migrated.grid_size(), GridSize::FiveByFive);
        assert_eq!(migrated.get("a").unwrap().position, GridPosition::new(4, 4, 1, 1));
        assert_eq!(migrated.get("a").unwrap().widget_type, "pomodoro");

        // An explicit grid still wins
        let narrow = App::new(
            AppConfig::load(
                None,
                Overrides {
                    grid: Some("3x3".to_string()),
                    ..Overrides::default()
                },
            )
            .unwrap(),
        );
        narrow.migrate(&layout, Some(&output), &mut Vec::new()).unwrap();
        let migrated = Dashboard::load(&output).unwrap();
        assert_eq!(migrated.grid_size(), GridSize::ThreeByThree);
        assert_eq!(migrated.get("a").unwrap().position, GridPosition::new(2, 2, 1, 1));
    }

    #[test]
    fn test_simulate_moves_and_settles() {
        let dir = tempfile::tempdir().unwrap();
        let layout = write_layout(dir.path());
        let mut out = Vec::new();
        let report = app()
            .simulate(&layout, "a", Vec2::new(0.0, 300.0), &mut out)
            .unwrap();
        assert!(report.committed);
        assert!(report.frames > 0);
        assert!(report.announcements.iter().any(|m| m.contains("widget moved")));
        assert!(String::from_utf8(out).unwrap().contains("announce:"));
    }

    #[test]
    fn test_simulate_unknown_widget() {
        let dir = tempfile::tempdir().unwrap();
        let layout = write_layout(dir.path());
        let err = app()
            .simulate(&layout, "zzz", Vec2::ZERO, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, CliError::UnknownWidget(_)));
    }
}
