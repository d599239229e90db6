//! Gridboard Application
//!
//! Headless shell around the dashboard layout engine: layout inspection,
//! migration of stored layouts, and scripted drag simulation.

mod app;
mod shortcuts;

pub use app::{App, AppConfig, CliError, Overrides, SimulationReport};
pub use shortcuts::ShortcutRegistry;
