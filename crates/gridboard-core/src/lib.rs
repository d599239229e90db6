//! Gridboard Core Library
//!
//! Platform-agnostic layout engine for a drag-and-drop dashboard of widgets:
//! grid geometry, responsive cell sizing, spring animation, accessibility
//! announcements, widget type normalization and lazy mounting.

pub mod announcer;
pub mod cell_size;
pub mod config;
pub mod context;
pub mod controller;
pub mod dashboard;
pub mod drag;
pub mod geometry;
pub mod keyboard;
pub mod lazy;
pub mod scheduler;
pub mod spring;
pub mod widget;

pub use announcer::{A11yAction, Announcer, AnnouncerError, Politeness};
pub use cell_size::{CellSizeTracker, GridParams, ResizeSubscription, SizeSource};
pub use config::{ConfigError, DashboardConfig, SpringSetting};
pub use context::{ContextError, GridContext, GridInputs, GridProvider, Scope};
pub use controller::{DashboardController, PollOutcome, WidgetFrame, widget_frame};
pub use dashboard::{Dashboard, LayoutCommand, LayoutError, LayoutEvent, LayoutResult};
pub use drag::{DragKind, DragSession};
pub use geometry::{
    GridCoord, GridDelta, GridError, GridPosition, GridSize, cell_size, columns_for_size,
    constrain_to_grid, delta_to_grid_units, grid_to_pixel, pixel_to_grid, widget_pixel_size,
    widget_rect,
};
pub use keyboard::{Key, KeyCommand, Modifiers, map_key};
pub use lazy::{LazyLoader, LazyOptions, intersection_ratio};
pub use scheduler::{Clock, DebounceTimer, FrameScheduler, ManualClock, SystemClock};
pub use spring::{
    Spring, Spring2D, SpringAnimation, SpringConfig, SpringError, SpringPhase, SpringPreset,
};
pub use widget::{
    WidgetInstance, WidgetManager, WidgetRegistry, WidgetState, WidgetType,
    get_widget_display_name, migrate_widget_types, normalize_widget_type,
};
