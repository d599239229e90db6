//! Widget records, types, and interaction state.
//!
//! Widgets are pure data ([`WidgetInstance`]) owned by the dashboard store.
//! Interaction state (hover, selection, dragging) lives separately in the
//! [`WidgetManager`], and the [`WidgetRegistry`] describes each widget kind.

mod handles;
mod instance;
mod manager;
mod registry;
mod state;
mod types;

pub use handles::{Handle, HandleKind, hit_test_handle, widget_handles};
pub use instance::WidgetInstance;
pub use manager::WidgetManager;
pub use registry::{WidgetDescriptor, WidgetRegistry};
pub use state::WidgetState;
pub use types::{
    WidgetType, get_widget_display_name, migrate_widget_types, normalize_widget_type,
    resolve_widget_type,
};
