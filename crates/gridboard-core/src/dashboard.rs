//! Dashboard layout store.
//!
//! [`Dashboard`] is the single owner of the widget collection. Every change to
//! a widget's placement goes through [`Dashboard::apply`], which validates the
//! command against the grid bounds, lock flags and other widgets before
//! committing it and recording an undo snapshot.

use crate::geometry::{GridDelta, GridPosition, GridSize, constrain_to_grid};
use crate::widget::{WidgetInstance, WidgetRegistry, migrate_widget_types, normalize_widget_type};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Layout errors.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Widget not found: {0}")]
    NotFound(String),
    #[error("Widget {id} would overlap widget {other}")]
    Collision { id: String, other: String },
    #[error("Widget {0} is locked")]
    Locked(String),
    #[error("No free space for a {width}x{height} widget")]
    NoSpace { width: u32, height: u32 },
    #[error("Invalid widget size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// A mutation of the widget collection.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutCommand {
    /// Place a new widget. Without a position the first free slot is used.
    Add {
        widget_type: String,
        position: Option<GridPosition>,
        config: Option<Value>,
    },
    Remove { id: String },
    /// Move the top-left corner to an absolute cell.
    Move { id: String, x: u32, y: u32 },
    /// Move by a number of cells.
    MoveBy { id: String, d_col: i32, d_row: i32 },
    Resize { id: String, width: u32, height: u32 },
    SetLocked { id: String, locked: bool },
    UpdateConfig { id: String, config: Value },
}

impl LayoutCommand {
    /// Id of the widget the command targets, if it already exists.
    pub fn target(&self) -> Option<&str> {
        match self {
            LayoutCommand::Add { .. } => None,
            LayoutCommand::Remove { id }
            | LayoutCommand::Move { id, .. }
            | LayoutCommand::MoveBy { id, .. }
            | LayoutCommand::Resize { id, .. }
            | LayoutCommand::SetLocked { id, .. }
            | LayoutCommand::UpdateConfig { id, .. } => Some(id),
        }
    }
}

/// What a successfully applied command changed.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    Added { id: String, position: GridPosition },
    Removed { widget: WidgetInstance },
    Moved { id: String, from: GridPosition, to: GridPosition },
    Resized { id: String, from: GridPosition, to: GridPosition },
    LockChanged { id: String, locked: bool },
    ConfigUpdated { id: String },
    /// The command was valid but left the layout as it was.
    Unchanged { id: String },
}

impl LayoutEvent {
    pub fn id(&self) -> &str {
        match self {
            LayoutEvent::Removed { widget } => &widget.id,
            LayoutEvent::Added { id, .. }
            | LayoutEvent::Moved { id, .. }
            | LayoutEvent::Resized { id, .. }
            | LayoutEvent::LockChanged { id, .. }
            | LayoutEvent::ConfigUpdated { id }
            | LayoutEvent::Unchanged { id } => id,
        }
    }
}

/// A snapshot of layout state for undo/redo.
#[derive(Debug, Clone)]
struct LayoutSnapshot {
    grid_size: GridSize,
    widgets: HashMap<String, WidgetInstance>,
    order: Vec<String>,
}

/// On-disk layout, as written by [`Dashboard::to_json`].
#[derive(Debug, Serialize, Deserialize)]
struct PersistedLayout {
    #[serde(rename = "gridSize", default)]
    grid_size: Option<String>,
    #[serde(default)]
    widgets: Vec<WidgetInstance>,
}

/// Older layouts are a bare array of widget records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LayoutFile {
    Bare(Vec<WidgetInstance>),
    Full(PersistedLayout),
}

/// The widget collection of one dashboard.
#[derive(Debug, Clone)]
pub struct Dashboard {
    grid_size: GridSize,
    widgets: HashMap<String, WidgetInstance>,
    /// Display order (insertion order).
    order: Vec<String>,
    registry: WidgetRegistry,
    undo_stack: Vec<LayoutSnapshot>,
    redo_stack: Vec<LayoutSnapshot>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(GridSize::default())
    }
}

impl Dashboard {
    /// Create an empty dashboard using the built-in widget registry.
    pub fn new(grid_size: GridSize) -> Self {
        Self::with_registry(grid_size, WidgetRegistry::with_defaults())
    }

    pub fn with_registry(grid_size: GridSize, registry: WidgetRegistry) -> Self {
        Self {
            grid_size,
            widgets: HashMap::new(),
            order: Vec::new(),
            registry,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn grid_size(&self) -> GridSize {
        self.grid_size
    }

    pub fn columns(&self) -> u32 {
        self.grid_size.columns()
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn get(&self, id: &str) -> Option<&WidgetInstance> {
        self.widgets.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.contains_key(id)
    }

    /// Widgets in display order.
    pub fn widgets(&self) -> impl Iterator<Item = &WidgetInstance> {
        self.order.iter().filter_map(|id| self.widgets.get(id))
    }

    /// Widget ids in display order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            grid_size: self.grid_size,
            widgets: self.widgets.clone(),
            order: self.order.clone(),
        }
    }

    fn restore(&mut self, snapshot: LayoutSnapshot) {
        self.grid_size = snapshot.grid_size;
        self.widgets = snapshot.widgets;
        self.order = snapshot.order;
    }

    /// Push current state to undo stack (call before making changes).
    fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                let current = self.snapshot();
                self.redo_stack.push(current);
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone change. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snapshot) => {
                let current = self.snapshot();
                self.undo_stack.push(current);
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// First widget other than `id` that `position` would overlap.
    pub fn collision(&self, id: Option<&str>, position: &GridPosition) -> Option<&str> {
        self.widgets()
            .filter(|w| Some(w.id.as_str()) != id)
            .find(|w| w.position.overlaps(position))
            .map(|w| w.id.as_str())
    }

    /// First free slot for a widget of the given span, scanning row by row.
    pub fn find_free_slot(&self, width: u32, height: u32) -> Option<GridPosition> {
        let occupied: Vec<GridPosition> = self.widgets().map(|w| w.position).collect();
        free_slot(&occupied, self.columns(), width, height)
    }

    /// Move widgets that ended up on top of earlier ones to a free slot.
    ///
    /// Widgets keep their display order priority: the earlier widget stays
    /// put. A widget that cannot be relocated at its size is shrunk to one
    /// cell, and dropped when the grid is full.
    fn resolve_overlaps(&mut self) {
        let columns = self.columns();
        let mut occupied: Vec<GridPosition> = Vec::with_capacity(self.order.len());
        let mut dropped = Vec::new();
        for id in &self.order {
            let Some(widget) = self.widgets.get_mut(id) else {
                continue;
            };
            let position = widget.position;
            if !occupied.iter().any(|p| p.overlaps(&position)) {
                occupied.push(position);
                continue;
            }
            let slot = free_slot(&occupied, columns, position.width, position.height)
                .or_else(|| free_slot(&occupied, columns, 1, 1));
            match slot {
                Some(to) => {
                    log::warn!(
                        "Widget {} overlaps another widget, relocating {:?} to {:?}",
                        id,
                        position,
                        to
                    );
                    widget.position = to;
                    occupied.push(to);
                }
                None => {
                    log::warn!("No room left for widget {}, dropping it", id);
                    dropped.push(id.clone());
                }
            }
        }
        for id in &dropped {
            self.widgets.remove(id);
        }
        self.order.retain(|id| !dropped.contains(id));
    }

    fn unlocked(&self, id: &str) -> LayoutResult<&WidgetInstance> {
        let widget = self
            .widgets
            .get(id)
            .ok_or_else(|| LayoutError::NotFound(id.to_string()))?;
        if widget.locked {
            return Err(LayoutError::Locked(id.to_string()));
        }
        Ok(widget)
    }

    fn check_collision(&self, id: &str, position: &GridPosition) -> LayoutResult<()> {
        match self.collision(Some(id), position) {
            Some(other) => Err(LayoutError::Collision {
                id: id.to_string(),
                other: other.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Validate and commit a command.
    pub fn apply(&mut self, command: LayoutCommand) -> LayoutResult<LayoutEvent> {
        log::debug!("Applying {:?}", command);
        match command {
            LayoutCommand::Add {
                widget_type,
                position,
                config,
            } => self.add(widget_type, position, config),
            LayoutCommand::Remove { id } => {
                if !self.widgets.contains_key(&id) {
                    return Err(LayoutError::NotFound(id));
                }
                self.push_undo();
                self.order.retain(|other| *other != id);
                let widget = self
                    .widgets
                    .remove(&id)
                    .ok_or_else(|| LayoutError::NotFound(id.clone()))?;
                Ok(LayoutEvent::Removed { widget })
            }
            LayoutCommand::Move { id, x, y } => {
                let from = self.unlocked(&id)?.position;
                let (x, y) =
                    constrain_to_grid(x as i64, y as i64, from.width, from.height, self.columns());
                self.reposition(id, from, GridPosition { x, y, ..from }, false)
            }
            LayoutCommand::MoveBy { id, d_col, d_row } => {
                let from = self.unlocked(&id)?.position;
                let (x, y) = from.offset(GridDelta { d_col, d_row });
                let (x, y) = constrain_to_grid(x, y, from.width, from.height, self.columns());
                self.reposition(id, from, GridPosition { x, y, ..from }, false)
            }
            LayoutCommand::Resize { id, width, height } => {
                if width == 0 || height == 0 {
                    return Err(LayoutError::InvalidSize { width, height });
                }
                let widget = self.unlocked(&id)?;
                let from = widget.position;
                let (min_w, min_h) = self.registry.min_size(&widget.widget_type);
                let columns = self.columns();
                let width = width.max(min_w).min(columns.saturating_sub(from.x)).max(1);
                let height = height.max(min_h).min(columns.saturating_sub(from.y)).max(1);
                self.reposition(id, from, GridPosition { width, height, ..from }, true)
            }
            LayoutCommand::SetLocked { id, locked } => {
                let current = self
                    .widgets
                    .get(&id)
                    .ok_or_else(|| LayoutError::NotFound(id.clone()))?
                    .locked;
                if current == locked {
                    return Ok(LayoutEvent::Unchanged { id });
                }
                self.push_undo();
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.locked = locked;
                }
                Ok(LayoutEvent::LockChanged { id, locked })
            }
            LayoutCommand::UpdateConfig { id, config } => {
                if !self.widgets.contains_key(&id) {
                    return Err(LayoutError::NotFound(id));
                }
                self.push_undo();
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.config = config;
                }
                Ok(LayoutEvent::ConfigUpdated { id })
            }
        }
    }

    fn add(
        &mut self,
        widget_type: String,
        position: Option<GridPosition>,
        config: Option<Value>,
    ) -> LayoutResult<LayoutEvent> {
        let widget_type = normalize_widget_type(&widget_type);
        let id = Uuid::new_v4().to_string();
        let position = match position {
            Some(position) => {
                let position = position.clamped(self.columns());
                self.check_collision(&id, &position)?;
                position
            }
            None => {
                let (width, height) = self.registry.default_size(&widget_type);
                self.find_free_slot(width, height)
                    .ok_or(LayoutError::NoSpace { width, height })?
            }
        };
        let config = config
            .or_else(|| self.registry.default_config(&widget_type))
            .unwrap_or_else(|| Value::Object(Default::default()));

        self.push_undo();
        let widget = WidgetInstance::new(id.clone(), widget_type, position).with_config(config);
        self.order.push(id.clone());
        self.widgets.insert(id.clone(), widget);
        Ok(LayoutEvent::Added { id, position })
    }

    fn reposition(
        &mut self,
        id: String,
        from: GridPosition,
        to: GridPosition,
        resize: bool,
    ) -> LayoutResult<LayoutEvent> {
        if from == to {
            return Ok(LayoutEvent::Unchanged { id });
        }
        self.check_collision(&id, &to)?;
        self.push_undo();
        if let Some(widget) = self.widgets.get_mut(&id) {
            widget.position = to;
        }
        Ok(if resize {
            LayoutEvent::Resized { id, from, to }
        } else {
            LayoutEvent::Moved { id, from, to }
        })
    }

    /// Change the column count and clamp every widget back inside the grid.
    pub fn set_grid_size(&mut self, grid_size: GridSize) {
        if grid_size == self.grid_size {
            return;
        }
        self.push_undo();
        self.grid_size = grid_size;
        let columns = self.columns();
        for widget in self.widgets.values_mut() {
            let clamped = widget.position.clamped(columns);
            if clamped != widget.position {
                log::debug!(
                    "Clamped widget {} from {:?} to {:?}",
                    widget.id,
                    widget.position,
                    clamped
                );
                widget.position = clamped;
            }
        }
        self.resolve_overlaps();
    }

    /// Build a dashboard from widget records, migrating and clamping them.
    pub fn from_widgets(grid_size: GridSize, widgets: Vec<WidgetInstance>) -> Self {
        let mut dashboard = Self::new(grid_size);
        let columns = dashboard.columns();
        let mut seen = HashSet::new();
        for mut widget in migrate_widget_types(widgets) {
            if !seen.insert(widget.id.clone()) {
                log::warn!("Dropping widget with duplicate id '{}'", widget.id);
                continue;
            }
            if !widget.position.fits(columns) {
                let clamped = widget.position.clamped(columns);
                log::warn!(
                    "Widget {} does not fit a {} grid, clamping {:?} to {:?}",
                    widget.id,
                    grid_size,
                    widget.position,
                    clamped
                );
                widget.position = clamped;
            }
            dashboard.order.push(widget.id.clone());
            dashboard.widgets.insert(widget.id.clone(), widget);
        }
        dashboard.resolve_overlaps();
        dashboard
    }

    /// Parse a persisted layout, either `{ gridSize, widgets }` or a bare array.
    pub fn from_json(json: &str) -> LayoutResult<Self> {
        let (grid_size, widgets) = match serde_json::from_str::<LayoutFile>(json)? {
            LayoutFile::Bare(widgets) => (GridSize::default(), widgets),
            LayoutFile::Full(layout) => (
                layout
                    .grid_size
                    .as_deref()
                    .map(GridSize::parse_lossy)
                    .unwrap_or_default(),
                layout.widgets,
            ),
        };
        Ok(Self::from_widgets(grid_size, widgets))
    }

    pub fn to_json(&self) -> LayoutResult<String> {
        let layout = PersistedLayout {
            grid_size: Some(self.grid_size.as_str().to_string()),
            widgets: self.widgets().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&layout)?)
    }

    pub fn load(path: &Path) -> LayoutResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> LayoutResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// First placement of the given span that overlaps nothing in `occupied`.
fn free_slot(
    occupied: &[GridPosition],
    columns: u32,
    width: u32,
    height: u32,
) -> Option<GridPosition> {
    let columns = columns.max(1);
    let width = width.clamp(1, columns);
    let height = height.clamp(1, columns);
    for y in 0..=(columns - height) {
        for x in 0..=(columns - width) {
            let candidate = GridPosition::new(x, y, width, height);
            if !occupied.iter().any(|p| p.overlaps(&candidate)) {
                return Some(candidate);
            }
        }
    }
    None
}
