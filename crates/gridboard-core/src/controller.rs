//! Dashboard controller.
//!
//! Ties the layout store to everything that reacts to it: the cell size
//! tracker and grid provider, per-widget springs, interaction state, drag
//! sessions and the announcer. Hosts forward pointer and key input here, call
//! [`DashboardController::poll`] on every tick, and drive the shared
//! [`FrameScheduler`] once per animation frame.

use crate::announcer::{A11yAction, Announcer};
use crate::cell_size::{CellSizeTracker, GridParams};
use crate::config::DashboardConfig;
use crate::context::{ContextError, GridContext, GridInputs, GridProvider, Scope};
use crate::dashboard::{Dashboard, LayoutCommand, LayoutError, LayoutEvent, LayoutResult};
use crate::drag::{DragKind, DragSession};
use crate::geometry::{GridPosition, GridSize, widget_rect};
use crate::keyboard::{Key, KeyCommand, Modifiers, map_key};
use crate::scheduler::{Clock, FrameScheduler, SystemClock};
use crate::spring::{Spring2D, SpringConfig};
use crate::widget::{WidgetManager, WidgetState, get_widget_display_name, hit_test_handle};
use kurbo::{Point, Rect, Size};
use std::collections::HashMap;
use std::rc::Rc;

/// Resize handle hit tolerance in pixels.
pub const HANDLE_TOLERANCE: f64 = 12.0;

/// Pixel rect of a widget under the given grid context.
///
/// Returns `None` outside a dashboard so standalone widgets can fall back to
/// their own sizing.
pub fn widget_frame(context: Option<&GridContext>, position: &GridPosition) -> Option<Rect> {
    context.map(|ctx| widget_rect(position, ctx.cell_size, ctx.gap, ctx.padding))
}

/// Where a widget is drawn this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetFrame {
    pub id: String,
    /// Spring-interpolated rect in container pixels.
    pub rect: Rect,
    pub state: WidgetState,
    pub locked: bool,
    pub fullscreen: bool,
}

/// What a call to [`DashboardController::poll`] observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PollOutcome {
    /// New cell size, if a resize changed it.
    pub cell_size: Option<f64>,
    /// An announcement batch was published.
    pub announced: bool,
}

/// Position and size springs for one widget.
struct WidgetSprings {
    origin: Spring2D,
    size: Spring2D,
}

impl WidgetSprings {
    fn new(scheduler: &FrameScheduler, rect: Rect, config: SpringConfig) -> Self {
        Self {
            origin: Spring2D::new(scheduler, rect.origin(), config),
            size: Spring2D::new(scheduler, size_point(rect), config),
        }
    }

    fn animate_to(&self, rect: Rect) {
        self.origin.set_target(rect.origin());
        self.size.set_target(size_point(rect));
    }

    fn snap_to(&self, rect: Rect) {
        self.origin.snap_to(rect.origin());
        self.size.snap_to(size_point(rect));
    }

    fn rect(&self) -> Rect {
        let size = self.size.value();
        Rect::from_origin_size(self.origin.value(), Size::new(size.x, size.y))
    }

    fn is_animating(&self) -> bool {
        self.origin.is_animating() || self.size.is_animating()
    }
}

fn size_point(rect: Rect) -> Point {
    Point::new(rect.width(), rect.height())
}

/// The layout-orchestrating component of one dashboard.
pub struct DashboardController<C: Clock = SystemClock> {
    config: DashboardConfig,
    /// Padding outside edit mode.
    base_padding: f64,
    store: Dashboard,
    tracker: CellSizeTracker,
    provider: GridProvider,
    announcer: Announcer<C>,
    manager: WidgetManager,
    drag: Option<DragSession>,
    springs: HashMap<String, WidgetSprings>,
    scheduler: FrameScheduler,
    fullscreen: Option<String>,
}

impl<C: Clock> std::fmt::Debug for DashboardController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardController")
            .field("grid_size", &self.store.grid_size())
            .field("widgets", &self.store.len())
            .field("cell_size", &self.tracker.cell_size())
            .field("selected", &self.manager.selected())
            .field("drag", &self.drag)
            .finish()
    }
}

impl<C: Clock> DashboardController<C> {
    /// Mount a controller beneath a grid provider.
    ///
    /// Fails with [`ContextError::MissingGridContext`] when `scope` carries no
    /// grid context.
    pub fn new(
        scope: &Scope,
        mut store: Dashboard,
        config: DashboardConfig,
        scheduler: &FrameScheduler,
        clock: C,
    ) -> Result<Self, ContextError> {
        let grid = scope.require_grid()?;
        if store.grid_size() != grid.grid_size {
            log::debug!(
                "Dashboard grid {} differs from context grid {}, clamping",
                store.grid_size(),
                grid.grid_size
            );
            store.set_grid_size(grid.grid_size);
        }

        let params = GridParams {
            grid_size: grid.grid_size,
            gap: grid.gap,
            padding: if grid.is_edit_mode {
                config.edit_padding
            } else {
                grid.padding
            },
        };
        let tracker = CellSizeTracker::mount(&grid.container, grid.viewport.as_ref(), params);
        let provider = GridProvider::new(GridInputs {
            grid_size: params.grid_size,
            gap: params.gap,
            padding: params.padding,
            cell_size: tracker.cell_size(),
            is_edit_mode: grid.is_edit_mode,
            container: grid.container.clone(),
            viewport: grid.viewport.clone(),
        });

        let mut controller = Self {
            config,
            base_padding: grid.padding,
            store,
            tracker,
            provider,
            announcer: Announcer::new(clock),
            manager: WidgetManager::new(),
            drag: None,
            springs: HashMap::new(),
            scheduler: scheduler.clone(),
            fullscreen: None,
        };
        controller.sync_springs(false);
        Ok(controller)
    }

    /// Scope handed to child widgets.
    pub fn scope(&self) -> Scope {
        self.provider.scope()
    }

    pub fn context(&self) -> Rc<GridContext> {
        self.provider.context()
    }

    pub fn store(&self) -> &Dashboard {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn announcer(&self) -> &Announcer<C> {
        &self.announcer
    }

    pub fn cell_size(&self) -> f64 {
        self.tracker.cell_size()
    }

    pub fn grid_columns(&self) -> u32 {
        self.store.columns()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.provider.inputs().is_edit_mode
    }

    pub fn selected(&self) -> Option<&str> {
        self.manager.selected()
    }

    pub fn widget_state(&self, id: &str) -> WidgetState {
        self.manager.state(id)
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn fullscreen(&self) -> Option<&str> {
        self.fullscreen.as_deref()
    }

    /// The published announcement batch.
    pub fn announcements(&self) -> &[String] {
        self.announcer.announcements()
    }

    /// Check if any widget spring is still moving.
    pub fn is_animating(&self) -> bool {
        self.springs.values().any(WidgetSprings::is_animating)
    }

    /// Apply resize observations and publish due announcements.
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        if let Some(cell_size) = self.tracker.poll() {
            self.publish(self.is_edit_mode());
            self.sync_springs(false);
            outcome.cell_size = Some(cell_size);
        }
        outcome.announced = self.announcer.poll();
        outcome
    }

    /// Remeasure after a layout change the tracker could not observe.
    pub fn recalculate(&mut self) -> f64 {
        let cell_size = self.tracker.recalculate();
        self.publish(self.is_edit_mode());
        self.sync_springs(false);
        cell_size
    }

    fn publish(&mut self, is_edit_mode: bool) {
        let params = self.tracker.params();
        let updated = self.provider.update(GridInputs {
            grid_size: params.grid_size,
            gap: params.gap,
            padding: params.padding,
            cell_size: self.tracker.cell_size(),
            is_edit_mode,
            container: self.tracker.container().clone(),
            viewport: self.provider.inputs().viewport.clone(),
        });
        if updated {
            log::trace!("Published grid context: cell={}", self.tracker.cell_size());
        }
    }

    fn say(&mut self, action: A11yAction, widget_name: &str) {
        let delay = self.config.announce_delay();
        self.announcer
            .announce_with_delay(action.message(widget_name), delay);
    }

    fn display_name(&self, id: &str) -> Option<String> {
        self.store
            .get(id)
            .map(|w| get_widget_display_name(&w.widget_type))
    }

    fn target_rect(&self, position: &GridPosition) -> Rect {
        let ctx = self.provider.context();
        widget_rect(position, ctx.cell_size, ctx.gap, ctx.padding)
    }

    /// Point every spring at its widget's committed rect.
    fn sync_springs(&mut self, animate: bool) {
        let ctx = self.provider.context();
        let config = self.config.spring_config();
        for widget in self.store.widgets() {
            let rect = widget_rect(&widget.position, ctx.cell_size, ctx.gap, ctx.padding);
            match self.springs.get(&widget.id) {
                Some(springs) if animate => springs.animate_to(rect),
                Some(springs) => springs.snap_to(rect),
                None => {
                    self.springs.insert(
                        widget.id.clone(),
                        WidgetSprings::new(&self.scheduler, rect, config),
                    );
                }
            }
        }
        self.springs.retain(|id, _| self.store.contains(id));
    }

    fn animate_widget(&self, id: &str, position: &GridPosition) {
        if let Some(springs) = self.springs.get(id) {
            springs.animate_to(self.target_rect(position));
        }
    }

    /// Turn edit mode on or off.
    pub fn set_edit_mode(&mut self, is_edit_mode: bool) {
        if is_edit_mode == self.is_edit_mode() {
            return;
        }
        if !is_edit_mode {
            self.cancel_drag();
        }
        let params = GridParams {
            padding: if is_edit_mode {
                self.config.edit_padding
            } else {
                self.base_padding
            },
            ..self.tracker.params()
        };
        self.tracker.set_params(params);
        self.publish(is_edit_mode);
        self.sync_springs(true);
        self.say(
            if is_edit_mode {
                A11yAction::EditOn
            } else {
                A11yAction::EditOff
            },
            "",
        );
    }

    /// Change the column count, clamping widgets into the new grid.
    pub fn set_grid_size(&mut self, grid_size: GridSize) {
        if grid_size == self.store.grid_size() {
            return;
        }
        self.cancel_drag();
        self.store.set_grid_size(grid_size);
        self.after_layout_change();
    }

    /// Select a widget. Returns false for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        let Some(name) = self.display_name(id) else {
            return false;
        };
        if !self.manager.is_selected(id) {
            self.manager.select(id);
            self.say(A11yAction::Select, &name);
        }
        true
    }

    pub fn deselect(&mut self) {
        if let Some(id) = self.manager.clear_selection() {
            let name = self.display_name(&id).unwrap_or(id);
            self.say(A11yAction::Deselect, &name);
        }
    }

    fn cycle_selection(&mut self, forward: bool) {
        let ids = self.store.ids();
        if ids.is_empty() {
            return;
        }
        let len = ids.len();
        let next = match self.manager.selected().and_then(|s| ids.iter().position(|id| id == s)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        let id = ids[next].clone();
        self.select(&id);
    }

    /// Add a widget in the first free slot. Returns its id.
    pub fn add_widget(&mut self, widget_type: &str) -> LayoutResult<String> {
        let event = self.commit(LayoutCommand::Add {
            widget_type: widget_type.to_string(),
            position: None,
            config: None,
        })?;
        Ok(event.id().to_string())
    }

    pub fn remove_widget(&mut self, id: &str) -> LayoutResult<()> {
        self.commit(LayoutCommand::Remove { id: id.to_string() })?;
        Ok(())
    }

    /// Flip the lock flag. Returns the new value.
    pub fn toggle_lock(&mut self, id: &str) -> LayoutResult<bool> {
        let locked = self
            .store
            .get(id)
            .ok_or_else(|| LayoutError::NotFound(id.to_string()))?
            .locked;
        self.commit(LayoutCommand::SetLocked {
            id: id.to_string(),
            locked: !locked,
        })?;
        Ok(!locked)
    }

    /// Show a widget fullscreen, or close it. Returns whether it is now fullscreen.
    pub fn toggle_fullscreen(&mut self, id: &str) -> LayoutResult<bool> {
        let name = self
            .display_name(id)
            .ok_or_else(|| LayoutError::NotFound(id.to_string()))?;
        if self.fullscreen.as_deref() == Some(id) {
            self.fullscreen = None;
            self.say(A11yAction::FullscreenOff, &name);
            Ok(false)
        } else {
            self.fullscreen = Some(id.to_string());
            self.say(A11yAction::FullscreenOn, &name);
            Ok(true)
        }
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_drag();
        let undone = self.store.undo();
        if undone {
            self.after_layout_change();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_drag();
        let redone = self.store.redo();
        if redone {
            self.after_layout_change();
        }
        redone
    }

    /// Bring the tracker, interaction state and springs in line with a store
    /// change that did not come from a single command.
    fn after_layout_change(&mut self) {
        if self.store.grid_size() != self.tracker.params().grid_size {
            self.tracker.set_params(GridParams {
                grid_size: self.store.grid_size(),
                ..self.tracker.params()
            });
            self.publish(self.is_edit_mode());
        }
        for id in self.springs.keys().cloned().collect::<Vec<_>>() {
            if !self.store.contains(&id) {
                self.manager.remove(&id);
            }
        }
        if self
            .fullscreen
            .as_deref()
            .is_some_and(|id| !self.store.contains(id))
        {
            self.fullscreen = None;
        }
        self.sync_springs(true);
    }

    /// Apply a command through the store and announce the outcome.
    pub fn commit(&mut self, command: LayoutCommand) -> LayoutResult<LayoutEvent> {
        let result = self.store.apply(command);
        match &result {
            Ok(event) => self.on_event(event),
            Err(err) => self.report(err),
        }
        self.sync_springs(true);
        result
    }

    fn on_event(&mut self, event: &LayoutEvent) {
        let name = match event {
            LayoutEvent::Removed { widget } => get_widget_display_name(&widget.widget_type),
            other => self
                .display_name(other.id())
                .unwrap_or_else(|| other.id().to_string()),
        };
        let action = match event {
            LayoutEvent::Added { .. } => A11yAction::Add,
            LayoutEvent::Removed { widget } => {
                self.manager.remove(&widget.id);
                if self.fullscreen.as_deref() == Some(widget.id.as_str()) {
                    self.fullscreen = None;
                }
                if self.drag.as_ref().is_some_and(|d| d.widget_id == widget.id) {
                    self.drag = None;
                }
                A11yAction::Remove
            }
            LayoutEvent::Moved { .. } => A11yAction::Move,
            LayoutEvent::Resized { .. } => A11yAction::Resize,
            LayoutEvent::LockChanged { locked: true, .. } => A11yAction::Lock,
            LayoutEvent::LockChanged { locked: false, .. } => A11yAction::Unlock,
            LayoutEvent::ConfigUpdated { .. } | LayoutEvent::Unchanged { .. } => return,
        };
        self.say(action, &name);
    }

    fn report(&mut self, err: &LayoutError) {
        match err {
            LayoutError::Collision { id, .. } => {
                let name = self.display_name(id).unwrap_or_else(|| id.clone());
                self.say(A11yAction::Collision, &name);
            }
            LayoutError::Locked(id) => {
                let name = self.display_name(id).unwrap_or_else(|| id.clone());
                self.announcer
                    .announce_warning(&format!("{name} widget is locked"));
            }
            LayoutError::NoSpace { .. } => {
                self.announcer
                    .announce_error("There is no free space on the dashboard");
            }
            other => {
                log::warn!("Layout command failed: {}", other);
                self.announcer.announce_error(&other.to_string());
            }
        }
    }

    /// Topmost widget under `point`, by committed placement.
    pub fn widget_at(&self, point: Point) -> Option<&str> {
        self.store
            .ids()
            .iter()
            .rev()
            .find(|id| {
                self.store
                    .get(id)
                    .is_some_and(|w| self.target_rect(&w.position).contains(point))
            })
            .map(String::as_str)
    }

    fn begin_drag(&mut self, id: &str, kind: DragKind, point: Point) -> bool {
        let Some(widget) = self.store.get(id) else {
            return false;
        };
        if widget.locked {
            let name = get_widget_display_name(&widget.widget_type);
            self.announcer
                .announce_warning(&format!("{name} widget is locked"));
            return false;
        }
        self.drag = Some(DragSession::pointer(id, kind, point, widget.position));
        let state = match kind {
            DragKind::Move => WidgetState::Dragging,
            DragKind::Resize(_) => WidgetState::Resizing,
        };
        self.manager.begin_manipulation(id, state);
        true
    }

    /// Pointer pressed. Selects the widget under it and, in edit mode, starts
    /// a move or resize. Returns the hit widget.
    pub fn pointer_down(&mut self, point: Point) -> Option<String> {
        if self.drag.is_some() {
            return None;
        }
        let is_edit_mode = self.is_edit_mode();

        if is_edit_mode {
            let handle = self.manager.selected().and_then(|id| {
                let widget = self.store.get(id)?;
                let rect = self.target_rect(&widget.position);
                hit_test_handle(rect, point, HANDLE_TOLERANCE).map(|h| (id.to_string(), h))
            });
            if let Some((id, handle)) = handle {
                self.begin_drag(&id, DragKind::Resize(handle), point);
                return Some(id);
            }
        }

        let Some(id) = self.widget_at(point).map(str::to_string) else {
            self.deselect();
            return None;
        };
        self.select(&id);
        if is_edit_mode {
            self.begin_drag(&id, DragKind::Move, point);
        }
        Some(id)
    }

    /// Pointer moved: update the drag preview or the hover state.
    pub fn pointer_move(&mut self, point: Point) {
        let ctx = self.provider.context();
        match self.drag.as_mut() {
            Some(drag) if !drag.is_keyboard() => {
                let preview = drag.update(point, ctx.cell_size, ctx.gap, ctx.grid_columns);
                let id = drag.widget_id.clone();
                self.animate_widget(&id, &preview);
            }
            Some(_) => {}
            None => {
                let hovered = self.widget_at(point).map(str::to_string);
                self.manager.set_hovered(hovered.as_deref());
            }
        }
    }

    /// Pointer released: commit the drag, if any.
    pub fn pointer_up(&mut self, point: Point) -> Option<LayoutResult<LayoutEvent>> {
        if !self.drag.as_ref().is_some_and(|d| !d.is_keyboard()) {
            return None;
        }
        self.pointer_move(point);
        let drag = self.drag.take()?;
        self.manager.end_manipulation();
        match drag.finish() {
            Some(command) => Some(self.commit(command)),
            None => {
                self.sync_springs(true);
                None
            }
        }
    }

    /// Abandon the active drag and animate the widget home.
    pub fn cancel_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let id = drag.widget_id.clone();
        let original = drag.cancel();
        self.manager.end_manipulation();
        self.animate_widget(&id, &original);
        true
    }

    /// Handle a key press. Returns the command that was carried out, if any.
    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> Option<KeyCommand> {
        let keyboard_drag = self.drag.as_ref().is_some_and(DragSession::is_keyboard);
        let command = map_key(key, modifiers, self.is_edit_mode(), keyboard_drag)?;
        log::trace!("Key {:?} -> {:?}", key, command);
        let selected = self.manager.selected().map(str::to_string);

        match command {
            KeyCommand::SelectNext => self.cycle_selection(true),
            KeyCommand::SelectPrevious => self.cycle_selection(false),
            KeyCommand::Deselect => {
                if !self.cancel_drag() {
                    match self.fullscreen.clone() {
                        Some(id) => {
                            if let Err(err) = self.toggle_fullscreen(&id) {
                                log::debug!("Closing fullscreen skipped: {}", err);
                            }
                        }
                        None => self.deselect(),
                    }
                }
            }
            KeyCommand::ToggleEditMode => self.set_edit_mode(!self.is_edit_mode()),
            KeyCommand::Help => {
                let delay = self.config.announce_delay();
                let help = crate::announcer::help_text(self.is_edit_mode());
                self.announcer.announce_with_delay(help, delay);
            }
            KeyCommand::ToggleFullscreen => {
                if let Some(id) = selected.or_else(|| self.fullscreen.clone()) {
                    if let Err(err) = self.toggle_fullscreen(&id) {
                        log::debug!("Fullscreen toggle skipped: {}", err);
                    }
                }
            }
            KeyCommand::Move(delta) => {
                let id = selected?;
                let _ = self.commit(LayoutCommand::MoveBy {
                    id,
                    d_col: delta.d_col,
                    d_row: delta.d_row,
                });
            }
            KeyCommand::Resize(delta) => {
                let id = selected?;
                let position = self.store.get(&id)?.position;
                let grow = |size: u32, d: i32| (i64::from(size) + i64::from(d)).max(1) as u32;
                let _ = self.commit(LayoutCommand::Resize {
                    id,
                    width: grow(position.width, delta.d_col),
                    height: grow(position.height, delta.d_row),
                });
            }
            KeyCommand::ToggleLock => {
                if let Err(err) = self.toggle_lock(&selected?) {
                    log::debug!("Lock toggle skipped: {}", err);
                }
            }
            KeyCommand::Remove => {
                if let Err(err) = self.remove_widget(&selected?) {
                    log::debug!("Remove skipped: {}", err);
                }
            }
            KeyCommand::PickUp => {
                let id = selected?;
                let widget = self.store.get(&id)?;
                let name = get_widget_display_name(&widget.widget_type);
                if widget.locked {
                    self.announcer
                        .announce_warning(&format!("{name} widget is locked"));
                } else {
                    self.drag = Some(DragSession::keyboard(&id, widget.position));
                    self.manager.begin_manipulation(&id, WidgetState::Dragging);
                    self.say(A11yAction::DragStart, &name);
                }
            }
            KeyCommand::DragMove(delta) => {
                let columns = self.store.columns();
                let drag = self.drag.as_mut()?;
                let preview = drag.nudge(delta, columns);
                let id = drag.widget_id.clone();
                self.animate_widget(&id, &preview);
            }
            KeyCommand::Drop => {
                let drag = self.drag.take()?;
                let id = drag.widget_id.clone();
                let name = self.display_name(&id).unwrap_or_else(|| id.clone());
                self.manager.end_manipulation();
                match drag.finish() {
                    Some(command) => {
                        match self.store.apply(command) {
                            Ok(_) => self.say(A11yAction::DragEnd, &name),
                            Err(LayoutError::Collision { .. }) => {
                                self.say(A11yAction::Collision, &name)
                            }
                            Err(err) => self.report(&err),
                        }
                        self.sync_springs(true);
                    }
                    None => self.say(A11yAction::DragEnd, &name),
                }
            }
            KeyCommand::CancelDrag => {
                if let Some(id) = self.drag.as_ref().map(|d| d.widget_id.clone()) {
                    let name = self.display_name(&id).unwrap_or(id);
                    self.cancel_drag();
                    self.say(A11yAction::DragCancel, &name);
                }
            }
        }
        Some(command)
    }

    /// Current spring-interpolated frames, in display order.
    pub fn widget_frames(&self) -> Vec<WidgetFrame> {
        self.store
            .widgets()
            .filter_map(|widget| {
                let springs = self.springs.get(&widget.id)?;
                Some(WidgetFrame {
                    id: widget.id.clone(),
                    rect: springs.rect(),
                    state: self.manager.state(&widget.id),
                    locked: widget.locked,
                    fullscreen: self.fullscreen.as_deref() == Some(widget.id.as_str()),
                })
            })
            .collect()
    }

    /// Committed (not animated) rect of a widget.
    pub fn target_frame(&self, id: &str) -> Option<Rect> {
        let widget = self.store.get(id)?;
        widget_frame(Some(&self.provider.context()), &widget.position)
    }

    /// Pass the store back, dropping springs and observers.
    pub fn into_store(mut self) -> Dashboard {
        std::mem::take(&mut self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_size::SizeSource;
    use crate::geometry::GridPosition;
    use crate::scheduler::{Duration, ManualClock};
    use crate::widget::WidgetInstance;

    struct Fixture {
        container: SizeSource,
        scheduler: FrameScheduler,
        clock: ManualClock,
        controller: DashboardController<ManualClock>,
    }

    /// 4x4 grid, 16px gap and padding: 880px wide gives 200px cells.
    fn fixture(edit: bool) -> Fixture {
        let container = SizeSource::with_width(880.0);
        let root = GridProvider::new(GridInputs {
            grid_size: GridSize::FourByFour,
            gap: 16.0,
            padding: 16.0,
            cell_size: 200.0,
            is_edit_mode: false,
            container: container.clone(),
            viewport: None,
        });
        let store = Dashboard::from_widgets(
            GridSize::FourByFour,
            vec![
                WidgetInstance::new("a", "calendar", GridPosition::new(0, 0, 1, 1)),
                WidgetInstance::new("b", "todo-list", GridPosition::new(1, 0, 1, 2)),
            ],
        );
        let config = DashboardConfig {
            edit_padding: 16.0,
            ..DashboardConfig::default()
        };
        let scheduler = FrameScheduler::new();
        let clock = ManualClock::new();
        let mut controller =
            DashboardController::new(&root.scope(), store, config, &scheduler, clock.clone())
                .unwrap();
        if edit {
            controller.set_edit_mode(true);
            clock.advance(Duration::from_millis(100));
            controller.poll();
        }
        Fixture {
            container,
            scheduler,
            clock,
            controller,
        }
    }

    fn flush(f: &mut Fixture) {
        f.scheduler.run_until_idle(1000);
        f.clock.advance(Duration::from_millis(100));
        f.controller.poll();
    }

    #[test]
    fn test_requires_grid_context() {
        let result = DashboardController::new(
            &Scope::empty(),
            Dashboard::default(),
            DashboardConfig::default(),
            &FrameScheduler::new(),
            ManualClock::new(),
        );
        assert!(matches!(result, Err(ContextError::MissingGridContext)));
    }

    #[test]
    fn test_widget_frame_without_context() {
        assert_eq!(widget_frame(None, &GridPosition::default()), None);
    }

    #[test]
    fn test_initial_frames_are_at_rest() {
        let f = fixture(false);
        assert!((f.controller.cell_size() - 200.0).abs() < 1e-9);
        let frames = f.controller.widget_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].rect, Rect::new(232.0, 16.0, 432.0, 432.0));
        assert!(!f.controller.is_animating());
    }

    #[test]
    fn test_container_resize_repositions_widgets() {
        let mut f = fixture(false);
        f.container.set_width(1760.0);
        let outcome = f.controller.poll();
        assert_eq!(outcome.cell_size, Some(420.0));
        assert_eq!(f.controller.context().cell_size, 420.0);
        assert_eq!(f.controller.widget_frames()[1].rect.x0, 16.0 + 436.0);
    }

    #[test]
    fn test_widget_springs_use_default_config() {
        let f = fixture(false);
        let springs = &f.controller.springs["a"];
        assert_eq!(springs.origin.config(), SpringConfig::default());
        assert_eq!(springs.size.config(), SpringConfig::default());
        assert_eq!(springs.origin.config().stiffness, 300.0);
        assert_eq!(springs.origin.config().damping, 30.0);
    }

    #[test]
    fn test_viewport_resize_is_observed() {
        let container = SizeSource::with_width(880.0);
        let viewport = SizeSource::with_width(1280.0);
        let root = GridProvider::new(GridInputs {
            grid_size: GridSize::FourByFour,
            gap: 16.0,
            padding: 16.0,
            cell_size: 200.0,
            is_edit_mode: false,
            container: container.clone(),
            viewport: Some(viewport.clone()),
        });
        let scheduler = FrameScheduler::new();
        let mut controller = DashboardController::new(
            &root.scope(),
            Dashboard::new(GridSize::FourByFour),
            DashboardConfig::default(),
            &scheduler,
            ManualClock::new(),
        )
        .unwrap();
        assert_eq!(viewport.observer_count(), 1);
        assert_eq!(controller.context().viewport, Some(viewport.clone()));

        // Only the window reports the change
        container.set_width_unobserved(1760.0);
        assert_eq!(controller.poll().cell_size, None);
        viewport.set_width(2160.0);
        assert_eq!(controller.poll().cell_size, Some(420.0));
        assert_eq!(controller.context().cell_size, 420.0);
    }

    #[test]
    fn test_pointer_drag_moves_widget_and_announces() {
        let mut f = fixture(true);
        assert_eq!(f.controller.pointer_down(Point::new(100.0, 100.0)), Some("a".to_string()));
        assert_eq!(f.controller.widget_state("a"), WidgetState::Dragging);
        f.controller.pointer_move(Point::new(316.0, 532.0));
        assert!(f.controller.is_animating());
        // Release over the empty cell below "b"
        let result = f.controller.pointer_up(Point::new(316.0, 532.0 + 216.0));
        assert!(matches!(result, Some(Ok(LayoutEvent::Moved { .. }))));
        assert_eq!(
            f.controller.store().get("a").unwrap().position,
            GridPosition::new(1, 3, 1, 1)
        );
        flush(&mut f);
        assert!(!f.controller.is_animating());
        assert_eq!(
            f.controller.widget_frames()[0].rect,
            f.controller.target_frame("a").unwrap()
        );
        assert!(f.controller.announcements().iter().any(|m| m.contains("moved")));
        assert_eq!(f.controller.widget_state("a"), WidgetState::Selected);
    }

    #[test]
    fn test_collision_is_rejected_and_announced() {
        let mut f = fixture(true);
        f.controller.pointer_down(Point::new(100.0, 100.0));
        let result = f.controller.pointer_up(Point::new(316.0, 100.0));
        assert!(matches!(result, Some(Err(LayoutError::Collision { .. }))));
        assert_eq!(
            f.controller.store().get("a").unwrap().position,
            GridPosition::new(0, 0, 1, 1)
        );
        flush(&mut f);
        assert!(
            f.controller
                .announcements()
                .iter()
                .any(|m| m.contains("cannot move there"))
        );
        assert_eq!(f.controller.widget_frames()[0].rect.origin(), Point::new(16.0, 16.0));
    }

    #[test]
    fn test_view_mode_click_only_selects() {
        let mut f = fixture(false);
        assert_eq!(f.controller.pointer_down(Point::new(300.0, 300.0)), Some("b".to_string()));
        assert!(f.controller.drag().is_none());
        assert_eq!(f.controller.selected(), Some("b"));
        f.controller.pointer_down(Point::new(800.0, 800.0));
        assert_eq!(f.controller.selected(), None);
    }

    #[test]
    fn test_keyboard_move_and_lock() {
        let mut f = fixture(true);
        f.controller.handle_key(Key::Tab, Modifiers::NONE);
        assert_eq!(f.controller.selected(), Some("a"));
        f.controller.handle_key(Key::ArrowDown, Modifiers::NONE);
        assert_eq!(
            f.controller.store().get("a").unwrap().position,
            GridPosition::new(0, 1, 1, 1)
        );
        f.controller.handle_key(Key::Char('l'), Modifiers::NONE);
        assert!(f.controller.store().get("a").unwrap().locked);
        f.controller.handle_key(Key::ArrowDown, Modifiers::NONE);
        assert_eq!(f.controller.store().get("a").unwrap().position.y, 1);
        assert!(
            f.controller
                .announcements()
                .iter()
                .any(|m| m.starts_with("Warning:"))
        );
    }

    #[test]
    fn test_keyboard_drag_and_drop() {
        let mut f = fixture(true);
        f.controller.select("a");
        assert_eq!(f.controller.handle_key(Key::Enter, Modifiers::NONE), Some(KeyCommand::PickUp));
        assert!(f.controller.drag().is_some_and(DragSession::is_keyboard));
        f.controller.handle_key(Key::ArrowDown, Modifiers::NONE);
        f.controller.handle_key(Key::ArrowDown, Modifiers::NONE);
        f.controller.handle_key(Key::Space, Modifiers::NONE);
        assert!(f.controller.drag().is_none());
        assert_eq!(
            f.controller.store().get("a").unwrap().position,
            GridPosition::new(0, 2, 1, 1)
        );
        flush(&mut f);
        assert!(f.controller.announcements().iter().any(|m| m.contains("dropped")));
    }

    #[test]
    fn test_widget_actions_on_missing_id() {
        let mut f = fixture(true);
        assert!(matches!(f.controller.toggle_lock("zzz"), Err(LayoutError::NotFound(_))));
        assert!(matches!(f.controller.remove_widget("zzz"), Err(LayoutError::NotFound(_))));
        assert!(matches!(f.controller.toggle_fullscreen("zzz"), Err(LayoutError::NotFound(_))));

        f.controller.select("b");
        assert_eq!(f.controller.handle_key(Key::Delete, Modifiers::NONE), Some(KeyCommand::Remove));
        assert!(!f.controller.store().contains("b"));
        assert_eq!(f.controller.selected(), None);
        // Nothing selected: the key maps but acts on nothing
        assert_eq!(f.controller.handle_key(Key::Delete, Modifiers::NONE), None);
        assert_eq!(f.controller.store().len(), 1);
    }

    #[test]
    fn test_keyboard_drop_reports_locked_widget() {
        let mut f = fixture(true);
        f.controller.select("a");
        f.controller.handle_key(Key::Enter, Modifiers::NONE);
        f.controller.handle_key(Key::ArrowDown, Modifiers::NONE);
        // Locked by another path while the keyboard drag is live
        f.controller.toggle_lock("a").unwrap();
        assert_eq!(f.controller.handle_key(Key::Enter, Modifiers::NONE), Some(KeyCommand::Drop));
        assert_eq!(
            f.controller.store().get("a").unwrap().position,
            GridPosition::new(0, 0, 1, 1)
        );
        flush(&mut f);
        let messages = f.controller.announcements();
        assert!(messages.iter().any(|m| m.starts_with("Warning:")));
        assert!(!messages.iter().any(|m| m.contains("cannot move there")));
    }

    #[test]
    fn test_escape_cancels_keyboard_drag() {
        let mut f = fixture(true);
        f.controller.select("a");
        f.controller.handle_key(Key::Enter, Modifiers::NONE);
        f.controller.handle_key(Key::ArrowRight, Modifiers::NONE);
        f.controller.handle_key(Key::Escape, Modifiers::NONE);
        assert!(f.controller.drag().is_none());
        assert_eq!(
            f.controller.store().get("a").unwrap().position,
            GridPosition::new(0, 0, 1, 1)
        );
        assert_eq!(f.controller.selected(), Some("a"));
    }

    #[test]
    fn test_add_remove_and_fullscreen() {
        let mut f = fixture(false);
        let id = f.controller.add_widget("Pomodoro").unwrap();
        assert_eq!(f.controller.store().get(&id).unwrap().widget_type, "pomodoro");
        assert!(f.controller.toggle_fullscreen(&id).unwrap());
        f.controller.remove_widget(&id).unwrap();
        assert_eq!(f.controller.fullscreen(), None);
        assert_eq!(f.controller.widget_frames().len(), 2);
        flush(&mut f);
        let announced = f.controller.announcements();
        assert_eq!(announced.len(), 3);
        assert!(announced[0].contains("added"));
        assert!(announced[2].contains("removed"));
    }

    #[test]
    fn test_undo_restores_springs() {
        let mut f = fixture(true);
        f.controller.select("a");
        f.controller.handle_key(Key::ArrowDown, Modifiers::NONE);
        assert!(f.controller.undo());
        flush(&mut f);
        assert_eq!(f.controller.widget_frames()[0].rect.origin(), Point::new(16.0, 16.0));
    }
}
