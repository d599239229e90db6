//! Grid context shared with every widget under one dashboard.
//!
//! Instead of an ambient global, the context travels down through an explicit
//! [`Scope`]. Leaf widgets call [`Scope::grid`] and cope with `None`;
//! components that lay out other components call [`Scope::require_grid`],
//! which fails with [`ContextError::MissingGridContext`] when no provider is
//! in scope.

use crate::cell_size::SizeSource;
use crate::geometry::GridSize;
use std::rc::Rc;
use thiserror::Error;

/// Errors from context lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Grid context is required but no dashboard grid provider is in scope")]
    MissingGridContext,
}

/// Layout parameters visible to all widgets of one dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct GridContext {
    pub grid_size: GridSize,
    pub gap: f64,
    pub padding: f64,
    pub cell_size: f64,
    pub grid_columns: u32,
    pub is_edit_mode: bool,
    pub container: SizeSource,
    /// Window size source, observed alongside the container when present.
    pub viewport: Option<SizeSource>,
}

/// Raw inputs the context is derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct GridInputs {
    pub grid_size: GridSize,
    pub gap: f64,
    pub padding: f64,
    pub cell_size: f64,
    pub is_edit_mode: bool,
    pub container: SizeSource,
    /// Window size source, observed alongside the container when present.
    pub viewport: Option<SizeSource>,
}

impl GridInputs {
    fn build(&self) -> GridContext {
        GridContext {
            grid_size: self.grid_size,
            gap: self.gap,
            padding: self.padding,
            cell_size: self.cell_size,
            grid_columns: self.grid_size.columns(),
            is_edit_mode: self.is_edit_mode,
            container: self.container.clone(),
            viewport: self.viewport.clone(),
        }
    }
}

/// Owns the memoized context for one dashboard root.
#[derive(Debug)]
pub struct GridProvider {
    inputs: GridInputs,
    context: Rc<GridContext>,
}

impl GridProvider {
    pub fn new(inputs: GridInputs) -> Self {
        let context = Rc::new(inputs.build());
        Self { inputs, context }
    }

    /// Replace the inputs. The context is rebuilt only if something changed.
    ///
    /// Returns true if a new context was published.
    pub fn update(&mut self, inputs: GridInputs) -> bool {
        if inputs == self.inputs {
            return false;
        }
        self.context = Rc::new(inputs.build());
        self.inputs = inputs;
        true
    }

    pub fn inputs(&self) -> &GridInputs {
        &self.inputs
    }

    /// Shared handle to the current context.
    pub fn context(&self) -> Rc<GridContext> {
        Rc::clone(&self.context)
    }

    /// A scope that carries this provider's context.
    pub fn scope(&self) -> Scope {
        Scope {
            grid: Some(self.context()),
        }
    }
}

/// Dependency-injection handle passed down the component tree.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    grid: Option<Rc<GridContext>>,
}

impl Scope {
    /// A scope with no providers, as seen by a standalone component.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Optional lookup: `None` outside a dashboard.
    pub fn grid(&self) -> Option<&GridContext> {
        self.grid.as_deref()
    }

    /// Required lookup for layout-orchestrating components.
    pub fn require_grid(&self) -> Result<&GridContext, ContextError> {
        self.grid.as_deref().ok_or(ContextError::MissingGridContext)
    }
}
