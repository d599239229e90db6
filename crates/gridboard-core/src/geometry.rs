//! Grid geometry: conversions between pixel space and grid-cell space.
//!
//! All functions here are pure. Pixel values are `f64` (kurbo's unit), grid
//! coordinates are unsigned cell indices.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest cell size ever produced by [`cell_size`], in pixels.
pub const MIN_CELL_SIZE: f64 = 100.0;

/// Column count used when a grid size string is not recognized.
pub const DEFAULT_COLUMNS: u32 = 3;

/// Errors from strict grid size parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Unknown grid size: {0}")]
    UnknownGridSize(String),
}

/// Square grid dimensions selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GridSize {
    #[serde(rename = "2x2")]
    TwoByTwo,
    #[default]
    #[serde(rename = "3x3")]
    ThreeByThree,
    #[serde(rename = "4x4")]
    FourByFour,
    #[serde(rename = "5x5")]
    FiveByFive,
}

impl GridSize {
    /// All grid sizes, smallest first.
    pub const ALL: [GridSize; 4] = [
        GridSize::TwoByTwo,
        GridSize::ThreeByThree,
        GridSize::FourByFour,
        GridSize::FiveByFive,
    ];

    /// Number of columns (and rows) in this grid.
    pub fn columns(self) -> u32 {
        match self {
            GridSize::TwoByTwo => 2,
            GridSize::ThreeByThree => 3,
            GridSize::FourByFour => 4,
            GridSize::FiveByFive => 5,
        }
    }

    /// The string form used in configuration (`"4x4"`).
    pub fn as_str(self) -> &'static str {
        match self {
            GridSize::TwoByTwo => "2x2",
            GridSize::ThreeByThree => "3x3",
            GridSize::FourByFour => "4x4",
            GridSize::FiveByFive => "5x5",
        }
    }

    /// Parse a grid size, falling back to 3x3 for anything unrecognized.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            log::warn!("Unknown grid size '{}', falling back to {}", s, GridSize::default());
            GridSize::default()
        })
    }
}

impl FromStr for GridSize {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GridSize::ALL
            .into_iter()
            .find(|size| size.as_str() == s.trim())
            .ok_or_else(|| GridError::UnknownGridSize(s.to_string()))
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell coordinate in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridCoord {
    pub col: u32,
    pub row: u32,
}

/// A signed movement in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDelta {
    pub d_col: i32,
    pub d_row: i32,
}

impl GridDelta {
    /// Check if the delta moves at all.
    pub fn is_zero(self) -> bool {
        self.d_col == 0 && self.d_row == 0
    }
}

/// Placement of a widget in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for GridPosition {
    fn default() -> Self {
        Self::new(0, 0, 1, 1)
    }
}

impl GridPosition {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge (column index just past the widget).
    ///
    /// Saturates so malformed records compare as out of bounds.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Check if two placements share at least one cell.
    pub fn overlaps(&self, other: &GridPosition) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Check if the placement lies fully inside a square grid.
    pub fn fits(&self, columns: u32) -> bool {
        self.width >= 1 && self.height >= 1 && self.right() <= columns && self.bottom() <= columns
    }

    /// Shrink oversized spans and pull the placement back inside the grid.
    pub fn clamped(&self, columns: u32) -> GridPosition {
        let columns = columns.max(1);
        let width = self.width.clamp(1, columns);
        let height = self.height.clamp(1, columns);
        let (x, y) = constrain_to_grid(
            i64::from(self.x),
            i64::from(self.y),
            width,
            height,
            columns,
        );
        GridPosition { x, y, width, height }
    }

    /// Top-left corner after a grid delta, before any clamping.
    pub fn offset(&self, delta: GridDelta) -> (i64, i64) {
        (
            i64::from(self.x) + i64::from(delta.d_col),
            i64::from(self.y) + i64::from(delta.d_row),
        )
    }
}

/// Column count for a grid size string. Unknown sizes fall back to 3.
pub fn columns_for_size(grid_size: &str) -> u32 {
    match grid_size.parse::<GridSize>() {
        Ok(size) => size.columns(),
        Err(_) => {
            log::warn!("Unknown grid size '{}', using {} columns", grid_size, DEFAULT_COLUMNS);
            DEFAULT_COLUMNS
        }
    }
}

/// Pixel size of one grid cell for a container width.
///
/// Never returns less than [`MIN_CELL_SIZE`], including for zero or negative
/// container widths.
pub fn cell_size(container_width: f64, grid_size: GridSize, gap: f64, padding: f64) -> f64 {
    cell_size_for_columns(container_width, grid_size.columns(), gap, padding)
}

/// [`cell_size`] for an explicit column count.
pub fn cell_size_for_columns(container_width: f64, columns: u32, gap: f64, padding: f64) -> f64 {
    let columns = f64::from(columns.max(1));
    let available = container_width - 2.0 * padding - gap * (columns - 1.0);
    let size = (available / columns).floor();
    if size.is_nan() {
        return MIN_CELL_SIZE;
    }
    size.max(MIN_CELL_SIZE)
}

/// Cell containing a pixel offset. Negative offsets map to cell 0.
pub fn pixel_to_grid(point: Point, cell_size: f64, gap: f64) -> GridCoord {
    let step = cell_size + gap;
    let to_cell = |v: f64| (v / step).floor().max(0.0) as u32;
    GridCoord {
        col: to_cell(point.x),
        row: to_cell(point.y),
    }
}

/// Top-left pixel of a grid cell, including the outer padding.
pub fn grid_to_pixel(coord: GridCoord, cell_size: f64, gap: f64, padding: f64) -> Point {
    let step = cell_size + gap;
    Point::new(
        padding + f64::from(coord.col) * step,
        padding + f64::from(coord.row) * step,
    )
}

/// Convert a continuous pixel drag into whole grid steps.
///
/// Rounds to the nearest step, ties away from zero.
pub fn delta_to_grid_units(delta: Vec2, cell_size: f64, gap: f64) -> GridDelta {
    let step = cell_size + gap;
    GridDelta {
        d_col: (delta.x / step).round() as i32,
        d_row: (delta.y / step).round() as i32,
    }
}

/// Clamp a top-left corner so a `width` x `height` widget stays in the grid.
///
/// For a widget larger than the grid the lower bound wins and the axis is 0.
pub fn constrain_to_grid(x: i64, y: i64, width: u32, height: u32, columns: u32) -> (u32, u32) {
    let columns = i64::from(columns);
    let max_x = columns - i64::from(width);
    let max_y = columns - i64::from(height);
    (x.min(max_x).max(0) as u32, y.min(max_y).max(0) as u32)
}

/// Pixel size of a widget spanning `grid_width` x `grid_height` cells.
///
/// Includes the gaps between spanned cells but not the outer padding.
pub fn widget_pixel_size(grid_width: u32, grid_height: u32, cell_size: f64, gap: f64) -> Size {
    let span = |n: u32| {
        let n = f64::from(n);
        n * cell_size + (n - 1.0).max(0.0) * gap
    };
    Size::new(span(grid_width), span(grid_height))
}

/// Pixel rectangle occupied by a widget.
pub fn widget_rect(position: &GridPosition, cell_size: f64, gap: f64, padding: f64) -> Rect {
    let origin = grid_to_pixel(
        GridCoord {
            col: position.x,
            row: position.y,
        },
        cell_size,
        gap,
        padding,
    );
    Rect::from_origin_size(
        origin,
        widget_pixel_size(position.width, position.height, cell_size, gap),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_for_known_sizes() {
        assert_eq!(columns_for_size("2x2"), 2);
        assert_eq!(columns_for_size("3x3"), 3);
        assert_eq!(columns_for_size("4x4"), 4);
        assert_eq!(columns_for_size("5x5"), 5);
    }

    #[test]
    fn test_columns_for_unknown_size_falls_back() {
        assert_eq!(columns_for_size("6x6"), 3);
        assert_eq!(columns_for_size(""), 3);
        assert_eq!(columns_for_size("large"), 3);
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert_eq!("4x4".parse::<GridSize>(), Ok(GridSize::FourByFour));
        assert_eq!(
            "7x7".parse::<GridSize>(),
            Err(GridError::UnknownGridSize("7x7".to_string()))
        );
        assert_eq!(GridSize::parse_lossy("7x7"), GridSize::ThreeByThree);
    }

    #[test]
    fn test_grid_size_serde() {
        let json = serde_json::to_string(&GridSize::FiveByFive).unwrap();
        assert_eq!(json, "\"5x5\"");
        let size: GridSize = serde_json::from_str("\"2x2\"").unwrap();
        assert_eq!(size, GridSize::TwoByTwo);
    }

    #[test]
    fn test_cell_size_example() {
        let size = cell_size(964.0, GridSize::ThreeByThree, 16.0, 16.0);
        assert!((size - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cell_size_floors_fractional() {
        // available = 1000 - 0 - 16*3 = 952, 952 / 4 = 238
        let size = cell_size(1000.0, GridSize::FourByFour, 16.0, 0.0);
        assert!((size - 238.0).abs() < f64::EPSILON);
        // available = 1001 - 0 - 0 = 1001, 1001 / 4 = 250.25
        let size = cell_size(1001.0, GridSize::FourByFour, 0.0, 0.0);
        assert!((size - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cell_size_minimum() {
        for width in [-500.0, 0.0, 10.0, 250.0] {
            let size = cell_size(width, GridSize::FiveByFive, 16.0, 16.0);
            assert!((size - MIN_CELL_SIZE).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_pixel_to_grid_clamps_negative() {
        let coord = pixel_to_grid(Point::new(-40.0, 650.0), 300.0, 16.0);
        assert_eq!(coord, GridCoord { col: 0, row: 2 });
    }

    #[test]
    fn test_grid_pixel_roundtrip() {
        for col in 0..5 {
            for row in 0..5 {
                let coord = GridCoord { col, row };
                let px = grid_to_pixel(coord, 200.0, 16.0, 16.0);
                assert_eq!(pixel_to_grid(px, 200.0, 16.0), coord);
            }
        }
    }

    #[test]
    fn test_delta_rounding() {
        let step = 300.0 + 16.0;
        let d = delta_to_grid_units(Vec2::new(step * 0.49, step * 0.5), 300.0, 16.0);
        assert_eq!(d, GridDelta { d_col: 0, d_row: 1 });
        let d = delta_to_grid_units(Vec2::new(-step * 0.5, -step * 1.6), 300.0, 16.0);
        assert_eq!(d, GridDelta { d_col: -1, d_row: -2 });
    }

    #[test]
    fn test_constrain_to_grid() {
        assert_eq!(constrain_to_grid(5, 5, 2, 2, 4), (2, 2));
        assert_eq!(constrain_to_grid(-3, 1, 1, 1, 4), (0, 1));
        // Oversized widget pins to origin
        assert_eq!(constrain_to_grid(2, 2, 6, 6, 4), (0, 0));
    }

    #[test]
    fn test_widget_pixel_size_includes_inner_gaps() {
        let size = widget_pixel_size(2, 3, 100.0, 10.0);
        assert!((size.width - 210.0).abs() < f64::EPSILON);
        assert!((size.height - 320.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_widget_rect() {
        let rect = widget_rect(&GridPosition::new(1, 0, 2, 1), 100.0, 10.0, 20.0);
        assert!((rect.x0 - 130.0).abs() < f64::EPSILON);
        assert!((rect.y0 - 20.0).abs() < f64::EPSILON);
        assert!((rect.width() - 210.0).abs() < f64::EPSILON);
        assert!((rect.height() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_position_overlap() {
        let a = GridPosition::new(0, 0, 2, 2);
        assert!(a.overlaps(&GridPosition::new(1, 1, 1, 1)));
        assert!(!a.overlaps(&GridPosition::new(2, 0, 1, 2)));
        assert!(!a.overlaps(&GridPosition::new(0, 2, 2, 1)));
    }

    #[test]
    fn test_position_edges_saturate() {
        let pos = GridPosition::new(u32::MAX, 0, 1, 1);
        assert_eq!(pos.right(), u32::MAX);
        assert!(!pos.fits(5));
        assert!(!pos.overlaps(&GridPosition::new(0, 0, 5, 5)));
        assert_eq!(pos.clamped(5), GridPosition::new(4, 0, 1, 1));
    }

    #[test]
    fn test_position_clamped() {
        let pos = GridPosition::new(4, 1, 6, 2).clamped(3);
        assert_eq!(pos, GridPosition::new(0, 1, 3, 2));
        assert!(pos.fits(3));
    }
}
