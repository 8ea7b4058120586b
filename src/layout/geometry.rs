//! Pure placement math.
//!
//! Every function here maps child sizes and an origin to top-left positions
//! and an overall extent, with no other inputs. Cross-axis centering uses a
//! single shared centerline so mixed-size children line up visually.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Gap between siblings in stack, column, and grid layouts.
pub const GAP: f64 = 40.0;

/// Gap between siblings in flow layouts; wider so connector lines between
/// neighbors stay legible.
pub const FLOW_GAP: f64 = 100.0;

/// Padding between a frame's edge and its contents.
pub const FRAME_PADDING: f64 = 48.0;

/// Padding of the final wrapping frame; larger than the internal gaps so
/// terminal shapes never sit flush against the frame edge.
pub const OUTER_FRAME_PADDING: f64 = 80.0;

/// Minimum radius of a radial layout.
pub const MIN_RADIAL_RADIUS: f64 = 140.0;

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A point in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle (top-left + size).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_point_size(p: Point, s: Size) -> Self {
        Self::new(p.x, p.y, s.width, s.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Whether `other` fits entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Shrink by `padding` on all sides.
    pub fn inset(&self, padding: f64) -> Rect {
        Rect::new(
            self.x + padding,
            self.y + padding,
            (self.width - 2.0 * padding).max(0.0),
            (self.height - 2.0 * padding).max(0.0),
        )
    }

    /// Grow by `padding` on all sides.
    pub fn outset(&self, padding: f64) -> Rect {
        Rect::new(
            self.x - padding,
            self.y - padding,
            self.width + 2.0 * padding,
            self.height + 2.0 * padding,
        )
    }
}

/// Union over a list of rects; `None` when empty.
pub fn union_all(rects: &[Rect]) -> Option<Rect> {
    let mut iter = rects.iter();
    let first = *iter.next()?;
    Some(iter.fold(first, |acc, r| acc.union(r)))
}

fn max_cell(sizes: &[Size]) -> Size {
    sizes.iter().fold(Size::default(), |acc, s| {
        Size::new(acc.width.max(s.width), acc.height.max(s.height))
    })
}

// ---------------------------------------------------------------------------
// Row / column
// ---------------------------------------------------------------------------

/// Left-to-right placement; all children share one horizontal centerline.
pub fn row_positions(sizes: &[Size], origin: Point, gap: f64) -> Vec<Point> {
    let centerline = origin.y + max_cell(sizes).height / 2.0;
    let mut x = origin.x;
    sizes
        .iter()
        .map(|s| {
            let p = Point::new(x, centerline - s.height / 2.0);
            x += s.width + gap;
            p
        })
        .collect()
}

/// Extent of a row layout.
pub fn row_extent(sizes: &[Size], gap: f64) -> Size {
    if sizes.is_empty() {
        return Size::default();
    }
    let width: f64 =
        sizes.iter().map(|s| s.width).sum::<f64>() + gap * (sizes.len() as f64 - 1.0);
    Size::new(width, max_cell(sizes).height)
}

/// Top-to-bottom placement; all children share one vertical centerline.
pub fn column_positions(sizes: &[Size], origin: Point, gap: f64) -> Vec<Point> {
    let centerline = origin.x + max_cell(sizes).width / 2.0;
    let mut y = origin.y;
    sizes
        .iter()
        .map(|s| {
            let p = Point::new(centerline - s.width / 2.0, y);
            y += s.height + gap;
            p
        })
        .collect()
}

/// Extent of a column layout.
pub fn column_extent(sizes: &[Size], gap: f64) -> Size {
    if sizes.is_empty() {
        return Size::default();
    }
    let height: f64 =
        sizes.iter().map(|s| s.height).sum::<f64>() + gap * (sizes.len() as f64 - 1.0);
    Size::new(max_cell(sizes).width, height)
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Column count for a grid of `n` items: `ceil(sqrt(n))`.
pub fn grid_columns(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    (n as f64).sqrt().ceil() as usize
}

/// Row-major grid placement with a uniform cell (max child size + gap);
/// children are centered in their cell.
pub fn grid_positions(sizes: &[Size], origin: Point, gap: f64) -> Vec<Point> {
    let columns = grid_columns(sizes.len());
    if columns == 0 {
        return Vec::new();
    }
    let cell = max_cell(sizes);
    let (cell_w, cell_h) = (cell.width + gap, cell.height + gap);
    sizes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let col = (i % columns) as f64;
            let row = (i / columns) as f64;
            Point::new(
                origin.x + col * cell_w + (cell.width - s.width) / 2.0,
                origin.y + row * cell_h + (cell.height - s.height) / 2.0,
            )
        })
        .collect()
}

/// Extent of a grid layout.
pub fn grid_extent(sizes: &[Size], gap: f64) -> Size {
    let columns = grid_columns(sizes.len());
    if columns == 0 {
        return Size::default();
    }
    let rows = sizes.len().div_ceil(columns);
    let cell = max_cell(sizes);
    Size::new(
        columns as f64 * (cell.width + gap) - gap,
        rows as f64 * (cell.height + gap) - gap,
    )
}

// ---------------------------------------------------------------------------
// Radial
// ---------------------------------------------------------------------------

fn radial_radius(n: usize, sizes: &[Size], gap: f64) -> f64 {
    let cell = max_cell(sizes);
    let max_dim = cell.width.max(cell.height);
    // Enough circumference for every item plus its gap.
    let needed = n as f64 * (max_dim + gap) / (2.0 * PI);
    needed.max(MIN_RADIAL_RADIUS)
}

/// Evenly spaced placement around a circle, starting at the top and
/// proceeding clockwise. The circle's radius scales with item count and
/// the largest item.
pub fn radial_positions(sizes: &[Size], origin: Point, gap: f64) -> Vec<Point> {
    let n = sizes.len();
    if n == 0 {
        return Vec::new();
    }
    let radius = radial_radius(n, sizes, gap);
    let cell = max_cell(sizes);
    let center = Point::new(
        origin.x + radius + cell.width / 2.0,
        origin.y + radius + cell.height / 2.0,
    );
    sizes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            // Screen coordinates: y grows downward, so an increasing angle
            // from -PI/2 walks the circle clockwise from the top.
            let angle = -PI / 2.0 + 2.0 * PI * i as f64 / n as f64;
            Point::new(
                center.x + radius * angle.cos() - s.width / 2.0,
                center.y + radius * angle.sin() - s.height / 2.0,
            )
        })
        .collect()
}

/// Extent of a radial layout.
pub fn radial_extent(sizes: &[Size], gap: f64) -> Size {
    if sizes.is_empty() {
        return Size::default();
    }
    let radius = radial_radius(sizes.len(), sizes, gap);
    let cell = max_cell(sizes);
    Size::new(2.0 * radius + cell.width, 2.0 * radius + cell.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_columns_is_ceil_sqrt() {
        assert_eq!(grid_columns(1), 1);
        assert_eq!(grid_columns(4), 2);
        assert_eq!(grid_columns(5), 3);
        assert_eq!(grid_columns(9), 3);
        assert_eq!(grid_columns(10), 4);
        assert_eq!(grid_columns(0), 0);
    }

    #[test]
    fn test_row_shares_centerline() {
        let sizes = [Size::new(100.0, 50.0), Size::new(100.0, 100.0)];
        let positions = row_positions(&sizes, Point::new(0.0, 0.0), GAP);
        let c0 = positions[0].y + sizes[0].height / 2.0;
        let c1 = positions[1].y + sizes[1].height / 2.0;
        assert_eq!(c0, c1);
        assert_eq!(positions[1].x, 100.0 + GAP);
    }

    #[test]
    fn test_grid_cells_do_not_overlap() {
        let sizes: Vec<Size> = (0..7).map(|_| Size::new(100.0, 80.0)).collect();
        let positions = grid_positions(&sizes, Point::new(0.0, 0.0), GAP);
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let a = Rect::from_point_size(positions[i], sizes[i]);
                let b = Rect::from_point_size(positions[j], sizes[j]);
                let overlap = a.x < b.right()
                    && b.x < a.right()
                    && a.y < b.bottom()
                    && b.y < a.bottom();
                assert!(!overlap, "cells {i} and {j} overlap");
            }
        }
    }

    #[test]
    fn test_grid_extent_matches_rows_and_columns() {
        let sizes: Vec<Size> = (0..5).map(|_| Size::new(100.0, 80.0)).collect();
        // 5 items -> 3 columns, 2 rows.
        let extent = grid_extent(&sizes, GAP);
        assert_eq!(extent.width, 3.0 * (100.0 + GAP) - GAP);
        assert_eq!(extent.height, 2.0 * (80.0 + GAP) - GAP);
    }

    #[test]
    fn test_radial_first_item_is_at_top() {
        let sizes: Vec<Size> = (0..6).map(|_| Size::new(80.0, 80.0)).collect();
        let positions = radial_positions(&sizes, Point::new(0.0, 0.0), GAP);
        // All items are within the declared extent.
        let extent = radial_extent(&sizes, GAP);
        for (p, s) in positions.iter().zip(&sizes) {
            assert!(p.x >= -1e-9 && p.x + s.width <= extent.width + 1e-9);
            assert!(p.y >= -1e-9 && p.y + s.height <= extent.height + 1e-9);
        }
        // First item sits above the second (clockwise from the top).
        assert!(positions[0].y < positions[1].y);
        assert!(positions[1].x > positions[0].x);
    }

    #[test]
    fn test_union_and_inset() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 20.0, 2.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 25.0, 10.0));
        assert_eq!(u.inset(2.0), Rect::new(2.0, 2.0, 21.0, 6.0));
        assert!(u.contains(&a));
    }
}
