//! Layout heuristics used while dragging.
//!
//! These are pure functions over boxes so they can be tested without a
//! live document.

use serde::{Deserialize, Serialize};

/// Border box of a rendered element, in page pixels
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

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
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

    /// Edges are inclusive
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }

    /// The box grown by `amount` on every side
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Flow direction of a parent, judged from its first two children.
///
/// Vertical when their left edges differ less than their top edges. A
/// parent with fewer than two children is treated as vertical.
pub fn resolve_axis(siblings: &[Rect]) -> Axis {
    match siblings {
        [first, second, ..] => {
            let dx = (first.left() - second.left()).abs();
            let dy = (first.top() - second.top()).abs();
            if dx < dy {
                Axis::Vertical
            } else {
                Axis::Horizontal
            }
        }
        _ => Axis::Vertical,
    }
}

/// Index of the first sibling whose midpoint lies beyond the pointer along
/// `axis`, or `siblings.len()` when the pointer is past all of them.
pub fn insertion_index(siblings: &[Rect], axis: Axis, x: f64, y: f64) -> usize {
    siblings
        .iter()
        .position(|rect| match axis {
            Axis::Vertical => y < rect.center_y(),
            Axis::Horizontal => x < rect.center_x(),
        })
        .unwrap_or(siblings.len())
}

/// Cell index under the pointer in a grid with the given track counts
pub fn resolve_grid_index(content: Rect, columns: usize, rows: usize, x: f64, y: f64) -> usize {
    let columns = columns.max(1);
    let rows = rows.max(1);
    if content.width <= 0.0 || content.height <= 0.0 {
        return 0;
    }

    let cell_width = content.width / columns as f64;
    let cell_height = content.height / rows as f64;
    let column = track((x - content.left()) / cell_width, columns);
    let row = track((y - content.top()) / cell_height, rows);
    row * columns + column
}

fn track(position: f64, count: usize) -> usize {
    if position <= 0.0 {
        0
    } else {
        (position.floor() as usize).min(count - 1)
    }
}

/// Whether the pointer is within `threshold` pixels of `original`
pub fn within_snap(original: Rect, x: f64, y: f64, threshold: f64) -> bool {
    original.inflate(threshold).contains(x, y)
}
