//! Geometric primitives and the PDF-to-view coordinate transform.
//!
//! PDF user space has its origin at the bottom-left with Y growing upwards.
//! Output records use a Y-down space with the origin at the top-left of the
//! page. [`PageSpace`] owns that conversion; nothing else flips Y.

mod rect_key;
mod rotation;

pub use rect_key::{RectKey, RECT_MATCH_TOLERANCE};
pub use rotation::{
    matrix_angle_degrees, recover_unrotated_size, rotated_bounds, rotation_from_matrix_angle,
};

use serde::Serialize;

/// A 2D point in view space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in view space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: f64,
    /// Y coordinate of top-left corner
    pub y: f64,
    /// Width of rectangle
    pub width: f64,
    /// Height of rectangle
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    /// Bounding rectangle of a set of rectangles.
    pub fn bounding(rects: &[Rect]) -> Option<Rect> {
        let (first, rest) = rects.split_first()?;
        Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
    }
}

/// A PDF rectangle `[llx lly urx ury]`, normalized so `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    /// Lower-left x
    pub x0: f64,
    /// Lower-left y
    pub y0: f64,
    /// Upper-right x
    pub x1: f64,
    /// Upper-right y
    pub y1: f64,
}

impl PdfRect {
    /// Build from the first four numbers of a `/Rect`-style array.
    pub fn from_array(values: &[f64]) -> Option<Self> {
        match *values {
            [a, b, c, d, ..] => Some(Self {
                x0: a.min(c),
                y0: b.min(d),
                x1: a.max(c),
                y1: b.max(d),
            }),
            _ => None,
        }
    }

    /// Width in PDF units.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height in PDF units.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Corner coordinates in `[x0, y0, x1, y1]` order.
    pub fn coords(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// Coordinate transform for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpace {
    /// Page height in PDF units (media box height)
    pub height: f64,
}

impl PageSpace {
    /// Create a transform for a page of the given height.
    pub fn new(height: f64) -> Self {
        Self { height }
    }

    /// Convert a PDF Y coordinate to view space.
    pub fn flip_y(&self, y: f64) -> f64 {
        self.height - y
    }

    /// Convert a PDF point to view space.
    pub fn point(&self, x: f64, y: f64) -> Point {
        Point::new(x, self.flip_y(y))
    }

    /// Convert a PDF rectangle to a view-space box.
    pub fn rect(&self, rect: &PdfRect) -> Rect {
        Rect::new(rect.x0, self.flip_y(rect.y1), rect.width(), rect.height())
    }

    /// Convert a flat `[x0 y0 x1 y1 ...]` coordinate list to view-space points.
    /// A trailing odd value is ignored.
    pub fn points(&self, coords: &[f64]) -> Vec<Point> {
        coords.chunks_exact(2).map(|xy| self.point(xy[0], xy[1])).collect()
    }

    /// Decompose `/QuadPoints` into one view-space rectangle per 8 numbers.
    /// Incomplete trailing quads are ignored.
    pub fn quad_rects(&self, quad_points: &[f64]) -> Vec<Rect> {
        quad_points
            .chunks_exact(8)
            .map(|quad| {
                let xs = [quad[0], quad[2], quad[4], quad[6]];
                let ys = [quad[1], quad[3], quad[5], quad[7]];
                let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
                let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
                let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                Rect::new(min_x, self.flip_y(max_y), max_x - min_x, max_y - min_y)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_rect_normalizes() {
        let r = PdfRect::from_array(&[110.0, 70.0, 10.0, 20.0]).unwrap();
        assert_eq!(r.coords(), [10.0, 20.0, 110.0, 70.0]);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 50.0);
        assert!(PdfRect::from_array(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_rect_to_view_space() {
        let page = PageSpace::new(792.0);
        let r = PdfRect::from_array(&[100.0, 600.0, 200.0, 700.0]).unwrap();
        assert_eq!(page.rect(&r), Rect::new(100.0, 92.0, 100.0, 100.0));
    }

    #[test]
    fn test_quad_rects_single_quad() {
        let page = PageSpace::new(20.0);
        let rects = page.quad_rects(&[0.0, 10.0, 10.0, 10.0, 0.0, 0.0, 10.0, 0.0]);
        assert_eq!(rects, vec![Rect::new(0.0, 10.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_quad_rects_ignores_partial_quad() {
        let page = PageSpace::new(100.0);
        let rects = page.quad_rects(&[0.0, 10.0, 10.0, 10.0, 0.0, 0.0, 10.0, 0.0, 5.0, 5.0]);
        assert_eq!(rects.len(), 1);
    }

    #[test]
    fn test_bounding_rect() {
        let rects = [Rect::new(0.0, 10.0, 10.0, 10.0), Rect::new(5.0, 30.0, 20.0, 5.0)];
        assert_eq!(Rect::bounding(&rects), Some(Rect::new(0.0, 10.0, 25.0, 25.0)));
        assert!(Rect::bounding(&[]).is_none());
    }

    #[test]
    fn test_points_flip() {
        let page = PageSpace::new(100.0);
        assert_eq!(
            page.points(&[1.0, 2.0, 3.0, 4.0, 9.0]),
            vec![Point::new(1.0, 98.0), Point::new(3.0, 96.0)]
        );
    }
}
