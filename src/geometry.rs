//! Core geometry types for text layout
//!
//! This module provides the geometric primitives used throughout the layout
//! engine. All units are in drawing units (the same space the text height is
//! expressed in).
//!
//! # Coordinate System
//!
//! The coordinate system is the usual drafting one:
//! - Positive X extends to the right
//! - Positive Y extends upward
//!
//! A text run's insertion point is the top-left corner of its first line;
//! glyph baselines sit one nominal height below it.

use std::fmt;
use std::ops::{Add, Sub};

/// A 2D point or displacement in drawing units.
///
/// # Examples
///
/// ```
/// use textflow::Vector;
///
/// let v = Vector::new(10.0, 20.0);
/// assert_eq!(v.x, 10.0);
/// assert_eq!(v + Vector::new(1.0, 2.0), Vector::new(11.0, 22.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
  /// X coordinate (increases to the right)
  pub x: f64,
  /// Y coordinate (increases upward)
  pub y: f64,
}

impl Vector {
  /// The zero vector at the origin.
  pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

  /// Creates a new vector with the given coordinates.
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// Euclidean distance to another point.
  pub fn distance_to(self, other: Vector) -> f64 {
    let dx = other.x - self.x;
    let dy = other.y - self.y;
    (dx * dx + dy * dy).sqrt()
  }

  /// The angle of the vector from the positive X axis, in radians.
  pub fn angle(self) -> f64 {
    self.y.atan2(self.x)
  }

  /// Unit vector for the given angle in radians.
  pub fn from_angle(angle: f64) -> Self {
    Self {
      x: angle.cos(),
      y: angle.sin(),
    }
  }

  /// Rotates this point about `center` by `angle` radians.
  pub fn rotated_about(self, center: Vector, angle: f64) -> Self {
    let (sin, cos) = angle.sin_cos();
    let d = self - center;
    Self {
      x: center.x + d.x * cos - d.y * sin,
      y: center.y + d.x * sin + d.y * cos,
    }
  }

  /// Scales this point about `center` by per-axis factors.
  pub fn scaled_about(self, center: Vector, factor: Vector) -> Self {
    Self {
      x: center.x + (self.x - center.x) * factor.x,
      y: center.y + (self.y - center.y) * factor.y,
    }
  }

  /// Reflects this point across the line through `p1` and `p2`.
  pub fn mirrored(self, p1: Vector, p2: Vector) -> Self {
    let axis = p2 - p1;
    let len2 = axis.x * axis.x + axis.y * axis.y;
    if len2 == 0.0 {
      // Degenerate axis: mirror through the point itself.
      return Vector::new(2.0 * p1.x - self.x, 2.0 * p1.y - self.y);
    }
    let d = self - p1;
    let t = (d.x * axis.x + d.y * axis.y) / len2;
    let foot = Vector::new(p1.x + axis.x * t, p1.y + axis.y * t);
    Vector::new(2.0 * foot.x - self.x, 2.0 * foot.y - self.y)
  }
}

impl Add for Vector {
  type Output = Vector;

  fn add(self, rhs: Vector) -> Vector {
    Vector::new(self.x + rhs.x, self.y + rhs.y)
  }
}

impl Sub for Vector {
  type Output = Vector;

  fn sub(self, rhs: Vector) -> Vector {
    Vector::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl fmt::Display for Vector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// An axis-aligned bounding box, tracked as min/max corners.
///
/// Runs keep their box up to date as glyphs are placed and children are
/// moved; a parent's box always encloses its children's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  /// Bottom-left corner.
  pub min: Vector,
  /// Top-right corner.
  pub max: Vector,
}

impl BoundingBox {
  /// Creates a box from two corners, normalizing the min/max order.
  pub fn new(a: Vector, b: Vector) -> Self {
    Self {
      min: Vector::new(a.x.min(b.x), a.y.min(b.y)),
      max: Vector::new(a.x.max(b.x), a.y.max(b.y)),
    }
  }

  /// A degenerate box collapsed onto a single point.
  pub fn at_point(p: Vector) -> Self {
    Self { min: p, max: p }
  }

  /// Width of the box.
  pub fn width(&self) -> f64 {
    self.max.x - self.min.x
  }

  /// Height of the box.
  pub fn height(&self) -> f64 {
    self.max.y - self.min.y
  }

  /// Grows this box to also enclose `other`.
  pub fn merge(&mut self, other: &BoundingBox) {
    self.min.x = self.min.x.min(other.min.x);
    self.min.y = self.min.y.min(other.min.y);
    self.max.x = self.max.x.max(other.max.x);
    self.max.y = self.max.y.max(other.max.y);
  }

  /// Translates both corners by `delta`.
  pub fn translate(&mut self, delta: Vector) {
    self.min = self.min + delta;
    self.max = self.max + delta;
  }

  /// Bounding box of this box's corners after an arbitrary point transform.
  pub fn transformed(&self, mut f: impl FnMut(Vector) -> Vector) -> BoundingBox {
    let corners = [
      self.min,
      self.max,
      Vector::new(self.min.x, self.max.y),
      Vector::new(self.max.x, self.min.y),
    ];
    let mut out = BoundingBox::at_point(f(corners[0]));
    for c in &corners[1..] {
      out.merge(&BoundingBox::at_point(f(*c)));
    }
    out
  }
}
