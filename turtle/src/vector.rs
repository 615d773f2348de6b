//! Integer and floating-point 2D coordinates.

use core::ops::{Add, Mul, Sub};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Vector2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector2f {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean length, computed in `f32`.
    pub fn magnitude(self) -> f32 {
        Vector2f::from(self).magnitude()
    }

    pub const fn dot(self, rhs: Vector2) -> i32 {
        self.x * rhs.x + self.y * rhs.y
    }
}

impl Vector2f {
    pub const ZERO: Vector2f = Vector2f { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(self, rhs: Vector2f) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }
}

impl From<Vector2> for Vector2f {
    fn from(v: Vector2) -> Self {
        Self {
            x: v.x as f32,
            y: v.y as f32,
        }
    }
}

impl From<(i32, i32)> for Vector2 {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Vector2f {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

// Componentwise add/sub. Mixing an integer and a float operand widens to Vector2f.
macro_rules! componentwise {
    ($($lhs:ty, $rhs:ty => $out:ty;)*) => {
        $(
            impl Add<$rhs> for $lhs {
                type Output = $out;
                fn add(self, rhs: $rhs) -> $out {
                    let (a, b) = (<$out>::from(self), <$out>::from(rhs));
                    <$out>::new(a.x + b.x, a.y + b.y)
                }
            }

            impl Sub<$rhs> for $lhs {
                type Output = $out;
                fn sub(self, rhs: $rhs) -> $out {
                    let (a, b) = (<$out>::from(self), <$out>::from(rhs));
                    <$out>::new(a.x - b.x, a.y - b.y)
                }
            }
        )*
    };
}

componentwise! {
    Vector2, Vector2 => Vector2;
    Vector2f, Vector2f => Vector2f;
    Vector2, Vector2f => Vector2f;
    Vector2f, Vector2 => Vector2f;
}

// Scalar multiplication, both operand orders.
macro_rules! scale {
    ($($vec:ty, $scalar:ty => $out:ty;)*) => {
        $(
            impl Mul<$scalar> for $vec {
                type Output = $out;
                fn mul(self, k: $scalar) -> $out {
                    let v = <$out>::from(self);
                    <$out>::new(v.x * k, v.y * k)
                }
            }

            impl Mul<$vec> for $scalar {
                type Output = $out;
                fn mul(self, v: $vec) -> $out {
                    v * self
                }
            }
        )*
    };
}

scale! {
    Vector2, i32 => Vector2;
    Vector2f, f32 => Vector2f;
    Vector2, f32 => Vector2f;
}
