use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Unit direction of this vector, or `None` for the zero vector.
    pub fn normalized(&self) -> Option<Point> {
        let norm = (self.x * self.x + self.y * self.y).sqrt();
        if norm == 0.0 {
            None
        } else {
            Some(Point::new(self.x / norm, self.y / norm))
        }
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Round to the nearest pixel, halves away from zero.
    pub fn round(&self) -> Pixel {
        Pixel::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// An integer pixel coordinate.
///
/// Model geometry is reported in pixels; all conversions from [`Point`]
/// go through [`Point::round`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    pub fn distance(&self, other: &Pixel) -> f64 {
        self.to_point().distance(&other.to_point())
    }
}

impl From<[i32; 2]> for Pixel {
    fn from(v: [i32; 2]) -> Self {
        Pixel::new(v[0], v[1])
    }
}

impl From<Pixel> for [i32; 2] {
    fn from(p: Pixel) -> Self {
        [p.x, p.y]
    }
}

impl From<Pixel> for Point {
    fn from(p: Pixel) -> Self {
        p.to_point()
    }
}
