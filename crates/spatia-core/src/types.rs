//! Common types for Spatia
//!
//! This module contains the fundamental types shared by every renderer:
//! the sample type, the 3-D position/direction vector used for source and
//! speaker geometry, and global defaults.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Default sample rate (48kHz - standard professional audio rate)
/// This is the default; actual rate comes from the render configuration.
pub const SAMPLE_RATE: u32 = 48000;

/// Default audio block size in frames
pub const BLOCK_SIZE: usize = 256;

/// Default speed of sound in m/s
pub const SPEED_OF_SOUND: f64 = 340.0;

/// -3 dB, the on-axis gain of the FuMa `W` channel (1/sqrt(2))
pub const MIN3DB: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Degrees to radians
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Audio sample type (32-bit float for all processing)
pub type Sample = f32;

/// Cartesian position or direction in metres
///
/// Coordinate convention: `x` points to the front, `y` to the left and `z`
/// up. Azimuth is measured counter-clockwise from the x axis, elevation
/// upwards from the horizontal plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Unit vector pointing to the front
    pub const FRONT: Position = Position { x: 1.0, y: 0.0, z: 0.0 };

    /// Create a new position
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a position from spherical coordinates (radius, azimuth and
    /// elevation in radians)
    pub fn from_sphere(r: f64, az: f64, el: f64) -> Self {
        let rc = r * el.cos();
        Self {
            x: rc * az.cos(),
            y: rc * az.sin(),
            z: r * el.sin(),
        }
    }

    /// Create a position from spherical coordinates given in degrees
    pub fn from_sphere_deg(r: f64, az_deg: f64, el_deg: f64) -> Self {
        Self::from_sphere(r, az_deg * DEG2RAD, el_deg * DEG2RAD)
    }

    /// Euclidean length
    #[inline]
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction
    ///
    /// A zero-length vector has no direction; it maps to [`Position::FRONT`]
    /// so that a source sitting exactly on the receiver still pans
    /// deterministically.
    pub fn normal(&self) -> Self {
        let n = self.norm();
        if n > 0.0 {
            *self * (1.0 / n)
        } else {
            Self::FRONT
        }
    }

    /// Azimuth in radians, counter-clockwise from the x axis
    #[inline]
    pub fn azim(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Elevation in radians above the horizontal plane
    #[inline]
    pub fn elev(&self) -> f64 {
        self.z.atan2(self.x.hypot(self.y))
    }

    /// Dot product
    #[inline]
    pub fn dot(&self, other: &Position) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[inline]
    pub fn cross(&self, other: &Position) -> Position {
        Position::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Distance between two points
    #[inline]
    pub fn distance(&self, other: &Position) -> f64 {
        (*self - *other).norm()
    }

    /// Rotate around the z axis by `angle` radians
    pub fn rot_z(&self, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            x: c * self.x - s * self.y,
            y: s * self.x + c * self.y,
            z: self.z,
        }
    }
}

impl Add for Position {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Position {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Position {
    type Output = Self;

    #[inline]
    fn mul(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Neg for Position {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Convert decibels to a linear gain factor
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_roundtrip() {
        let p = Position::from_sphere_deg(2.0, 90.0, 0.0);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((p.azim() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(p.elev().abs() < 1e-12);
    }

    #[test]
    fn test_normal_of_zero_is_front() {
        assert_eq!(Position::default().normal(), Position::FRONT);
        let n = Position::new(3.0, 4.0, 0.0).normal();
        assert!((n.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rot_z() {
        let p = Position::FRONT.rot_z(std::f64::consts::FRAC_PI_2);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_product() {
        let z = Position::new(1.0, 0.0, 0.0).cross(&Position::new(0.0, 1.0, 0.0));
        assert_eq!(z, Position::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_db_to_gain() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-12);
        assert!((db_to_gain(-20.0) - 0.1).abs() < 1e-12);
    }
}
