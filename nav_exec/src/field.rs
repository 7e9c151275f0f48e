//! # Playing field
//!
//! The field is a square grid of `map_tile_size` tiles, each `tile_length_cm` long. The origin is
//! the grid intersection nearest corner 1, so the walls stand at `-tile_length_cm` and
//! `(map_tile_size - 1) * tile_length_cm` on both axes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::convert::TryFrom;

use nalgebra::Point2;
use serde::Deserialize;
use thiserror::Error;
use util::maths::round_to_multiple;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Dimensions of the field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldParams {
    /// Grid spacing, used for waypoints and for drift-correction snapping.
    ///
    /// Units: centimeters
    pub tile_length_cm: f64,

    /// Number of tiles along each side of the field.
    pub map_tile_size: u32,
}

/// One of the four field corners, numbered counter-clockwise from the origin corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Corner(u8);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CornerError {
    #[error("Corners are numbered 1 to 4, found {0}")]
    OutOfRange(u8),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            tile_length_cm: 30.48,
            map_tile_size: 12,
        }
    }
}

impl FieldParams {
    /// Coordinate of the walls on the low side of each axis.
    pub fn low_wall_cm(&self) -> f64 {
        -self.tile_length_cm
    }

    /// Coordinate of the walls on the high side of each axis.
    pub fn high_wall_cm(&self) -> f64 {
        (self.map_tile_size as f64 - 1.0) * self.tile_length_cm
    }

    /// The grid intersection closest to the given point.
    pub fn nearest_grid_point(&self, point: Point2<f64>) -> Point2<f64> {
        Point2::new(
            round_to_multiple(point.x, self.tile_length_cm),
            round_to_multiple(point.y, self.tile_length_cm),
        )
    }
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner(1), Corner(2), Corner(3), Corner(4)];

    pub fn number(self) -> u8 {
        self.0
    }

    /// Quarter turns from corner 1 to this corner.
    pub fn quarter_turns(self) -> u8 {
        self.0 - 1
    }

    /// Centre of the tile in this corner of the field.
    pub fn tile_centre(self, field: &FieldParams) -> Point2<f64> {
        let low = field.low_wall_cm() + field.tile_length_cm / 2.0;
        let high = field.high_wall_cm() - field.tile_length_cm / 2.0;

        match self.0 {
            1 => Point2::new(low, low),
            2 => Point2::new(high, low),
            3 => Point2::new(high, high),
            _ => Point2::new(low, high),
        }
    }
}

impl TryFrom<u8> for Corner {
    type Error = CornerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=4 => Ok(Corner(value)),
            _ => Err(CornerError::OutOfRange(value)),
        }
    }
}

impl std::fmt::Display for Corner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "corner {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_conversion() {
        assert_eq!(Corner::try_from(3).map(Corner::number), Ok(3));
        assert_eq!(Corner::try_from(0), Err(CornerError::OutOfRange(0)));
        assert_eq!(Corner::try_from(5), Err(CornerError::OutOfRange(5)));
    }

    #[test]
    fn test_field_geometry() {
        let field = FieldParams::default();

        assert_eq!(field.low_wall_cm(), -30.48);
        assert!((field.high_wall_cm() - 11.0 * 30.48).abs() < 1e-9);

        let p = field.nearest_grid_point(Point2::new(44.0, -16.0));
        assert_eq!(p, Point2::new(30.48, -30.48));

        let c3 = Corner::ALL[2].tile_centre(&field);
        assert!((c3.x - 10.5 * 30.48).abs() < 1e-9);
        assert_eq!(c3.x, c3.y);
    }
}
