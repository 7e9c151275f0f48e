//! Waypoint queue

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered sequence of points to visit, replaced as a whole by every travel command.
///
/// The queue always holds at least one point and `index` always refers to one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointQueue {
    points: Vec<Point2<f64>>,
    index: usize,

    /// Approach the points with the rear of the robot leading.
    pub backwards: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for WaypointQueue {
    fn default() -> Self {
        Self::single(Point2::origin(), false)
    }
}

impl WaypointQueue {
    /// A queue going straight to one point.
    pub fn single(point: Point2<f64>, backwards: bool) -> Self {
        Self {
            points: vec![point],
            index: 0,
            backwards,
        }
    }

    /// An axis-aligned route from `from` to `to` through one corner point.
    ///
    /// With `y_first` the robot first holds its X coordinate and travels along Y, otherwise it
    /// holds Y and travels along X.
    pub fn square(from: Point2<f64>, to: Point2<f64>, backwards: bool, y_first: bool) -> Self {
        let corner = if y_first {
            Point2::new(from.x, to.y)
        } else {
            Point2::new(to.x, from.y)
        };

        Self {
            points: vec![corner, to],
            index: 0,
            backwards,
        }
    }

    /// The point currently being pursued.
    pub fn target(&self) -> Point2<f64> {
        self.points[self.index]
    }

    /// The last point of the queue.
    pub fn final_target(&self) -> Point2<f64> {
        self.points[self.points.len() - 1]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Move on to the next point, returning `false` if the current one was the last.
    pub fn advance(&mut self) -> bool {
        if self.index + 1 < self.points.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_routes() {
        let from = Point2::new(10.0, 20.0);
        let to = Point2::new(90.0, 60.0);

        let x_first = WaypointQueue::square(from, to, false, false);
        assert_eq!(x_first.points(), &[Point2::new(90.0, 20.0), to]);

        let y_first = WaypointQueue::square(from, to, true, true);
        assert_eq!(y_first.points(), &[Point2::new(10.0, 60.0), to]);
        assert!(y_first.backwards);
    }

    #[test]
    fn test_advance_stays_in_bounds() {
        let mut q = WaypointQueue::square(Point2::origin(), Point2::new(1.0, 1.0), false, false);

        assert!(q.advance());
        assert_eq!(q.target(), q.final_target());
        assert!(!q.advance());
        assert!(!q.advance());
        assert_eq!(q.index(), 1);
    }
}
