//! Axis-aligned bounding box over every ingested point

use super::types::Point;
use serde::Serialize;

/// Running min/max per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Empty box; the first extended point initialises both corners
    pub fn empty() -> Self {
        Self {
            min: [f32::MAX; 3],
            max: [f32::MIN; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }

    pub fn extend(&mut self, point: &Point) {
        let coords = [point.x, point.y, point.z];
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(coords[axis]);
            self.max[axis] = self.max[axis].max(coords[axis]);
        }
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Largest extent over the three axes
    pub fn max_extent(&self) -> f32 {
        (0..3)
            .map(|axis| self.max[axis] - self.min[axis])
            .fold(0.0, f32::max)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_initialises_box() {
        let mut bounds = Bounds::empty();
        assert!(bounds.is_empty());

        bounds.extend(&Point::new(-1.0, 2.0, 3.0));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, [-1.0, 2.0, 3.0]);
        assert_eq!(bounds.max, [-1.0, 2.0, 3.0]);

        bounds.extend(&Point::new(4.0, -5.0, 3.5));
        assert_eq!(bounds.min, [-1.0, -5.0, 3.0]);
        assert_eq!(bounds.max, [4.0, 2.0, 3.5]);
        assert_eq!(bounds.max_extent(), 7.0);
        assert_eq!(bounds.center(), [1.5, -1.5, 3.25]);
    }
}
