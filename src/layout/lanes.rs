//! Lane geometry: how a container's height is split into lanes.

/// Evenly spaced horizontal lanes over a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneGeometry {
    count: usize,
    line_height: f64,
}

impl LaneGeometry {
    /// Split `container_height` into `count` lanes of equal height.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(container_height: f64, count: usize) -> Self {
        let line_height = if count == 0 {
            0.0
        } else {
            container_height / count as f64
        };
        Self { count, line_height }
    }

    /// Number of lanes.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Height of every lane.
    pub const fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Top edge of `lane`.
    #[allow(clippy::cast_precision_loss)]
    pub fn top(&self, lane: usize) -> f64 {
        lane as f64 * self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let lanes = LaneGeometry::new(400.0, 10);
        assert_eq!(lanes.count(), 10);
        assert!((lanes.line_height() - 40.0).abs() < f64::EPSILON);
        assert!((lanes.top(3) - 120.0).abs() < f64::EPSILON);
    }
}
