//! Accelerometer samples and magnitude reduction

/// One tri-axial acceleration reading in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Reduce a sample to the scalar the trigger compares against the threshold.
pub fn reduce(sample: &Sample) -> f64 {
    sample.magnitude()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sample_has_zero_magnitude() {
        assert_eq!(reduce(&Sample::new(0.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn unit_diagonal() {
        let m = reduce(&Sample::new(1.0, 1.0, 1.0));
        assert!((m - 3f64.sqrt()).abs() < 1e-12, "magnitude={m}");
    }

    #[test]
    fn matches_direct_computation() {
        let cases: [(f64, f64, f64); 4] = [
            (3.0, 4.0, 0.0),
            (-6.0, 6.0, -6.0),
            (0.12, -9.81, 0.4),
            (156.9, -156.9, 156.9), // ±16 g full scale
        ];
        for (x, y, z) in cases {
            let expected = (x * x + y * y + z * z).sqrt();
            let m = Sample::new(x, y, z).magnitude();
            assert!((m - expected).abs() < 1e-9, "({x}, {y}, {z}) -> {m}, expected {expected}");
        }
    }

    #[test]
    fn sign_does_not_matter() {
        let a = Sample::new(2.0, -3.0, 6.0).magnitude();
        let b = Sample::new(-2.0, 3.0, -6.0).magnitude();
        assert_eq!(a, 7.0);
        assert_eq!(a, b);
    }

    #[test]
    fn shock_sample_exceeds_default_threshold() {
        // {6,6,6} is the canonical trigger in the end-to-end scenario
        let m = reduce(&Sample::new(6.0, 6.0, 6.0));
        assert!(m > 10.0);
        assert!((m - 10.392_304_845_413_264).abs() < 1e-12);
    }
}
