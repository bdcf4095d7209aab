//! Print unit conversion. Every length in flowpress is in PDF points (1/72 inch).

/// Points per millimeter.
pub const POINTS_PER_MM: f64 = 2.8346456693;

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert millimeters to points.
pub fn mm(millimeters: f64) -> f64 {
    millimeters * POINTS_PER_MM
}

/// Convert inches to points.
pub fn inch(inches: f64) -> f64 {
    inches * POINTS_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_millimeter_is_about_2_83_points() {
        assert!((mm(1.0) - 2.8346).abs() < 0.001);
        assert!((mm(25.4) - inch(1.0)).abs() < 0.001);
    }
}
