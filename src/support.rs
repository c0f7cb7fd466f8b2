use rayon::prelude::*;

pub const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Maps an aspect in degrees clockwise from north onto one of eight compass
/// labels. Sector boundaries sit 22.5° either side of each label.
pub fn predominant_direction(aspect_degrees: f64) -> &'static str {
    if !aspect_degrees.is_finite() {
        return "N/A";
    }
    let sector = ((aspect_degrees + 22.5) / 45.0).floor() as i64;
    DIRECTIONS[sector.rem_euclid(8) as usize]
}

/// Minimum ignoring NaN; NaN when nothing is left.
pub fn nan_min(data: &[f64]) -> f64 {
    data.par_iter()
        .copied()
        .filter(|v| !v.is_nan())
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(f64::NAN)
}

/// Maximum ignoring NaN; NaN when nothing is left.
pub fn nan_max(data: &[f64]) -> f64 {
    data.par_iter()
        .copied()
        .filter(|v| !v.is_nan())
        .max_by(|a, b| a.total_cmp(b))
        .unwrap_or(f64::NAN)
}

/// Mean ignoring NaN; NaN when nothing is left.
pub fn nan_mean(data: &[f64]) -> f64 {
    let (sum, count) = data
        .par_iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(|| (0.0, 0usize), |(s, n), v| (s + v, n + 1))
        .reduce(|| (0.0, 0usize), |a, b| (a.0 + b.0, a.1 + b.1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Share of all pixels (NaN included in the denominator) strictly above
/// `threshold`, as a percentage.
pub fn percent_above(data: &[f64], threshold: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let above = data.par_iter().filter(|&&v| v > threshold).count();
    above as f64 / data.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_north() {
        assert_eq!(predominant_direction(0.0), "N");
        assert_eq!(predominant_direction(22.4), "N");
        assert_eq!(predominant_direction(359.0), "N");
        assert_eq!(predominant_direction(360.0), "N");
    }

    #[test]
    fn test_direction_sectors() {
        assert_eq!(predominant_direction(22.5), "NE");
        assert_eq!(predominant_direction(46.0), "NE");
        assert_eq!(predominant_direction(90.0), "E");
        assert_eq!(predominant_direction(135.0), "SE");
        assert_eq!(predominant_direction(180.0), "S");
        assert_eq!(predominant_direction(225.0), "SW");
        assert_eq!(predominant_direction(270.0), "W");
        assert_eq!(predominant_direction(315.0), "NW");
        assert_eq!(predominant_direction(337.5), "N");
    }

    #[test]
    fn test_direction_negative_wraps() {
        assert_eq!(predominant_direction(-10.0), "N");
        assert_eq!(predominant_direction(-45.0), "NW");
    }

    #[test]
    fn test_direction_non_finite() {
        assert_eq!(predominant_direction(f64::NAN), "N/A");
        assert_eq!(predominant_direction(f64::INFINITY), "N/A");
    }

    #[test]
    fn test_nan_reductions() {
        let data = vec![3.0, f64::NAN, -1.0, 4.0];
        assert_eq!(nan_min(&data), -1.0);
        assert_eq!(nan_max(&data), 4.0);
        assert!((nan_mean(&data) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_reductions_all_nan() {
        let data = vec![f64::NAN, f64::NAN];
        assert!(nan_min(&data).is_nan());
        assert!(nan_max(&data).is_nan());
        assert!(nan_mean(&data).is_nan());
        assert!(nan_mean(&[]).is_nan());
    }

    #[test]
    fn test_percent_above_counts_nan_in_total() {
        let slope = vec![10.0, 31.0, f64::NAN, 45.0];
        assert_eq!(percent_above(&slope, 30.0), 50.0);
        assert_eq!(percent_above(&[30.0, 30.0], 30.0), 0.0);
        assert_eq!(percent_above(&[], 30.0), 0.0);
    }
}
