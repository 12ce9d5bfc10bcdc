// src/dsp.rs
//
// Small signal helpers for the jump analysis: trailing averages, discrete
// derivatives and extremum searches over the center-of-mass height signal.
use nalgebra::Vector3;

/// Index of an extremum together with the value found there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexValue {
    pub index: usize,
    pub value: f64,
}

/// Trailing moving average. Early samples average over the available prefix.
pub fn moving_average(signal: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return signal.to_vec();
    }
    let mut out = Vec::with_capacity(signal.len());
    let mut sum = 0.0;
    for (i, value) in signal.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= signal[i - window];
        }
        let count = (i + 1).min(window);
        out.push(sum / count as f64);
    }
    out
}

/// Differences between consecutive samples. Output is one shorter than input.
pub fn first_derivative(signal: &[f64]) -> Vec<f64> {
    signal.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Elementwise division of two equally long arrays. A zero denominator
/// yields zero rather than an infinity that would dominate extremum searches.
pub fn divide_arrays(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator.iter())
        .map(|(n, d)| if *d == 0.0 { 0.0 } else { n / d })
        .collect()
}

/// Largest value in `signal[start..end]`.
pub fn find_maximum(signal: &[f64], start: usize, end: usize) -> Option<IndexValue> {
    let end = end.min(signal.len());
    let mut best: Option<IndexValue> = None;
    for (index, value) in signal.iter().enumerate().take(end).skip(start) {
        if best.map(|b| *value > b.value).unwrap_or(true) {
            best = Some(IndexValue {
                index,
                value: *value,
            });
        }
    }
    best
}

/// Smallest value in `signal[start..end]`.
pub fn find_minimum(signal: &[f64], start: usize, end: usize) -> Option<IndexValue> {
    let end = end.min(signal.len());
    let mut best: Option<IndexValue> = None;
    for (index, value) in signal.iter().enumerate().take(end).skip(start) {
        if best.map(|b| *value < b.value).unwrap_or(true) {
            best = Some(IndexValue {
                index,
                value: *value,
            });
        }
    }
    best
}

/// Interior angle at `b` formed by the segments to `a` and `c`, in degrees.
///
/// A straight chain gives 180 degrees. Degenerate segments give 0.
pub fn angle_deg(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    let v1 = a - b;
    let v2 = c - b;
    let mag1 = v1.norm();
    let mag2 = v2.norm();
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }
    let cos_angle = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_of_constant_is_constant() {
        let signal = [2.5; 12];
        for value in moving_average(&signal, 5) {
            assert!((value - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn moving_average_uses_trailing_window() {
        let signal = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = moving_average(&signal, 3);
        assert_eq!(out.len(), 5);
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[1] - 1.5).abs() < 1e-12);
        assert!((out[2] - 2.0).abs() < 1e-12);
        assert!((out[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_and_division() {
        let signal = [0.0, 1.0, 3.0, 6.0];
        let d = first_derivative(&signal);
        assert_eq!(d, vec![1.0, 2.0, 3.0]);

        let dt = [2.0, 2.0, 0.0];
        assert_eq!(divide_arrays(&d, &dt), vec![0.5, 1.0, 0.0]);
    }

    #[test]
    fn extremum_search_respects_range() {
        let signal = [0.0, 5.0, -2.0, 3.0, -4.0];
        let max = find_maximum(&signal, 0, signal.len()).unwrap();
        assert_eq!((max.index, max.value), (1, 5.0));

        let min = find_minimum(&signal, 2, 4).unwrap();
        assert_eq!((min.index, min.value), (2, -2.0));

        assert!(find_maximum(&signal, 3, 3).is_none());
    }

    #[test]
    fn angle_of_perpendicular_and_straight_chains() {
        let origin = Vector3::zeros();
        let up = Vector3::new(0.0, 1.0, 0.0);
        let right = Vector3::new(1.0, 0.0, 0.0);
        let down = Vector3::new(0.0, -1.0, 0.0);

        assert!((angle_deg(&up, &origin, &right) - 90.0).abs() < 1e-9);
        assert!((angle_deg(&up, &origin, &down) - 180.0).abs() < 1e-9);
        assert_eq!(angle_deg(&origin, &origin, &right), 0.0);
    }
}
