/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; for even lengths, the average of the two middle values.
/// `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_have_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[7.0]), Some(7.0));
    }

    #[test]
    fn median_ignores_input_order() {
        let base = [10.0, 250.0, 3.0, 99.0, 42.0, 8.0];
        let expected = median(&base);
        let mut rotated = base;
        for _ in 0..base.len() {
            rotated.rotate_left(1);
            assert_eq!(median(&rotated), expected);
        }
        let mut reversed = base;
        reversed.reverse();
        assert_eq!(median(&reversed), expected);
    }

    #[test]
    fn mean_of_samples() {
        assert_eq!(mean(&[100.0, 200.0, 300.0]), Some(200.0));
        assert_eq!(mean(&[-5.0, 5.0]), Some(0.0));
    }
}
