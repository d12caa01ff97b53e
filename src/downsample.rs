/// Value emitted for every slot when there is nothing to sample.
pub const NEUTRAL_VALUE: f64 = 50.0;

/// Reduces `values` to exactly `size` points for charting.
///
/// Longer inputs are averaged per bucket; shorter inputs are stretched by
/// repeating the nearest source value. Output is clamped to 0-100.
pub fn downsample(values: &[f64], size: usize) -> Vec<f64> {
    if size == 0 {
        return Vec::new();
    }
    if values.is_empty() {
        return vec![NEUTRAL_VALUE; size];
    }

    let len = values.len();
    (0..size)
        .map(|slot| {
            let value = if len >= size {
                let from = slot * len / size;
                let to = ((slot + 1) * len / size).max(from + 1);
                let bucket = &values[from..to];
                bucket.iter().sum::<f64>() / bucket.len() as f64
            } else {
                values[slot * len / size]
            };
            value.clamp(0.0, 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_is_neutral() {
        assert_eq!(downsample(&[], 6), vec![50.0; 6]);
    }

    #[test]
    fn zero_size_is_empty() {
        assert!(downsample(&[10.0, 20.0], 0).is_empty());
    }

    #[test]
    fn averages_even_buckets() {
        let values = [0.0, 100.0, 50.0, 50.0, 20.0, 40.0];
        assert_eq!(downsample(&values, 3), vec![50.0, 50.0, 30.0]);
    }

    #[test]
    fn short_input_repeats_values() {
        assert_eq!(downsample(&[10.0, 90.0], 6), vec![10.0, 10.0, 10.0, 90.0, 90.0, 90.0]);
    }

    #[test]
    fn preserves_declining_shape() {
        let values: Vec<f64> = (0..90).map(|i| 100.0 - i as f64).collect();
        let points = downsample(&values, 6);
        assert!(points.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn deterministic_for_identical_input() {
        let values: Vec<f64> = (0..37).map(|i| ((i * 17) % 101) as f64).collect();
        assert_eq!(downsample(&values, 6), downsample(&values, 6));
    }

    proptest! {
        #[test]
        fn length_and_range_hold(
            values in proptest::collection::vec(-50.0f64..150.0, 0..200),
            size in 1usize..24,
        ) {
            let points = downsample(&values, size);
            prop_assert_eq!(points.len(), size);
            prop_assert!(points.iter().all(|v| (0.0..=100.0).contains(v)));
        }
    }
}
