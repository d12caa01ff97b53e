/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole` as a 0-100 share; 0 when `whole` is 0.
pub fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Rounded 0-100 share.
pub fn percent(part: usize, whole: usize) -> u32 {
    share(part, whole).round().clamp(0.0, 100.0) as u32
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (total, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(total, count), value| (total + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}
