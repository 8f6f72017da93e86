//! Forward-looking median smoothing
//!
//! Each position is replaced with the median of itself and the following
//! `window - 1` values. Near the end of the series the window shrinks instead
//! of running off the end, so the output always has the input's length.

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median over `[i, i + window)` for every `i`. A window of 0 behaves like 1.
pub fn median_smooth(data: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);

    (0..data.len())
        .map(|i| {
            let end = (i + window).min(data.len());
            // Never empty: i < data.len() so the slice holds at least data[i]
            median(&data[i..end]).unwrap_or(data[i])
        })
        .collect()
}
