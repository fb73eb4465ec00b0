use crate::analyzers::types::OutlierSummary;
use crate::analyzers::utility::quantile;

/// Tukey fences at 1.5 × IQR. Counts are non-negative so the lower fence is
/// floored at zero.
pub fn iqr_outliers(values: &[f64]) -> OutlierSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower_bound = (q1 - 1.5 * iqr).max(0.0);
    let upper_bound = q3 + 1.5 * iqr;

    let normal = sorted
        .iter()
        .filter(|v| **v >= lower_bound && **v <= upper_bound)
        .count();

    OutlierSummary {
        q1,
        q3,
        iqr,
        lower_bound,
        upper_bound,
        total: sorted.len(),
        outliers: sorted.len() - normal,
    }
}
