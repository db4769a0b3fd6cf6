//! Statistics engine: weight mean, population variance, and standard deviation.
//!
//! ```text
//! mean     = Σw / n
//! variance = Σ(w - mean)² / n      (population, divisor n)
//! std_dev  = √variance
//! ```
//!
//! An empty collection yields all zeros. Unit conversion multiplies mean and
//! standard deviation by the unit factor and variance by its square.

use crate::domain::{MaterialRecord, UnitType};

/// Weight statistics for one collection, in a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightStatistics {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl WeightStatistics {
    /// Rescales gram statistics into `unit`.
    #[must_use]
    pub fn in_unit(self, unit: UnitType) -> Self {
        let factor = unit.factor();
        Self {
            mean: self.mean * factor,
            variance: self.variance * factor * factor,
            std_dev: self.std_dev * factor,
        }
    }
}

/// Computes gram statistics over any collection of records.
///
/// # Examples
///
/// ```
/// use material_tracker::domain::MaterialRecord;
/// use material_tracker::pipeline::stats::compute;
///
/// let records = vec![
///     MaterialRecord::new("a", "red", 100, true, "bar"),
///     MaterialRecord::new("b", "red", 300, true, "bar"),
/// ];
/// let stats = compute(&records);
/// assert_eq!(stats.mean, 200.0);
/// assert_eq!(stats.variance, 10000.0);
/// assert_eq!(stats.std_dev, 100.0);
/// ```
#[must_use]
pub fn compute<'a, I>(items: I) -> WeightStatistics
where
    I: IntoIterator<Item = &'a MaterialRecord>,
    I::IntoIter: Clone,
{
    let iter = items.into_iter();

    let (count, sum) = iter
        .clone()
        .fold((0_u64, 0.0_f64), |(n, s), r| (n + 1, s + weight(r)));

    if count == 0 {
        return WeightStatistics::default();
    }

    #[allow(clippy::cast_precision_loss)]
    let n = count as f64;
    let mean = sum / n;
    let variance = iter.map(|r| (weight(r) - mean).powi(2)).sum::<f64>() / n;

    WeightStatistics {
        mean,
        variance,
        std_dev: variance.sqrt(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn weight(record: &MaterialRecord) -> f64 {
    record.weight_grams as f64
}

/// Which collection the summary card describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsScope {
    /// Every record in the snapshot.
    #[default]
    All,
    /// Only the records passing the active filters.
    Filtered,
}

/// Summary card contents: count plus statistics in grams and in the display unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightSummary {
    pub count: usize,
    pub total_grams: u64,
    pub grams: WeightStatistics,
    pub unit: UnitType,
    pub display: WeightStatistics,
}

/// Builds the summary card for a collection in the given unit.
#[must_use]
pub fn summarize(items: &[MaterialRecord], unit: UnitType) -> WeightSummary {
    let grams = compute(items);
    WeightSummary {
        count: items.len(),
        total_grams: items.iter().map(|r| r.weight_grams).fold(0, u64::saturating_add),
        grams,
        unit,
        display: grams.in_unit(unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(ws: &[u64]) -> Vec<MaterialRecord> {
        ws.iter()
            .enumerate()
            .map(|(i, w)| MaterialRecord::new(i.to_string(), "c", *w, false, "k"))
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn empty_collection_is_all_zero() {
        assert_eq!(compute(&weights(&[])), WeightStatistics::default());
    }

    #[test]
    fn single_item_has_zero_spread() {
        let stats = compute(&weights(&[42]));
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn population_variance_uses_n_divisor() {
        let stats = compute(&weights(&[50, 100, 800]));
        assert!(close(stats.mean, 316.666_666_666_666_7));
        assert!(close(stats.variance, 117_222.222_222_222_2));
        assert!(close(stats.std_dev, 342.377_309_736_235_6));
    }

    #[test]
    fn unit_conversion_scales_variance_by_factor_squared() {
        let grams = compute(&weights(&[50, 100, 800]));
        let kg = grams.in_unit(UnitType::Kilograms);
        assert!(close(kg.mean, grams.mean * 0.001));
        assert!(close(kg.variance, grams.variance * 0.000_001));
        assert!(close(kg.std_dev, grams.std_dev * 0.001));

        let lb = grams.in_unit(UnitType::Pounds);
        assert!(close(lb.std_dev, grams.std_dev * 0.002_204_62));
    }

    #[test]
    fn summary_reports_count_and_total_alongside() {
        let summary = summarize(&weights(&[1000, 3000]), UnitType::Kilograms);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_grams, 4000);
        assert!(close(summary.display.mean, 2.0));
        assert!(close(summary.grams.mean, 2000.0));
    }
}
