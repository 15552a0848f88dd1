//! Headline statistics of an angle trend.

use crate::{angles::AngleSample, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric reported in the summary table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Max,
    Min,
    Mean,
    Duration,
}

impl Metric {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Max => "Max angle",
            Self::Min => "Min angle",
            Self::Mean => "Mean angle",
            Self::Duration => "Duration",
        }
    }

    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Duration => "s",
            _ => "°",
        }
    }
}

/// One row of the summary table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub metric: Metric,
    pub value: f64,
    /// Timestamp of the extreme, only for max and min
    pub moment: Option<f64>,
}

/// Fixed four-row summary: max, min, mean, duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    records: [SummaryRecord; 4],
}

impl SummaryTable {
    #[must_use]
    pub fn records(&self) -> &[SummaryRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, metric: Metric) -> SummaryRecord {
        match metric {
            Metric::Max => self.records[0],
            Metric::Min => self.records[1],
            Metric::Mean => self.records[2],
            Metric::Duration => self.records[3],
        }
    }

    /// Compare two tables within an absolute tolerance
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;
        self.records.iter().zip(&other.records).all(|(a, b)| {
            a.metric == b.metric
                && close(a.value, b.value)
                && match (a.moment, b.moment) {
                    (Some(x), Some(y)) => close(x, y),
                    (None, None) => true,
                    _ => false,
                }
        })
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:>12} {:>10}", "Metric", "Value", "Moment")?;
        for record in &self.records {
            let value = format!("{:.2}{}", record.value, record.metric.unit());
            let moment = record.moment.map_or_else(|| "-".to_string(), |t| format!("{t:.2}s"));
            writeln!(f, "{:<12} {:>12} {:>10}", record.metric.label(), value, moment)?;
        }
        Ok(())
    }
}

/// Reduce a trend to max, min, mean and duration
///
/// Non-finite samples are dropped first. Extremes report the earliest
/// timestamp at which they occur. The mean is unweighted.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if no finite sample remains.
pub fn generate_summary(samples: &[AngleSample]) -> Result<SummaryTable> {
    let valid: Vec<AngleSample> = samples
        .iter()
        .copied()
        .filter(|s| s.angle.is_finite() && s.time.is_finite())
        .collect();

    let first = *valid
        .first()
        .ok_or_else(|| Error::InvalidInput("Cannot summarize an empty angle series".to_string()))?;

    let (max, min, sum, start, end) = valid.iter().skip(1).fold(
        (first, first, first.angle, first.time, first.time),
        |(max, min, sum, start, end), s| {
            (
                if s.angle > max.angle { *s } else { max },
                if s.angle < min.angle { *s } else { min },
                sum + s.angle,
                start.min(s.time),
                end.max(s.time),
            )
        },
    );
    let mean = sum / valid.len() as f64;

    Ok(SummaryTable {
        records: [
            SummaryRecord {
                metric: Metric::Max,
                value: max.angle,
                moment: Some(max.time),
            },
            SummaryRecord {
                metric: Metric::Min,
                value: min.angle,
                moment: Some(min.time),
            },
            SummaryRecord {
                metric: Metric::Mean,
                value: mean,
                moment: None,
            },
            SummaryRecord {
                metric: Metric::Duration,
                value: end - start,
                moment: None,
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series(points: &[(f64, f64)]) -> Vec<AngleSample> {
        points.iter().map(|&(time, angle)| AngleSample { time, angle }).collect()
    }

    #[test]
    fn test_summary_values() {
        let table = generate_summary(&series(&[(1.0, 5.0), (1.1, 20.0), (1.2, -4.0), (1.5, 7.0)])).unwrap();

        let max = table.get(Metric::Max);
        assert_abs_diff_eq!(max.value, 20.0);
        assert_eq!(max.moment, Some(1.1));

        let min = table.get(Metric::Min);
        assert_abs_diff_eq!(min.value, -4.0);
        assert_eq!(min.moment, Some(1.2));

        assert_abs_diff_eq!(table.get(Metric::Mean).value, 7.0);
        assert!(table.get(Metric::Mean).moment.is_none());

        let duration = table.get(Metric::Duration);
        assert_abs_diff_eq!(duration.value, 0.5, epsilon = 1e-12);
        assert!(duration.moment.is_none());
    }

    #[test]
    fn test_fixed_row_order() {
        let table = generate_summary(&series(&[(0.0, 1.0)])).unwrap();
        let metrics: Vec<Metric> = table.records().iter().map(|r| r.metric).collect();
        assert_eq!(metrics, vec![Metric::Max, Metric::Min, Metric::Mean, Metric::Duration]);
        assert_abs_diff_eq!(table.get(Metric::Duration).value, 0.0);
    }

    #[test]
    fn test_first_extreme_wins() {
        let table = generate_summary(&series(&[(0.0, 3.0), (0.1, 9.0), (0.2, 9.0)])).unwrap();
        assert_eq!(table.get(Metric::Max).moment, Some(0.1));
    }

    #[test]
    fn test_non_finite_samples_dropped() {
        let table = generate_summary(&series(&[(0.0, f64::NAN), (0.5, 2.0), (1.0, 4.0)])).unwrap();
        assert_abs_diff_eq!(table.get(Metric::Mean).value, 3.0);
        assert_abs_diff_eq!(table.get(Metric::Duration).value, 0.5);
    }

    #[test]
    fn test_empty_series() {
        assert!(matches!(generate_summary(&[]), Err(Error::InvalidInput(_))));
        assert!(generate_summary(&series(&[(0.0, f64::NAN)])).is_err());
    }

    #[test]
    fn test_display_has_four_rows() {
        let table = generate_summary(&series(&[(0.0, 1.0), (2.0, 3.0)])).unwrap();
        let text = table.to_string();
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("Duration"));
        assert!(text.contains("2.00s"));
    }
}
