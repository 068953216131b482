//! Batch QC table and its aggregate summary.

use crate::qc::QcRecord;
use crate::util::math::{mean, median};

/// Aggregate of one metric over a batch, undefined values excluded.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSummary {
    pub name: &'static str,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// QC records of a batch, ordered by frame identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QcTable {
    rows: Vec<QcRecord>,
}

impl QcTable {
    pub fn new(mut rows: Vec<QcRecord>) -> Self {
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Self { rows }
    }

    pub fn rows(&self) -> &[QcRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count, mean, median and maximum of every metric.
    pub fn summary(&self) -> Vec<MetricSummary> {
        QcRecord::METRICS
            .iter()
            .enumerate()
            .map(|(index, &name)| {
                let values: Vec<f64> = self
                    .rows
                    .iter()
                    .filter_map(|row| row.values()[index])
                    .filter(|v| v.is_finite())
                    .collect();
                MetricSummary {
                    name,
                    count: values.len(),
                    mean: mean(values.iter().copied().map(Some)),
                    median: median(values.iter().copied().map(Some)),
                    max: values.iter().copied().reduce(f64::max),
                }
            })
            .collect()
    }
}
