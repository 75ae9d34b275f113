use std::str::FromStr;

use inf::float_equal;
use rayon::prelude::*;

use crate::{Error, Result};

/// The statistics computed per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticKind {
    ValidNumber,
    Mean,
    Min,
    Max,
    Std,
    Range,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 6] = [
        StatisticKind::ValidNumber,
        StatisticKind::Mean,
        StatisticKind::Min,
        StatisticKind::Max,
        StatisticKind::Std,
        StatisticKind::Range,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            StatisticKind::ValidNumber => "VALID_CELLNUMBER",
            StatisticKind::Mean => "MEAN",
            StatisticKind::Min => "MIN",
            StatisticKind::Max => "MAX",
            StatisticKind::Std => "STD",
            StatisticKind::Range => "RANGE",
        }
    }
}

impl FromStr for StatisticKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StatisticKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownStatistic(s.to_string()))
    }
}

/// Statistics of the valid values of a single layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStatistics {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    pub range: f64,
}

impl LayerStatistics {
    /// Statistics of a layer without valid values, everything except the count is `nodata`.
    pub fn empty(nodata: f64) -> Self {
        LayerStatistics {
            count: 0,
            mean: nodata,
            min: nodata,
            max: nodata,
            std: nodata,
            range: nodata,
        }
    }

    /// Computes the statistics of the values that differ from `nodata`.
    /// The standard deviation is the population standard deviation, computed with a separate
    /// pass over the deviations from the mean.
    pub fn compute(values: &[f64], nodata: f64) -> Self {
        let valid: Vec<f64> = values
            .par_iter()
            .copied()
            .filter(|&v| !v.is_nan() && !float_equal(v, nodata))
            .collect();

        if valid.is_empty() {
            return LayerStatistics::empty(nodata);
        }

        let count = valid.len();
        let sum: f64 = valid.par_iter().sum();
        let (min, max) = valid
            .par_iter()
            .fold(
                || (f64::INFINITY, f64::NEG_INFINITY),
                |(min, max), &v| (min.min(v), max.max(v)),
            )
            .reduce(
                || (f64::INFINITY, f64::NEG_INFINITY),
                |(min1, max1), (min2, max2)| (min1.min(min2), max1.max(max2)),
            );

        let mean = sum / count as f64;
        let squared_deviations: f64 = valid.par_iter().map(|v| (v - mean) * (v - mean)).sum();

        LayerStatistics {
            count,
            mean,
            min,
            max,
            std: (squared_deviations / count as f64).sqrt(),
            range: max - min,
        }
    }

    pub fn get(&self, kind: StatisticKind) -> f64 {
        match kind {
            StatisticKind::ValidNumber => self.count as f64,
            StatisticKind::Mean => self.mean,
            StatisticKind::Min => self.min,
            StatisticKind::Max => self.max,
            StatisticKind::Std => self.std,
            StatisticKind::Range => self.range,
        }
    }
}
