//! NaN-ignoring summary statistics of a variable.

use serde::{Deserialize, Serialize};

use ocean_common::FrameStack;

/// Statistics over every cell of a stack.
///
/// Value statistics skip NaN and are `None` when no valid value exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableStatistics {
    pub mean: Option<f64>,
    /// Population standard deviation.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub nan_count: usize,
    pub nan_ratio: f64,
    pub total_count: usize,
    pub shape: Vec<usize>,
}

pub fn compute_statistics(stack: &FrameStack) -> VariableStatistics {
    let mut valid: Vec<f64> = stack
        .data()
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&v| v as f64)
        .collect();

    let total_count = stack.data().len();
    let nan_count = total_count - valid.len();
    let nan_ratio = if total_count == 0 {
        0.0
    } else {
        nan_count as f64 / total_count as f64
    };

    let mut stats = VariableStatistics {
        mean: None,
        std: None,
        min: None,
        max: None,
        median: None,
        nan_count,
        nan_ratio,
        total_count,
        shape: stack.dims().to_vec(),
    };

    if valid.is_empty() {
        return stats;
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let variance = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    valid.sort_by(|a, b| a.total_cmp(b));
    let mid = valid.len() / 2;
    let median = if valid.len() % 2 == 0 {
        (valid[mid - 1] + valid[mid]) / 2.0
    } else {
        valid[mid]
    };

    stats.mean = Some(mean);
    stats.std = Some(variance.sqrt());
    stats.min = valid.first().copied();
    stats.max = valid.last().copied();
    stats.median = Some(median);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_common::GridShape;

    #[test]
    fn test_statistics_ignore_nan() {
        let data = vec![1.0, f32::NAN, 3.0, 4.0, f32::NAN, 2.0];
        let stack = FrameStack::new(data, 2, GridShape::new(1, 3)).unwrap();
        let stats = compute_statistics(&stack);

        assert_eq!(stats.mean, Some(2.5));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(4.0));
        assert_eq!(stats.median, Some(2.5));
        assert!((stats.std.unwrap() - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.nan_count, 2);
        assert!((stats.nan_ratio - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.total_count, 6);
        assert_eq!(stats.shape, vec![2, 1, 3]);
    }

    #[test]
    fn test_statistics_odd_median() {
        let stack = FrameStack::new(vec![5.0, 1.0, 3.0], 1, GridShape::new(1, 3)).unwrap();
        assert_eq!(compute_statistics(&stack).median, Some(3.0));
    }

    #[test]
    fn test_statistics_all_nan() {
        let stack = FrameStack::filled(1, GridShape::new(2, 2), f32::NAN);
        let stats = compute_statistics(&stack);
        assert!(stats.mean.is_none());
        assert!(stats.median.is_none());
        assert_eq!(stats.nan_ratio, 1.0);
    }
}
