//! Realized partition shares for split reports.

use crate::splits::{SplitLabel, SplitPlan};

/// File and record share of one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionShare {
    /// Partition label.
    pub label: SplitLabel,
    /// Files in the partition.
    pub files: usize,
    /// Fraction of eligible files.
    pub file_share: f64,
    /// Records in the partition.
    pub records: usize,
    /// Fraction of all split records.
    pub record_share: f64,
}

/// Fraction `part / total`, or `0.0` when `total` is zero.
pub fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Compute per-partition file and record shares in canonical split order.
pub fn partition_shares(plan: &SplitPlan) -> Vec<PartitionShare> {
    let total_files = plan.file_count();
    let total_records = plan.record_count();
    plan.partitions()
        .map(|partition| {
            let files = partition.files.len();
            let records = partition.record_count();
            PartitionShare {
                label: partition.label,
                files,
                file_share: share(files, total_files),
                records,
                record_share: share(records, total_records),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_handles_empty_totals() {
        assert_eq!(share(3, 0), 0.0);
        assert!((share(1, 4) - 0.25).abs() < 1e-12);
    }
}
