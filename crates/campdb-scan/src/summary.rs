/// Aggregated counters for one or more region scans.
///
/// `errors` counts both listings dropped during validation and records that
/// exhausted their persistence retries. Merging is commutative and
/// associative, so a parallel fan-out and a sequential loop over the same
/// regions produce identical totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub found: u64,
    pub processed: u64,
    pub inserted: u64,
    pub updated: u64,
    pub errors: u64,
    pub failed_regions: Vec<String>,
}

impl ScanSummary {
    /// Folds another summary into this one.
    pub fn merge(&mut self, other: ScanSummary) {
        self.found += other.found;
        self.processed += other.processed;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.errors += other.errors;
        self.failed_regions.extend(other.failed_regions);
        self.failed_regions.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(found: u64, failed: &[&str]) -> ScanSummary {
        ScanSummary {
            found,
            processed: found,
            inserted: found / 2,
            updated: found - found / 2,
            errors: 1,
            failed_regions: failed.iter().map(|&s| s.to_owned()).collect(),
        }
    }

    #[test]
    fn merge_is_commutative() {
        let a = summary(10, &["texas"]);
        let b = summary(4, &["florida"]);

        let mut left = a.clone();
        left.merge(b.clone());
        let mut right = b;
        right.merge(a);

        assert_eq!(left, right);
    }

    #[test]
    fn merge_accumulates_counters() {
        let mut total = ScanSummary::default();
        total.merge(summary(10, &[]));
        total.merge(summary(5, &["colorado"]));

        assert_eq!(total.found, 15);
        assert_eq!(total.processed, 15);
        assert_eq!(total.errors, 2);
        assert_eq!(total.failed_regions, vec!["colorado".to_owned()]);
    }
}
