use campdb_core::Region;

use crate::summary::ScanSummary;

/// One unit of scan work: a named bounding box with an optional page cap.
#[derive(Debug, Clone)]
pub struct RegionTask {
    pub name: String,
    pub bbox: String,
    pub max_pages: Option<u32>,
}

impl RegionTask {
    #[must_use]
    pub fn from_region(region: &Region, max_pages: Option<u32>) -> Self {
        Self {
            name: region.name.to_owned(),
            bbox: region.bbox.to_owned(),
            max_pages,
        }
    }

    /// Builds a task for a raw bounding box with no named region behind it.
    #[must_use]
    pub fn from_bbox(bbox: impl Into<String>, max_pages: Option<u32>) -> Self {
        let bbox = bbox.into();
        Self {
            name: format!("bbox:{bbox}"),
            bbox,
            max_pages,
        }
    }
}

/// Where a region's scan ended up. Regions move strictly forward through
/// `Pending → Fetching → Processing → Persisting` and finish in `Done` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPhase {
    Pending,
    Fetching,
    Processing,
    Persisting,
    Done,
    Failed,
}

/// Final state of one region scan: its terminal phase and the counters it
/// contributes to the run total. A failed region still reports the partial
/// counts it accumulated before the failure.
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub region: String,
    pub phase: RegionPhase,
    pub summary: ScanSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_region_copies_name_and_bbox() {
        let region = Region {
            name: "california",
            bbox: "-124.4,32.5,-114.1,42.0",
        };
        let task = RegionTask::from_region(&region, Some(3));
        assert_eq!(task.name, "california");
        assert_eq!(task.bbox, "-124.4,32.5,-114.1,42.0");
        assert_eq!(task.max_pages, Some(3));
    }

    #[test]
    fn from_bbox_derives_a_name() {
        let task = RegionTask::from_bbox("-1.0,2.0,3.0,4.0", None);
        assert_eq!(task.name, "bbox:-1.0,2.0,3.0,4.0");
        assert!(task.max_pages.is_none());
    }
}
