//! Named bounding-box presets for US scan regions.
//!
//! A bbox is `minLon,minLat,maxLon,maxLat`, matching the upstream search
//! API's `filter[search][bbox]` parameter.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: &'static str,
    pub bbox: &'static str,
}

/// Full contiguous-US bounding box.
pub const US_BOUNDS: &str = "-125.0,24.0,-66.0,49.5";

/// All named regions, including the sub-regions used for a full-US sweep.
pub const NAMED_REGIONS: &[Region] = &[
    Region {
        name: "us",
        bbox: US_BOUNDS,
    },
    Region {
        name: "western_us",
        bbox: "-125.0,31.3,-102.0,49.0",
    },
    Region {
        name: "midwest_us",
        bbox: "-104.0,36.0,-80.5,49.4",
    },
    Region {
        name: "southern_us",
        bbox: "-106.6,24.5,-75.5,36.5",
    },
    Region {
        name: "eastern_us",
        bbox: "-82.0,36.5,-66.9,47.5",
    },
    Region {
        name: "pacific_northwest",
        bbox: "-125.0,42.0,-110.0,49.0",
    },
    Region {
        name: "southwest_us",
        bbox: "-120.0,31.3,-102.0,42.0",
    },
    Region {
        name: "northeast_us",
        bbox: "-80.5,40.5,-66.9,47.5",
    },
    Region {
        name: "southeast_us",
        bbox: "-92.0,24.5,-75.5,36.6",
    },
    Region {
        name: "california",
        bbox: "-124.4,32.5,-114.1,42.0",
    },
    Region {
        name: "texas",
        bbox: "-106.6,25.8,-93.5,36.5",
    },
    Region {
        name: "florida",
        bbox: "-87.6,24.5,-80.0,31.0",
    },
    Region {
        name: "colorado",
        bbox: "-109.1,37.0,-102.0,41.0",
    },
    Region {
        name: "new_york",
        bbox: "-79.8,40.5,-71.8,45.0",
    },
];

/// The sub-regions that together cover the contiguous US for a parallel sweep.
///
/// Overlap at the seams is fine: the persister is keyed by listing id, so a
/// campground seen from two regions upserts to the same row.
pub const US_SWEEP_REGIONS: &[&str] = &[
    "western_us",
    "midwest_us",
    "southern_us",
    "eastern_us",
    "pacific_northwest",
    "southwest_us",
    "northeast_us",
    "southeast_us",
];

/// Every region a caller may name, in declaration order.
#[must_use]
pub fn named_regions() -> &'static [Region] {
    NAMED_REGIONS
}

/// Look up a region preset by name.
#[must_use]
pub fn find_region(name: &str) -> Option<&'static Region> {
    NAMED_REGIONS.iter().find(|r| r.name == name)
}

/// Resolve the full-US sweep into its region presets.
#[must_use]
pub fn us_sweep() -> Vec<&'static Region> {
    US_SWEEP_REGIONS
        .iter()
        .filter_map(|name| find_region(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_region_resolves_known_names() {
        let region = find_region("california").expect("california preset");
        assert_eq!(region.bbox, "-124.4,32.5,-114.1,42.0");
        assert!(find_region("atlantis").is_none());
    }

    #[test]
    fn us_sweep_resolves_every_name() {
        let regions = us_sweep();
        assert_eq!(regions.len(), US_SWEEP_REGIONS.len());
    }

    #[test]
    fn bboxes_are_well_formed() {
        for region in named_regions() {
            let parts: Vec<f64> = region
                .bbox
                .split(',')
                .map(|p| p.parse().expect("numeric bbox component"))
                .collect();
            assert_eq!(parts.len(), 4, "bbox for {} has 4 components", region.name);
            let (min_lon, min_lat, max_lon, max_lat) =
                (parts[0], parts[1], parts[2], parts[3]);
            assert!(min_lon < max_lon, "{}: lon order", region.name);
            assert!(min_lat < max_lat, "{}: lat order", region.name);
            assert!((-180.0..=180.0).contains(&min_lon));
            assert!((-90.0..=90.0).contains(&max_lat));
        }
    }
}
