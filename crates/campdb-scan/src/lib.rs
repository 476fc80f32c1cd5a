//! Region orchestration: bounded parallel scans across bounding boxes and the
//! deferred address-backfill pipeline.

pub mod backfill;
pub mod region;
pub mod scan;
pub mod summary;

pub use backfill::{backfill_addresses, BackfillTotals};
pub use region::{RegionPhase, RegionReport, RegionTask};
pub use scan::{scan_region, scan_regions, ScanDeps, ScanOptions};
pub use summary::ScanSummary;
