//! Processing pipeline.
//!
//! - `normalize`: raw feed records into canonical products
//! - `diff`: classify changes against the last snapshot
//! - `voucher`: price tier annotations
//! - `monitor`: the poll loop driving fetch, diff, notify and persist

pub mod diff;
pub mod monitor;
pub mod normalize;
pub mod voucher;

pub use diff::{DiffResult, calculate_diff};
pub use monitor::{CycleOutcome, CycleReport, Monitor};
pub use normalize::{NormalizedBatch, Normalizer, PRICE_NOT_AVAILABLE};
pub use voucher::{VoucherTier, voucher_annotation};
