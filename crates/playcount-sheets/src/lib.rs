pub mod a1;
pub mod client;
pub mod config_source;
pub mod debug_log;
pub mod error;
pub mod header;
pub mod store;
pub mod types;
pub mod upsert;

pub use client::SheetsClient;
pub use config_source::read_targets;
pub use debug_log::{debug_row, failure_rows, record_failures};
pub use error::SheetsError;
pub use header::{ensure_views_header, plan_header, read_header_plan, HeaderPlan};
pub use store::{cell_text, RangeWrite, Rows, TabularStore};
pub use upsert::{apply_upsert, plan_upsert, UpsertPlan};
