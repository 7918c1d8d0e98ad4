//! Pulls the ESMA FIRDS file index, picks the first DLTINS delta file,
//! projects its instrument records into a CSV and pushes that CSV to S3.

pub mod artifacts;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod upload;

pub use artifacts::Artifacts;
pub use config::Config;
pub use pipeline::{run, RunSummary};
pub use upload::{ObjectStore, S3Store};
