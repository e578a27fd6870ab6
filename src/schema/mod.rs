//! Schema module - Data, report and configuration types for formula evolution.

mod config;
mod encoding;
mod evolution;
mod features;
mod formula;
mod report;
mod signature;

pub use config::*;
pub use encoding::*;
pub use evolution::*;
pub use features::*;
pub use formula::*;
pub use report::*;
pub use signature::*;
