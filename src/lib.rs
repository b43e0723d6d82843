//! Merge XMLTV electronic programme guides.
//!
//! Channels are deduplicated across inputs by display name, programmes are
//! remapped to the merged channel ids and written directly after their
//! channel.

pub mod config;
pub mod errors;
pub mod ingestor;
pub mod merger;
pub mod models;
pub mod service;
pub mod utils;

pub use config::Config;
pub use errors::{AppError, AppResult};
pub use merger::{merge, MergeSettings, MergedGuide};
pub use models::{MergeGroup, MergeReport, MergeWarning, SourceDocument};
pub use service::EpgMergeService;
