//! Analytics over typing-race histories: smoothed trends, personal-best
//! trajectories, distributions, scatter decimation and daily aggregates.
//!
//! Everything under the analytics modules is pure and synchronous. Only
//! [`store`] and [`acquire`] touch the outside world.
pub mod acquire;
pub mod animation;
pub mod app_dirs;
pub mod chart;
pub mod config;
pub mod daily;
pub mod decimate;
pub mod error;
pub mod histogram;
pub mod personal_best;
pub mod record;
pub mod smoothing;
pub mod store;
pub mod util;

pub use error::{AcquireError, AnalyticsError, AnalyticsResult, StoreError};
pub use personal_best::PbMode;
pub use record::{Record, RecordSequence};
