//! # AdPulse
//!
//! Umbrella crate for the ad-metric forecasting workspace. It re-exports
//! the pipeline crate and the numeric crate under one name.
//!
//! ## Example
//!
//! ```
//! use adpulse_workspace::forecast::anomaly::Classification;
//!
//! assert_eq!(Classification::from_bounds(12.0, 8.0, 11.0), Classification::Positive);
//! assert_eq!(Classification::from_bounds(11.0, 8.0, 11.0), Classification::Normal);
//! ```

pub use ad_forecast as forecast;
pub use series_math as math;

/// Version of the workspace facade
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
