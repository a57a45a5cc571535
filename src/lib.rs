//! # AvoCast workspace
//!
//! Umbrella crate over the workspace members:
//!
//! - [`avocast`]: series preparation, holiday tables, forecast evaluation and diagnostics
//! - [`series_math`]: numeric kernels (interpolation, quantiles, least squares)
//!
//! ## Example
//!
//! ```
//! use avocast_workspace::series_math::quantile_linear;
//!
//! let q = quantile_linear(&[1.0, 2.0, 3.0, 4.0], 0.5).unwrap();
//! assert_eq!(q, 2.5);
//! ```

pub use avocast;
pub use series_math;

pub use avocast::{AvocastError, Pipeline, PipelineConfig};
pub use series_math::MathError;
