//! Geometry kernel abstraction
//!
//! [`CadKernel`] bundles the two operations the converter delegates to a
//! geometry backend: generic NURBS conversion and closed-shape division.
//! [`AnalyticKernel`] implements both with exact closed-form constructions.

mod analytic;
mod divider;
mod traits;

pub use analytic::AnalyticKernel;
pub use traits::{
    CadError, CadKernel, CadResult, NullKernel, NurbsConverter, ShapeDivider, default_kernel,
};
