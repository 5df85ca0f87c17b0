//! B-Rep geometry model and NURBS promotion
//!
//! This crate provides:
//! - A minimal B-Rep model (surfaces, pcurves, faces, solids)
//! - Abstract geometry kernel traits with an exact analytic implementation
//! - Knot repair, knot insertion and periodic-to-clamped conversion
//! - Promotion of any face surface to a clamped rational B-spline patch
//! - Extraction of trimming curves as rational B-spline curves

pub mod geometry;
pub mod kernel;
pub mod nurbs;
pub mod promote;
pub mod topology;
pub mod trim;

// Re-exports for convenience
pub use geometry::{Curve2d, Curve3d, Frame, Surface, SurfaceKind, UvBounds};
pub use kernel::{
    AnalyticKernel, CadError, CadKernel, CadResult, NullKernel, NurbsConverter, ShapeDivider,
    default_kernel,
};
pub use nurbs::{
    KnotError, MultiplicityPolicy, RationalBSplineCurve2d, RationalBSplineSurface, RepairOptions,
    repair_knots,
};
pub use promote::{ConversionError, PromotedSurface, PromotionPath, promote_face};
pub use topology::{Edge, Face, Solid, Wire};
pub use trim::extract_trimming_curves;
