//! NURBS algorithms and data
//!
//! - Basis function evaluation
//! - Knot repair and knot vector helpers
//! - Knot insertion, unperiodizing and segmentation of homogeneous curves
//! - Rational quadratic arcs
//! - Input spline types and the canonical clamped rational output types

pub mod arc;
pub mod basis;
pub mod bspline;
pub mod knot;
pub mod periodic;
pub mod rational;

pub use arc::{ArcError, ArcProfile};
pub use bspline::{BSplineCurve2d, BSplineCurve3d, BSplineSurface, BezierCurve2d, BezierSurface};
pub use knot::{
    KnotError, MultiplicityPolicy, RepairOptions, bezier_knots, compress_knots, expand_knots,
    is_clamped, repair_flat_knots, repair_knots, validate_knot_vector,
};
pub use periodic::{HomogeneousCurve, HomogeneousGrid, cartesian, homogeneous};
pub use rational::{RationalBSplineCurve2d, RationalBSplineSurface};
