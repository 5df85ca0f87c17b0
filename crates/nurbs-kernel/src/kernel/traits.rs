//! CAD kernel trait definitions
//!
//! These traits define the interface that all geometry kernels must implement.

use thiserror::Error;

use crate::geometry::Surface;
use crate::topology::{Face, Solid};

/// Error type for CAD kernel operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CadError {
    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// Generic conversion of a face's surface into B-spline form
pub trait NurbsConverter: Send + Sync {
    /// Convert the surface of `face`, restricted to its parametric bounds.
    ///
    /// A successful result is normally a [`Surface::BSpline`]; callers must
    /// still check, since a backend may hand back any surface type.
    fn convert_surface(&self, face: &Face) -> CadResult<Surface>;
}

/// Splitting of closed faces and closed edges before conversion
pub trait ShapeDivider: Send + Sync {
    /// Return a copy of `solid` in which closed periodic faces and edges are
    /// split into open pieces. The solid keeps its id.
    fn divide(&self, solid: &Solid) -> CadResult<Solid>;
}

/// The main CAD kernel trait
///
/// Implementations provide the geometry operations the conversion pipeline
/// relies on.
pub trait CadKernel: NurbsConverter + ShapeDivider {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;
}

/// A null kernel that returns errors for all operations
///
/// Used when no geometry backend is available.
pub struct NullKernel;

impl NurbsConverter for NullKernel {
    fn convert_surface(&self, _face: &Face) -> CadResult<Surface> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel is available".to_string(),
        ))
    }
}

impl ShapeDivider for NullKernel {
    fn divide(&self, _solid: &Solid) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel is available".to_string(),
        ))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Get the default CAD kernel
pub fn default_kernel() -> Box<dyn CadKernel> {
    Box::new(super::AnalyticKernel::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Frame, Plane, UvBounds};

    #[test]
    fn test_null_kernel() {
        let kernel = NullKernel;
        assert_eq!(kernel.name(), "null");
        assert!(!kernel.is_available());

        let face = Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(0.0, 1.0, 0.0, 1.0),
        );
        assert!(matches!(
            kernel.convert_surface(&face),
            Err(CadError::KernelNotAvailable(_))
        ));
        assert!(kernel.divide(&Solid::new(vec![face])).is_err());
    }

    #[test]
    fn test_default_kernel_available() {
        let kernel = default_kernel();
        assert!(kernel.is_available());
        assert_eq!(kernel.name(), "analytic");
    }
}
