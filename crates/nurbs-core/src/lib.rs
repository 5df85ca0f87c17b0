//! Model conversion to the `.nurbs` interchange format
//!
//! This crate provides:
//! - Model files: named, colored solids stored as RON
//! - The conversion pipeline from solids to promoted faces with trimming curves
//! - Per-model statistics and failure reports
//! - The versioned `.nurbs` binary encoder and decoder

pub mod convert;
pub mod encoder;
pub mod model;
pub mod stats;

// Re-exports for convenience
pub use convert::{
    ConversionContext, ConversionSinks, ConversionSummary, ConvertError, ConvertOptions,
    ConvertedFace, ConvertedShape, FaceConversionResult, FaceFailure, SolidConversion,
    convert_face, convert_model, convert_solid,
};
pub use encoder::{
    DecodeError, DecodedFace, DecodedUnit, EncodeError, FormatVersion, NurbsDecoder,
    NurbsEncoder,
};
pub use model::{Model, ModelError, ShapeUnit};
pub use stats::{ConversionStatistics, FailedGeometry};
