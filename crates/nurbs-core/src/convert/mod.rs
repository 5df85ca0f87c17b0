//! Per-face, per-solid and per-model conversion
//!
//! Each solid is divided by the kernel, then every face is promoted to a
//! rational B-spline patch and its edges extracted as trimming curves. Face
//! failures are logged, recorded and skipped; only sink I/O aborts a model.

use std::io::Write;

use nurbs_kernel::{
    CadKernel, ConversionError, Face, PromotionPath, RationalBSplineCurve2d,
    RationalBSplineSurface, RepairOptions, SurfaceKind, extract_trimming_curves, promote_face,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::encoder::{EncodeError, NurbsEncoder};
use crate::model::{Model, ShapeUnit};
use crate::stats::{ConversionStatistics, FailedGeometry};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to write converted shape: {0}")]
    Encode(#[from] EncodeError),
}

/// Conversion settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvertOptions {
    pub repair: RepairOptions,
    /// Split closed faces and edges before promotion
    pub divide_closed: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            repair: RepairOptions::default(),
            divide_closed: true,
        }
    }
}

/// Position of the face being converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionContext {
    pub solid_index: usize,
    pub solids_total: usize,
    pub face_index: usize,
}

impl ConversionContext {
    pub fn solid(solid_index: usize, solids_total: usize) -> Self {
        Self {
            solid_index,
            solids_total,
            face_index: 0,
        }
    }

    pub fn with_face(self, face_index: usize) -> Self {
        Self { face_index, ..self }
    }

    pub fn solid_identifier(&self) -> String {
        format!("solid{}", self.solid_index)
    }

    pub fn face_identifier(&self) -> String {
        format!("solid{}_face{}", self.solid_index, self.face_index)
    }
}

/// Promoted surface with its trimming curves, one per edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedFace {
    /// Surface type before conversion
    pub kind: SurfaceKind,
    pub path: PromotionPath,
    pub surface: RationalBSplineSurface,
    pub curves: Vec<RationalBSplineCurve2d>,
}

/// A face that could not be converted, with its untouched input
#[derive(Debug, Clone, PartialEq)]
pub struct FaceFailure {
    pub identifier: String,
    pub kind: SurfaceKind,
    pub error: ConversionError,
    pub face: Face,
}

impl FaceFailure {
    /// `{identifier}({kind}): {error}`
    pub fn message(&self) -> String {
        format!("{}({}): {}", self.identifier, self.kind, self.error)
    }
}

pub type FaceConversionResult = Result<ConvertedFace, FaceFailure>;

/// Converted faces of one shape unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedShape {
    pub name: String,
    pub color: [f32; 3],
    pub faces: Vec<ConvertedFace>,
}

impl ConvertedShape {
    /// Same shape with all trimming curves dropped
    pub fn without_trimming(&self) -> Self {
        Self {
            faces: self
                .faces
                .iter()
                .map(|face| ConvertedFace {
                    curves: Vec::new(),
                    ..face.clone()
                })
                .collect(),
            ..self.clone()
        }
    }
}

/// Result of one solid: converted faces in order and local statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SolidConversion {
    pub shape: ConvertedShape,
    pub statistics: ConversionStatistics,
    pub failed_faces: usize,
    pub solid_failed: bool,
}

/// Optional outputs of a model conversion; `None` handles are skipped
pub struct ConversionSinks<'a, W: Write> {
    pub encoder: Option<&'a mut NurbsEncoder<W>>,
    pub statistics: Option<&'a mut ConversionStatistics>,
    pub converted: Option<&'a mut Vec<ConvertedShape>>,
}

impl<W: Write> Default for ConversionSinks<'_, W> {
    fn default() -> Self {
        Self {
            encoder: None,
            statistics: None,
            converted: None,
        }
    }
}

/// Counts over a whole model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub solids: usize,
    pub failed_solids: usize,
    pub faces_converted: usize,
    pub faces_failed: usize,
}

/// Promote one face and extract its trimming curves
pub fn convert_face<K>(
    face: &Face,
    ctx: &ConversionContext,
    kernel: &K,
    options: &ConvertOptions,
) -> FaceConversionResult
where
    K: CadKernel + ?Sized,
{
    let kind = face.surface.kind();
    let fail = |error: ConversionError| FaceFailure {
        identifier: ctx.face_identifier(),
        kind,
        error,
        face: face.clone(),
    };

    let promoted = promote_face(face, kernel, &options.repair).map_err(fail)?;
    let curves = extract_trimming_curves(face, &options.repair).map_err(fail)?;
    debug!(
        face = ctx.face_index,
        %kind,
        path = ?promoted.path,
        curves = curves.len(),
        "Converted face"
    );
    Ok(ConvertedFace {
        kind,
        path: promoted.path,
        surface: promoted.surface,
        curves,
    })
}

/// Divide and convert every face of one shape unit.
///
/// Statistics are collected locally; failures never propagate.
pub fn convert_solid<K>(
    unit: &ShapeUnit,
    ctx: &ConversionContext,
    kernel: &K,
    options: &ConvertOptions,
) -> SolidConversion
where
    K: CadKernel + ?Sized,
{
    info!(
        "Converting solid {}/{} \"{}\" ({} faces)",
        ctx.solid_index + 1,
        ctx.solids_total,
        unit.name,
        unit.solid.faces.len()
    );

    let mut statistics = ConversionStatistics::new();
    let mut shape = ConvertedShape {
        name: unit.name.clone(),
        color: unit.color,
        faces: Vec::new(),
    };

    let divided = if options.divide_closed {
        match kernel.divide(&unit.solid) {
            Ok(solid) => solid,
            Err(e) => {
                let identifier = ctx.solid_identifier();
                warn!(solid = ctx.solid_index, error = %e, "Failed to divide solid");
                statistics.record_failure(
                    identifier.clone(),
                    format!("{identifier}: {e}"),
                    FailedGeometry::Solid(unit.solid.clone()),
                );
                return SolidConversion {
                    shape,
                    statistics,
                    failed_faces: 0,
                    solid_failed: true,
                };
            }
        }
    } else {
        unit.solid.clone()
    };

    let mut failed_faces = 0;
    for (face_index, face) in divided.faces.iter().enumerate() {
        let face_ctx = ctx.with_face(face_index);
        statistics.record_face(face.surface.kind());
        match convert_face(face, &face_ctx, kernel, options) {
            Ok(converted) => shape.faces.push(converted),
            Err(failure) => {
                warn!(
                    face = face_index,
                    kind = %failure.kind,
                    "Failed to convert face: {}",
                    failure.error
                );
                statistics.record_failure(
                    failure.identifier.clone(),
                    failure.message(),
                    FailedGeometry::Face(failure.face),
                );
                failed_faces += 1;
            }
        }
    }

    SolidConversion {
        shape,
        statistics,
        failed_faces,
        solid_failed: false,
    }
}

/// Convert every shape unit of `model` and feed the results to `sinks` in
/// model order.
pub fn convert_model<K, W>(
    model: &Model,
    kernel: &K,
    options: &ConvertOptions,
    sinks: &mut ConversionSinks<'_, W>,
) -> Result<ConversionSummary, ConvertError>
where
    K: CadKernel + ?Sized,
    W: Write,
{
    info!(
        "Converting model \"{}\" ({} solids) with {} kernel",
        model.name,
        model.units.len(),
        kernel.name()
    );
    let total = model.units.len();

    #[cfg(feature = "rayon")]
    let results: Vec<SolidConversion> = {
        use rayon::prelude::*;
        model
            .units
            .par_iter()
            .enumerate()
            .map(|(index, unit)| {
                convert_solid(unit, &ConversionContext::solid(index, total), kernel, options)
            })
            .collect()
    };

    #[cfg(not(feature = "rayon"))]
    let results = model.units.iter().enumerate().map(|(index, unit)| {
        convert_solid(unit, &ConversionContext::solid(index, total), kernel, options)
    });

    let mut summary = ConversionSummary::default();
    for result in results {
        summary.solids += 1;
        summary.failed_solids += usize::from(result.solid_failed);
        summary.faces_converted += result.shape.faces.len();
        summary.faces_failed += result.failed_faces;

        if let Some(encoder) = sinks.encoder.as_deref_mut() {
            encoder.write_unit(&result.shape.name, result.shape.color, &result.shape.faces)?;
        }
        if let Some(statistics) = sinks.statistics.as_deref_mut() {
            statistics.merge(result.statistics);
        }
        if let Some(converted) = sinks.converted.as_deref_mut() {
            converted.push(result.shape);
        }
    }

    info!(
        faces = summary.faces_converted,
        failed = summary.faces_failed,
        "Model converted"
    );
    Ok(summary)
}
