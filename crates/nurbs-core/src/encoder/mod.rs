//! `.nurbs` binary interchange format
//!
//! A file starts with an 11 byte ASCII header (`VERSION 200` or
//! `VERSION 300`) followed by one record per shape unit. All integers are
//! little-endian `i32`, all geometry little-endian `f32`.
//!
//! Version 200 unit: face count, then per face a surface record with
//! expanded knot vectors.
//!
//! Version 300 unit: face count, name, RGB color, then per face a surface
//! record with distinct knots and multiplicities, followed by its trimming
//! curves.
//!
//! Poles are written as `x, y, z, 1.0` (surfaces) and `x, y, 1.0` (curves);
//! weights follow in a separate array.

mod binary;
mod decode;
mod version;

use std::io::{self, Write};

use nurbs_kernel::nurbs::compress_knots;
use nurbs_kernel::{RationalBSplineCurve2d, RationalBSplineSurface};
use thiserror::Error;
use tracing::trace;

pub use decode::{DecodeError, DecodedFace, DecodedUnit, NurbsDecoder};
pub use version::{FormatVersion, HEADER_LEN};

use crate::convert::ConvertedFace;
use binary::{write_count, write_f32, write_f32s};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invariant violated before write: {0}")]
    InvariantViolation(String),

    #[error("{field} count {value} does not fit the format")]
    CountOverflow { field: &'static str, value: usize },
}

/// Streaming writer of `.nurbs` data; owns its byte sink
pub struct NurbsEncoder<W: Write> {
    writer: W,
    version: FormatVersion,
    units: usize,
}

impl<W: Write> NurbsEncoder<W> {
    /// Write the version header and return the encoder
    pub fn new(mut writer: W, version: FormatVersion) -> Result<Self, EncodeError> {
        writer.write_all(&version.header())?;
        Ok(Self {
            writer,
            version,
            units: 0,
        })
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Shape units written so far
    pub fn units_written(&self) -> usize {
        self.units
    }

    /// Write one shape unit in the layout of the encoder's version.
    ///
    /// Every face is checked before anything of the unit is written.
    pub fn write_unit(
        &mut self,
        name: &str,
        color: [f32; 3],
        faces: &[ConvertedFace],
    ) -> Result<(), EncodeError> {
        for (index, face) in faces.iter().enumerate() {
            check_surface(&face.surface)
                .map_err(|e| EncodeError::InvariantViolation(format!("face {index}: {e}")))?;
            if self.version.has_shape_units() {
                for (edge, curve) in face.curves.iter().enumerate() {
                    check_curve(curve).map_err(|e| {
                        EncodeError::InvariantViolation(format!("face {index} edge {edge}: {e}"))
                    })?;
                }
            }
        }

        let w = &mut self.writer;
        write_count(w, "faces", faces.len())?;
        match self.version {
            FormatVersion::V200 => {
                for face in faces {
                    write_surface_v200(w, &face.surface)?;
                }
            }
            FormatVersion::V300 => {
                write_count(w, "name bytes", name.len())?;
                w.write_all(name.as_bytes())?;
                for channel in color {
                    write_f32(w, channel)?;
                }
                for face in faces {
                    write_surface_v300(w, &face.surface)?;
                    write_count(w, "curves", face.curves.len())?;
                    for curve in &face.curves {
                        write_curve_v300(w, curve)?;
                    }
                }
            }
        }

        self.units += 1;
        trace!(name, faces = faces.len(), version = %self.version, "Wrote shape unit");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), EncodeError> {
        Ok(self.writer.flush()?)
    }

    /// Give the byte sink back
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Knots as they come back from the file
fn stored_knots(flat: &[f64]) -> Vec<f64> {
    flat.iter().map(|&k| f64::from(k as f32)).collect()
}

/// Checks run on the `f32` knots that are actually written
fn check_surface(surface: &RationalBSplineSurface) -> Result<(), String> {
    let stored = RationalBSplineSurface {
        u_knots: stored_knots(&surface.u_knots),
        v_knots: stored_knots(&surface.v_knots),
        ..surface.clone()
    };
    stored.validate().map_err(|e| e.to_string())?;
    for (direction, knots, poles, degree) in [
        ("u", &stored.u_knots, stored.nb_u_poles, stored.u_degree),
        ("v", &stored.v_knots, stored.nb_v_poles, stored.v_degree),
    ] {
        if knots.len() != poles + degree + 1 {
            return Err(format!(
                "{direction} knot count {} != {poles} poles + degree {degree} + 1",
                knots.len()
            ));
        }
    }
    Ok(())
}

fn check_curve(curve: &RationalBSplineCurve2d) -> Result<(), String> {
    let stored = RationalBSplineCurve2d {
        knots: stored_knots(&curve.knots),
        ..curve.clone()
    };
    stored.validate().map_err(|e| e.to_string())?;
    if stored.knots.len() != stored.poles.len() + stored.degree + 1 {
        return Err(format!(
            "knot count {} != {} poles + degree {} + 1",
            stored.knots.len(),
            stored.poles.len(),
            stored.degree
        ));
    }
    Ok(())
}

/// `n`, `m`, poles, weights, degrees
fn write_surface_head<W: Write>(
    w: &mut W,
    surface: &RationalBSplineSurface,
) -> Result<(), EncodeError> {
    write_count(w, "u poles", surface.n())?;
    write_count(w, "v poles", surface.m())?;
    for pole in &surface.poles {
        write_f32s(w, &[pole.x, pole.y, pole.z, 1.0])?;
    }
    write_f32s(w, &surface.weights)?;
    write_count(w, "u degree", surface.u_degree)?;
    write_count(w, "v degree", surface.v_degree)?;
    Ok(())
}

fn write_surface_v200<W: Write>(
    w: &mut W,
    surface: &RationalBSplineSurface,
) -> Result<(), EncodeError> {
    write_surface_head(w, surface)?;
    for knots in [&surface.u_knots, &surface.v_knots] {
        write_count(w, "knots", knots.len())?;
        write_f32s(w, knots)?;
    }
    Ok(())
}

/// Knots are merged after rounding so multiplicities match the stored values
fn write_distinct_knots<W: Write>(w: &mut W, flat: &[f64]) -> Result<(), EncodeError> {
    let (knots, mults) = compress_knots(&stored_knots(flat));
    write_count(w, "knots", knots.len())?;
    write_f32s(w, &knots)?;
    for mult in mults {
        write_count(w, "multiplicity", mult)?;
    }
    Ok(())
}

fn write_surface_v300<W: Write>(
    w: &mut W,
    surface: &RationalBSplineSurface,
) -> Result<(), EncodeError> {
    write_surface_head(w, surface)?;
    write_distinct_knots(w, &surface.u_knots)?;
    write_distinct_knots(w, &surface.v_knots)
}

fn write_curve_v300<W: Write>(w: &mut W, curve: &RationalBSplineCurve2d) -> Result<(), EncodeError> {
    write_count(w, "curve poles", curve.n())?;
    for pole in &curve.poles {
        write_f32s(w, &[pole.x, pole.y, 1.0])?;
    }
    write_f32s(w, &curve.weights)?;
    write_count(w, "curve degree", curve.degree)?;
    write_distinct_knots(w, &curve.knots)?;
    write_f32(w, curve.first as f32)?;
    write_f32(w, curve.last as f32)?;
    Ok(())
}
