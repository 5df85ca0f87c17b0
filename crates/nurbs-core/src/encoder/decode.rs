//! Reading `.nurbs` data back

use std::io::{self, Read};

use glam::{DVec2, DVec3};
use nurbs_kernel::nurbs::expand_knots;
use nurbs_kernel::{KnotError, RationalBSplineCurve2d, RationalBSplineSurface};
use thiserror::Error;

use super::binary::{read_count, read_counts, read_f32, read_f64s};
use super::version::{FormatVersion, HEADER_LEN};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unrecognized header {0:?}")]
    BadHeader(String),

    #[error("negative {field} count {value}")]
    NegativeCount { field: &'static str, value: i32 },

    #[error("{field} count does not fit in memory")]
    TooLarge { field: &'static str },

    #[error("shape name is not UTF-8: {0}")]
    Name(#[from] std::string::FromUtf8Error),

    #[error("decoded data is inconsistent: {0}")]
    Knots(#[from] KnotError),
}

/// One face as stored in the file; curves are empty for version 200
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFace {
    pub surface: RationalBSplineSurface,
    pub curves: Vec<RationalBSplineCurve2d>,
}

/// One shape unit; version 200 units carry no name and a zero color
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedUnit {
    pub name: String,
    pub color: [f32; 3],
    pub faces: Vec<DecodedFace>,
}

/// Reader of `.nurbs` data
pub struct NurbsDecoder<R: Read> {
    reader: R,
    version: FormatVersion,
}

impl<R: Read> NurbsDecoder<R> {
    /// Read and check the version header
    pub fn new(mut reader: R) -> Result<Self, DecodeError> {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header)?;
        let version = FormatVersion::from_header(&header)
            .ok_or_else(|| DecodeError::BadHeader(String::from_utf8_lossy(&header).into_owned()))?;
        Ok(Self { reader, version })
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Next shape unit, `None` at a clean end of data
    pub fn read_unit(&mut self) -> Result<Option<DecodedUnit>, DecodeError> {
        let mut first = [0u8; 4];
        match self.reader.read_exact(&mut first) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let face_count = i32::from_le_bytes(first);
        let face_count = usize::try_from(face_count).map_err(|_| DecodeError::NegativeCount {
            field: "faces",
            value: face_count,
        })?;

        let r = &mut self.reader;
        let unit = match self.version {
            FormatVersion::V200 => {
                let faces = (0..face_count)
                    .map(|_| {
                        let surface = read_surface(r, read_expanded)?;
                        Ok::<_, DecodeError>(DecodedFace {
                            surface,
                            curves: Vec::new(),
                        })
                    })
                    .collect::<Result<_, _>>()?;
                DecodedUnit {
                    name: String::new(),
                    color: [0.0; 3],
                    faces,
                }
            }
            FormatVersion::V300 => {
                let name_len = read_count(r, "name bytes")?;
                let mut name = Vec::new();
                r.by_ref().take(name_len as u64).read_to_end(&mut name)?;
                if name.len() < name_len {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
                }
                let name = String::from_utf8(name)?;
                let color = [read_f32(r)?, read_f32(r)?, read_f32(r)?];
                let faces = (0..face_count)
                    .map(|_| {
                        let surface = read_surface(r, read_distinct)?;
                        let curve_count = read_count(r, "curves")?;
                        let curves = (0..curve_count)
                            .map(|_| read_curve(r))
                            .collect::<Result<_, _>>()?;
                        Ok::<_, DecodeError>(DecodedFace { surface, curves })
                    })
                    .collect::<Result<_, _>>()?;
                DecodedUnit { name, color, faces }
            }
        };
        Ok(Some(unit))
    }

    /// All remaining units
    pub fn read_all(&mut self) -> Result<Vec<DecodedUnit>, DecodeError> {
        let mut units = Vec::new();
        while let Some(unit) = self.read_unit()? {
            units.push(unit);
        }
        Ok(units)
    }
}

/// Reads a flat knot vector that must hold `expected` entries
type KnotReader<R> = fn(&mut R, usize) -> Result<Vec<f64>, DecodeError>;

fn read_expanded<R: Read>(r: &mut R, expected: usize) -> Result<Vec<f64>, DecodeError> {
    let len = read_count(r, "knots")?;
    if len != expected {
        return Err(KnotError::LengthMismatch {
            expected,
            actual: len,
        }
        .into());
    }
    Ok(read_f64s(r, len)?)
}

fn read_distinct<R: Read>(r: &mut R, expected: usize) -> Result<Vec<f64>, DecodeError> {
    let len = read_count(r, "knots")?;
    let knots = read_f64s(r, len)?;
    let mults = read_counts(r, "multiplicity", len)?;
    let total = mults
        .iter()
        .try_fold(0usize, |sum, &m| sum.checked_add(m))
        .ok_or(DecodeError::TooLarge {
            field: "multiplicity",
        })?;
    if total != expected {
        return Err(KnotError::LengthMismatch {
            expected,
            actual: total,
        }
        .into());
    }
    Ok(expand_knots(&knots, &mults))
}

/// `poles + degree + 1`
fn knot_len(poles: usize, degree: usize) -> Result<usize, DecodeError> {
    poles
        .checked_add(degree)
        .and_then(|n| n.checked_add(1))
        .ok_or(DecodeError::TooLarge { field: "knots" })
}

fn read_surface<R: Read>(
    r: &mut R,
    read_knots: KnotReader<R>,
) -> Result<RationalBSplineSurface, DecodeError> {
    let nb_u_poles = read_count(r, "u poles")? + 1;
    let nb_v_poles = read_count(r, "v poles")? + 1;
    let count = nb_u_poles
        .checked_mul(nb_v_poles)
        .ok_or(DecodeError::TooLarge { field: "poles" })?;
    // grows with the data actually present; a short stream ends in an EOF error
    let poles = (0..count)
        .map(|_| {
            let xyzw = read_f64s(r, 4)?;
            Ok::<_, io::Error>(DVec3::new(xyzw[0], xyzw[1], xyzw[2]))
        })
        .collect::<io::Result<Vec<_>>>()?;
    let weights = read_f64s(r, count)?;
    let u_degree = read_count(r, "u degree")?;
    let v_degree = read_count(r, "v degree")?;
    let u_knots = read_knots(r, knot_len(nb_u_poles, u_degree)?)?;
    let v_knots = read_knots(r, knot_len(nb_v_poles, v_degree)?)?;

    let surface = RationalBSplineSurface {
        u_degree,
        v_degree,
        nb_u_poles,
        nb_v_poles,
        poles,
        weights,
        u_knots,
        v_knots,
    };
    surface.validate()?;
    Ok(surface)
}

fn read_curve<R: Read>(r: &mut R) -> Result<RationalBSplineCurve2d, DecodeError> {
    let count = read_count(r, "curve poles")? + 1;
    let poles = (0..count)
        .map(|_| {
            let xyw = read_f64s(r, 3)?;
            Ok::<_, io::Error>(DVec2::new(xyw[0], xyw[1]))
        })
        .collect::<io::Result<Vec<_>>>()?;
    let weights = read_f64s(r, count)?;
    let degree = read_count(r, "curve degree")?;
    let knots = read_distinct(r, knot_len(count, degree)?)?;
    let first = f64::from(read_f32(r)?);
    let last = f64::from(read_f32(r)?);

    let curve = RationalBSplineCurve2d {
        degree,
        poles,
        weights,
        knots,
        first,
        last,
    };
    curve.validate()?;
    Ok(curve)
}
