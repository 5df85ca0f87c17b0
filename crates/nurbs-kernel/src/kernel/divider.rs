//! Closed face and closed edge division for the analytic kernel

use tracing::debug;

use super::analytic::AnalyticKernel;
use super::traits::{CadError, CadResult, ShapeDivider};
use crate::topology::{Edge, Face, Solid, Wire};

const PERIOD_TOLERANCE: f64 = 1e-9;

fn covers_period(lo: f64, hi: f64, period: Option<f64>) -> bool {
    period.is_some_and(|p| hi - lo >= p - PERIOD_TOLERANCE * (1.0 + p.abs()))
}

#[derive(Clone, Copy)]
enum Direction {
    U,
    V,
}

/// Split `face` at mid parameter when it wraps a full period in `direction`
fn split_closed(face: Face, direction: Direction) -> Vec<Face> {
    let bounds = face.uv_bounds;
    let (lo, hi, period) = match direction {
        Direction::U => (bounds.u_min, bounds.u_max, face.surface.u_period()),
        Direction::V => (bounds.v_min, bounds.v_max, face.surface.v_period()),
    };
    if !covers_period(lo, hi, period) {
        return vec![face];
    }
    if !face.has_natural_boundary() {
        debug!(
            kind = %face.surface.kind(),
            "Closed face with trimmed boundary kept whole"
        );
        return vec![face];
    }

    let mid = 0.5 * (lo + hi);
    let (a, b) = match direction {
        Direction::U => bounds.split_u(mid),
        Direction::V => bounds.split_v(mid),
    };
    vec![
        Face::natural(face.surface.clone(), a),
        Face::natural(face.surface, b),
    ]
}

/// Split edges whose pcurve runs around a whole period
fn split_closed_edges(face: Face) -> Face {
    let wires = face
        .wires
        .into_iter()
        .map(|wire| {
            let edges = wire
                .edges
                .into_iter()
                .flat_map(|edge| {
                    if covers_period(edge.first, edge.last, edge.curve.period()) {
                        let mid = 0.5 * (edge.first + edge.last);
                        vec![
                            Edge::new(edge.curve.clone(), edge.first, mid),
                            Edge::new(edge.curve, mid, edge.last),
                        ]
                    } else {
                        vec![edge]
                    }
                })
                .collect();
            Wire::new(edges)
        })
        .collect();
    Face { wires, ..face }
}

impl ShapeDivider for AnalyticKernel {
    fn divide(&self, solid: &Solid) -> CadResult<Solid> {
        let mut faces = Vec::with_capacity(solid.faces.len());
        for (index, face) in solid.faces.iter().enumerate() {
            if face.uv_bounds.is_empty() {
                return Err(CadError::DegenerateGeometry(format!(
                    "face {index} has empty parametric bounds"
                )));
            }
            for half in split_closed(face.clone(), Direction::U) {
                faces.extend(split_closed(half, Direction::V));
            }
        }

        let faces: Vec<Face> = faces.into_iter().map(split_closed_edges).collect();
        debug!(
            before = solid.faces.len(),
            after = faces.len(),
            "Divided closed faces"
        );
        Ok(solid.with_faces(faces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{
        Circle2d, Curve2d, CylindricalSurface, Frame, Plane, Surface, ToroidalSurface, UvBounds,
    };
    use glam::DVec2;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_full_cylinder_split_in_half() {
        let face = Face::natural(
            Surface::Cylinder(CylindricalSurface::new(Frame::world(), 1.0)),
            UvBounds::new(0.0, TAU, 0.0, 2.0),
        );
        let solid = Solid::new(vec![face]);
        let divided = AnalyticKernel::new().divide(&solid).unwrap();

        assert_eq!(divided.id, solid.id);
        assert_eq!(divided.faces.len(), 2);
        assert_eq!(divided.faces[0].uv_bounds, UvBounds::new(0.0, PI, 0.0, 2.0));
        assert_eq!(divided.faces[1].uv_bounds, UvBounds::new(PI, TAU, 0.0, 2.0));
        assert!(divided.faces.iter().all(Face::has_natural_boundary));
    }

    #[test]
    fn test_full_torus_split_into_quarters() {
        let face = Face::natural(
            Surface::Torus(ToroidalSurface::new(Frame::world(), 3.0, 1.0)),
            UvBounds::new(0.0, TAU, 0.0, TAU),
        );
        let divided = AnalyticKernel::new()
            .divide(&Solid::new(vec![face]))
            .unwrap();
        assert_eq!(divided.faces.len(), 4);
    }

    #[test]
    fn test_partial_and_open_faces_untouched() {
        let partial = Face::natural(
            Surface::Cylinder(CylindricalSurface::new(Frame::world(), 1.0)),
            UvBounds::new(0.0, PI, 0.0, 1.0),
        );
        let plane = Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(0.0, 10.0, 0.0, 10.0),
        );
        let solid = Solid::new(vec![partial.clone(), plane.clone()]);
        let divided = AnalyticKernel::new().divide(&solid).unwrap();
        assert_eq!(divided.faces, vec![partial, plane]);
    }

    #[test]
    fn test_closed_edge_split() {
        let mut face = Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(-2.0, 2.0, -2.0, 2.0),
        );
        face.wires.push(Wire::new(vec![Edge::new(
            Curve2d::Circle(Circle2d::new(DVec2::ZERO, 1.0)),
            0.0,
            TAU,
        )]));
        let divided = AnalyticKernel::new()
            .divide(&Solid::new(vec![face]))
            .unwrap();

        let hole = &divided.faces[0].wires[1];
        assert_eq!(hole.edges.len(), 2);
        assert_eq!((hole.edges[0].first, hole.edges[0].last), (0.0, PI));
        assert_eq!((hole.edges[1].first, hole.edges[1].last), (PI, TAU));
    }

    #[test]
    fn test_empty_face_fails_solid() {
        let face = Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(0.0, 0.0, 0.0, 1.0),
        );
        assert!(matches!(
            AnalyticKernel::new().divide(&Solid::new(vec![face])),
            Err(CadError::DegenerateGeometry(_))
        ));
    }
}
