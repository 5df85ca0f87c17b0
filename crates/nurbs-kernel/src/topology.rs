//! Minimal B-Rep topology: solids made of trimmed faces

use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Curve2d, Line2d, Surface, UvBounds};

/// Boundary edge of a face, carried by its pcurve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub curve: Curve2d,
    /// Used parameter range on `curve`
    pub first: f64,
    pub last: f64,
}

impl Edge {
    pub fn new(curve: Curve2d, first: f64, last: f64) -> Self {
        Self { curve, first, last }
    }

    /// Straight edge between two parameter points, parameterised on `[0, 1]`
    pub fn segment(from: DVec2, to: DVec2) -> Self {
        Self::new(Curve2d::Line(Line2d::new(from, to - from)), 0.0, 1.0)
    }

    /// Constant-U or constant-V line lying on the border of `bounds`
    pub fn is_iso_border(&self, bounds: &UvBounds) -> bool {
        let Curve2d::Line(line) = &self.curve else {
            return false;
        };
        let (a, b) = (line.point(self.first), line.point(self.last));
        let on = |x: f64, y: f64| (x - y).abs() <= 1e-9 * (1.0 + y.abs());
        let u_iso = on(a.x, b.x) && (on(a.x, bounds.u_min) || on(a.x, bounds.u_max));
        let v_iso = on(a.y, b.y) && (on(a.y, bounds.v_min) || on(a.y, bounds.v_max));
        u_iso || v_iso
    }
}

/// Ordered loop of edges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub edges: Vec<Edge>,
}

impl Wire {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }
}

/// Face of a solid: a surface restricted to `uv_bounds` and bounded by wires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub surface: Surface,
    pub uv_bounds: UvBounds,
    #[serde(default)]
    pub wires: Vec<Wire>,
}

impl Face {
    pub fn new(surface: Surface, uv_bounds: UvBounds, wires: Vec<Wire>) -> Self {
        Self {
            surface,
            uv_bounds,
            wires,
        }
    }

    /// Face bounded by the four iso-lines of its parametric rectangle
    pub fn natural(surface: Surface, uv_bounds: UvBounds) -> Self {
        let UvBounds {
            u_min,
            u_max,
            v_min,
            v_max,
        } = uv_bounds;
        let corners = [
            DVec2::new(u_min, v_min),
            DVec2::new(u_max, v_min),
            DVec2::new(u_max, v_max),
            DVec2::new(u_min, v_max),
        ];
        let edges = (0..4)
            .map(|k| Edge::segment(corners[k], corners[(k + 1) % 4]))
            .collect();
        Self::new(surface, uv_bounds, vec![Wire::new(edges)])
    }

    /// Edges in traversal order: wires in order, edges in order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.wires.iter().flat_map(|w| w.edges.iter())
    }

    pub fn edge_count(&self) -> usize {
        self.wires.iter().map(|w| w.edges.len()).sum()
    }

    /// True when every boundary edge is an iso-line on the parametric rectangle
    pub fn has_natural_boundary(&self) -> bool {
        self.edge_count() > 0 && self.edges().all(|e| e.is_iso_border(&self.uv_bounds))
    }
}

/// Closed shell of faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub id: Uuid,
    pub faces: Vec<Face>,
}

impl Solid {
    /// Create a solid with a fresh id
    pub fn new(faces: Vec<Face>) -> Self {
        Self {
            id: Uuid::new_v4(),
            faces,
        }
    }

    /// Same id, different faces
    pub fn with_faces(&self, faces: Vec<Face>) -> Self {
        Self { id: self.id, faces }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle2d, Frame, Plane};

    fn plane_face() -> Face {
        Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(0.0, 2.0, -1.0, 1.0),
        )
    }

    #[test]
    fn test_natural_face_edges() {
        let face = plane_face();
        assert_eq!(face.edge_count(), 4);
        assert!(face.has_natural_boundary());

        let ends: Vec<_> = face
            .edges()
            .map(|e| e.curve.point(e.last).unwrap())
            .collect();
        assert_eq!(ends[0], DVec2::new(2.0, -1.0));
        assert_eq!(ends[3], DVec2::new(0.0, -1.0));
    }

    #[test]
    fn test_circular_hole_is_not_natural() {
        let mut face = plane_face();
        face.wires.push(Wire::new(vec![Edge::new(
            Curve2d::Circle(Circle2d::new(DVec2::new(1.0, 0.0), 0.25)),
            0.0,
            std::f64::consts::TAU,
        )]));
        assert_eq!(face.edge_count(), 5);
        assert!(!face.has_natural_boundary());
    }

    #[test]
    fn test_solid_ids_unique() {
        let a = Solid::new(vec![plane_face()]);
        let b = Solid::new(vec![plane_face()]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.with_faces(Vec::new()).id, a.id);
    }
}
