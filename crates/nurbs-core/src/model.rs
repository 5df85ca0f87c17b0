//! Model file serialization

use std::path::Path;

use nurbs_kernel::Solid;
use serde::{Deserialize, Serialize};

/// Default display color of a shape unit
pub const DEFAULT_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// A named, colored solid of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeUnit {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    pub solid: Solid,
}

fn default_color() -> [f32; 3] {
    DEFAULT_COLOR
}

impl ShapeUnit {
    pub fn new(name: impl Into<String>, solid: Solid) -> Self {
        Self {
            name: name.into(),
            color: DEFAULT_COLOR,
            solid,
        }
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }
}

/// Model file containing the shape units to convert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// File format version
    pub version: u32,
    /// Model name
    pub name: String,
    /// Shape units in conversion order
    #[serde(default)]
    pub units: Vec<ShapeUnit>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new("New Model")
    }
}

impl Model {
    /// Create a new empty model
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            units: Vec::new(),
        }
    }

    /// Append a unit, returns its index
    pub fn add_unit(&mut self, unit: ShapeUnit) -> usize {
        self.units.push(unit);
        self.units.len() - 1
    }

    /// Total number of faces over all units
    pub fn face_count(&self) -> usize {
        self.units.iter().map(|u| u.solid.faces.len()).sum()
    }

    /// Save model to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let content = self.to_bytes()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ModelError::Io(e.to_string()))?;
        Ok(())
    }

    /// Serialize model to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ModelError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load model from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ModelError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| ModelError::Deserialize(e.to_string()))
    }

    /// Load model from bytes
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, ModelError> {
        let content =
            std::str::from_utf8(data).map_err(|e| ModelError::Deserialize(e.to_string()))?;
        ron::from_str(content).map_err(|e| ModelError::Deserialize(e.to_string()))
    }
}

/// Model-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurbs_kernel::geometry::{CylindricalSurface, Plane};
    use nurbs_kernel::{Face, Frame, Surface, UvBounds};
    use std::f64::consts::TAU;

    fn sample_model() -> Model {
        let mut model = Model::new("bracket");
        let plate = Solid::new(vec![Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(0.0, 4.0, 0.0, 2.0),
        )]);
        let pin = Solid::new(vec![Face::natural(
            Surface::Cylinder(CylindricalSurface::new(Frame::world(), 0.5)),
            UvBounds::new(0.0, TAU, 0.0, 3.0),
        )]);
        model.add_unit(ShapeUnit::new("plate", plate));
        model.add_unit(ShapeUnit::new("pin", pin).with_color([1.0, 0.0, 0.0]));
        model
    }

    #[test]
    fn test_bytes_round_trip() {
        let model = sample_model();
        let bytes = model.to_bytes().unwrap();
        let loaded = Model::load_from_bytes(&bytes).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.face_count(), 2);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bracket.ron");
        let model = sample_model();
        model.save(&path).unwrap();
        let loaded = Model::load(&path).unwrap();
        assert_eq!(loaded.units[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(loaded.units[0].solid.id, model.units[0].solid.id);
    }

    #[test]
    fn test_missing_file() {
        let err = Model::load("/nonexistent/model.ron").unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn test_invalid_content() {
        let err = Model::load_from_bytes(b"Model(version: ").unwrap_err();
        assert!(matches!(err, ModelError::Deserialize(_)));
    }
}
