//! The artifact catalog.
//!
//! Every model the gallery can display is described by a [`ModelEntry`]: where
//! its mesh, material and texture files live relative to the asset base path,
//! how it is presented in the UI, and the fixed pose it receives after loading.
//! The catalog is immutable and fully known at startup; the selector UI only
//! ever offers ids from this closed set.

use anyhow::{anyhow, Result};

/// Where an entry's color textures come from.
///
/// `Single` applies one image to every sub-material of the mesh. `Many` pairs
/// an ordered list of images index-for-index with the mesh's sub-materials
/// (see [`crate::normalize`] for the pairing rules).
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    Single(String),
    Many(Vec<String>),
}

impl TextureSource {
    pub fn single(url: &str) -> Self {
        Self::Single(url.to_string())
    }

    pub fn many<const N: usize>(urls: [&str; N]) -> Self {
        Self::Many(urls.iter().map(|u| u.to_string()).collect())
    }

    /// All texture URLs in pairing order.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Self::Single(url) => vec![url.as_str()],
            Self::Many(urls) => urls.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

/// Fixed pose applied to an artifact once its assets are loaded.
///
/// Rotation is Euler angles in radians, applied in x, y, z order. Each entry
/// carries its pose explicitly; nothing is ever derived from asset URLs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelTransform {
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub rotation: [f32; 3],
}

impl ModelTransform {
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        scale: [1.0; 3],
        rotation: [0.0; 3],
    };

    pub fn uniform_scale(self, s: f32) -> Self {
        Self {
            scale: [s; 3],
            ..self
        }
    }

    pub fn at(self, x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..self
        }
    }

    pub fn rotated(self, x: f32, y: f32, z: f32) -> Self {
        Self {
            rotation: [x, y, z],
            ..self
        }
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One displayable artifact: asset locations, display metadata and pose.
#[derive(Clone, Debug)]
pub struct ModelEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub mesh_url: String,
    pub material_url: String,
    pub textures: TextureSource,
    pub transform: ModelTransform,
}

/// The static mapping from model id to its entry.
#[derive(Clone, Debug)]
pub struct Registry {
    entries: Vec<ModelEntry>,
    default_id: String,
}

impl Registry {
    /// The gallery's shipped catalog: three museum artifacts.
    ///
    /// Asset layout convention: one directory per model containing a mesh, a
    /// material file and one or more images, addressed relative to the asset
    /// base path (see [`crate::resources`]).
    pub fn museum() -> Self {
        let entries = vec![
            ModelEntry {
                id: "anan".to_string(),
                title: "Ananda Statue".to_string(),
                description: "A statue of the Buddha's attendant Ananda".to_string(),
                mesh_url: "anan/model.obj".to_string(),
                material_url: "anan/model.mtl".to_string(),
                textures: TextureSource::single("anan/tex0.png"),
                transform: ModelTransform::IDENTITY
                    .uniform_scale(2.0)
                    .at(0.0, -1.2, 0.0)
                    .rotated(-std::f32::consts::FRAC_PI_2, 0.0, 0.0),
            },
            ModelEntry {
                id: "qingtong".to_string(),
                title: "Bronze Vessel".to_string(),
                description: "A ritual bronze vessel".to_string(),
                mesh_url: "qingtong/model.obj".to_string(),
                material_url: "qingtong/model.mtl".to_string(),
                textures: TextureSource::single("qingtong/tex0.png"),
                transform: ModelTransform::IDENTITY
                    .uniform_scale(1.5)
                    .at(0.0, -0.6, 0.0),
            },
            ModelEntry {
                id: "shanxi".to_string(),
                title: "Shanxi Museum".to_string(),
                description: "A scale model of the Shanxi museum hall".to_string(),
                mesh_url: "shanxi/Model.obj".to_string(),
                material_url: "shanxi/Model.mtl".to_string(),
                textures: TextureSource::many([
                    "shanxi/Model_0.jpg",
                    "shanxi/Model_1.jpg",
                    "shanxi/Model_2.jpg",
                    "shanxi/Model_3.jpg",
                ]),
                transform: ModelTransform::IDENTITY
                    .uniform_scale(2.0)
                    .at(0.0, -1.0, 0.0)
                    .rotated(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            },
        ];
        Self {
            entries,
            default_id: "qingtong".to_string(),
        }
    }

    pub fn get(&self, id: &str) -> Result<&ModelEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("no model '{}' in the catalog", id))
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn default_entry(&self) -> &ModelEntry {
        self.get(&self.default_id)
            .expect("catalog default id must be present")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn lookup_returns_the_requested_entry() {
        let registry = Registry::museum();
        for id in ["anan", "qingtong", "shanxi"] {
            let entry = registry.get(id).expect("catalog entry");
            assert_eq!(entry.id, id);
        }
    }

    #[test]
    fn lookup_fails_for_unknown_id() {
        let registry = Registry::museum();
        assert!(registry.get("terracotta").is_err());
    }

    #[test]
    fn default_entry_is_the_bronze_vessel() {
        let registry = Registry::museum();
        assert_eq!(registry.default_entry().id, "qingtong");
    }

    #[test]
    fn bronze_vessel_pose_is_lowered_and_scaled() {
        let registry = Registry::museum();
        let entry = registry.get("qingtong").unwrap();
        assert_eq!(entry.transform.scale, [1.5; 3]);
        assert_eq!(entry.transform.position, [0.0, -0.6, 0.0]);
        assert_eq!(entry.transform.rotation, [0.0; 3]);
    }

    #[test]
    fn remaining_entries_use_double_scale_with_their_rotation() {
        let registry = Registry::museum();

        let anan = registry.get("anan").unwrap();
        assert_eq!(anan.transform.scale, [2.0; 3]);
        assert_eq!(anan.transform.position, [0.0, -1.2, 0.0]);
        assert_eq!(anan.transform.rotation, [-FRAC_PI_2, 0.0, 0.0]);

        let shanxi = registry.get("shanxi").unwrap();
        assert_eq!(shanxi.transform.scale, [2.0; 3]);
        assert_eq!(shanxi.transform.position, [0.0, -1.0, 0.0]);
        assert_eq!(shanxi.transform.rotation, [0.0, FRAC_PI_2, 0.0]);
    }

    #[test]
    fn museum_hall_lists_four_textures_in_order() {
        let registry = Registry::museum();
        let entry = registry.get("shanxi").unwrap();
        let urls = entry.textures.urls();
        assert_eq!(urls.len(), 4);
        assert!(urls[0].ends_with("Model_0.jpg"));
        assert!(urls[3].ends_with("Model_3.jpg"));
    }
}
