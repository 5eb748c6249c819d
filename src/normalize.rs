//! Post-load artifact normalization.
//!
//! Once a model's mesh and textures have resolved, the normalizer produces
//! the renderable version of the artifact: a deep copy of the mesh data with
//! every sub-material rebound to the catalog's textures and the catalog pose
//! attached. Raw artifacts are cached and shared between load cycles, so the
//! copy is what keeps repeated loads from mutating a cached original.
//!
//! Texture pairing rules:
//!
//! - a single texture is applied to every sub-material
//! - a texture list is paired index-for-index with the mesh's sub-materials;
//!   the list must not be longer than the material list, and sub-materials
//!   beyond the list keep the fallback binding
//!
//! Shininess and specular color are preserved from the source material when
//! the MTL provides them, otherwise fixed defaults apply.

use anyhow::{bail, Result};

use crate::data_structures::model::{MaterialSpec, MeshData, RawArtifact};
use crate::registry::{ModelTransform, TextureSource};

pub const DEFAULT_SHININESS: f32 = 30.0;
/// Dark gray highlight (0x222222).
pub const DEFAULT_SPECULAR: [f32; 3] = [
    0x22 as f32 / 255.0,
    0x22 as f32 / 255.0,
    0x22 as f32 / 255.0,
];

/// A sub-material with fully resolved shading parameters.
///
/// `texture` indexes into the load cycle's decoded texture list in pairing
/// order; `None` leaves the sub-material on the solid fallback map.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedMaterial {
    pub name: String,
    pub texture: Option<usize>,
    pub shininess: f32,
    pub specular: [f32; 3],
}

/// An artifact ready for GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedArtifact {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<NormalizedMaterial>,
    pub transform: ModelTransform,
}

/// Rebuild `raw` into its renderable form.
///
/// `raw` is left untouched; the result owns deep copies of all mesh data.
pub fn normalize(
    raw: &RawArtifact,
    textures: &TextureSource,
    transform: ModelTransform,
) -> Result<NormalizedArtifact> {
    // Meshes without any MTL material still need one slot to bind against.
    let specs: Vec<MaterialSpec> = if raw.materials.is_empty() {
        vec![MaterialSpec::unnamed()]
    } else {
        raw.materials.clone()
    };

    let materials = match textures {
        TextureSource::Single(_) => specs
            .iter()
            .map(|spec| resolve(spec, Some(0)))
            .collect::<Vec<_>>(),
        TextureSource::Many(urls) => {
            if urls.len() > specs.len() {
                bail!(
                    "texture list ({}) is longer than the mesh's material list ({})",
                    urls.len(),
                    specs.len()
                );
            }
            specs
                .iter()
                .enumerate()
                .map(|(index, spec)| {
                    let binding = (index < urls.len()).then_some(index);
                    resolve(spec, binding)
                })
                .collect::<Vec<_>>()
        }
    };

    Ok(NormalizedArtifact {
        meshes: raw.meshes.clone(),
        materials,
        transform,
    })
}

fn resolve(spec: &MaterialSpec, texture: Option<usize>) -> NormalizedMaterial {
    NormalizedMaterial {
        name: spec.name.clone(),
        texture,
        shininess: spec.shininess.unwrap_or(DEFAULT_SHININESS),
        specular: spec.specular.unwrap_or(DEFAULT_SPECULAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::ModelVertex;

    fn mesh(name: &str, material_id: usize) -> MeshData {
        MeshData {
            name: name.to_string(),
            vertices: vec![
                ModelVertex {
                    position: [0.0, 0.0, 0.0],
                    tex_coords: [0.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                },
                ModelVertex {
                    position: [1.0, 0.0, 0.0],
                    tex_coords: [1.0, 0.0],
                    normal: [0.0, 0.0, 1.0],
                },
                ModelVertex {
                    position: [0.0, 1.0, 0.0],
                    tex_coords: [0.0, 1.0],
                    normal: [0.0, 0.0, 1.0],
                },
            ],
            indices: vec![0, 1, 2],
            material_id,
        }
    }

    fn material(name: &str) -> MaterialSpec {
        MaterialSpec {
            name: name.to_string(),
            diffuse_texture: None,
            shininess: None,
            specular: None,
        }
    }

    fn artifact(material_count: usize) -> RawArtifact {
        RawArtifact {
            meshes: (0..material_count.max(1))
                .map(|i| mesh(&format!("part{}", i), i.min(material_count.saturating_sub(1))))
                .collect(),
            materials: (0..material_count)
                .map(|i| material(&format!("mat{}", i)))
                .collect(),
        }
    }

    #[test]
    fn single_texture_binds_every_sub_material() {
        let raw = artifact(3);
        let normalized = normalize(
            &raw,
            &TextureSource::single("tex0.png"),
            ModelTransform::IDENTITY,
        )
        .unwrap();

        assert_eq!(normalized.materials.len(), 3);
        assert!(normalized
            .materials
            .iter()
            .all(|m| m.texture == Some(0)));
    }

    #[test]
    fn texture_list_pairs_positionally_and_leaves_the_rest() {
        let raw = artifact(4);
        let normalized = normalize(
            &raw,
            &TextureSource::many(["a.jpg", "b.jpg"]),
            ModelTransform::IDENTITY,
        )
        .unwrap();

        assert_eq!(normalized.materials.len(), 4);
        assert_eq!(normalized.materials[0].texture, Some(0));
        assert_eq!(normalized.materials[1].texture, Some(1));
        assert_eq!(normalized.materials[2].texture, None);
        assert_eq!(normalized.materials[3].texture, None);
    }

    #[test]
    fn texture_list_longer_than_materials_is_rejected() {
        let raw = artifact(1);
        let result = normalize(
            &raw,
            &TextureSource::many(["a.jpg", "b.jpg"]),
            ModelTransform::IDENTITY,
        );
        assert!(result.is_err());
    }

    #[test]
    fn shading_defaults_apply_when_the_mtl_is_silent() {
        let raw = artifact(1);
        let normalized = normalize(
            &raw,
            &TextureSource::single("tex0.png"),
            ModelTransform::IDENTITY,
        )
        .unwrap();

        let m = &normalized.materials[0];
        assert_eq!(m.shininess, DEFAULT_SHININESS);
        assert_eq!(m.specular, DEFAULT_SPECULAR);
    }

    #[test]
    fn shading_parameters_survive_when_the_mtl_provides_them() {
        let mut raw = artifact(2);
        raw.materials[0].shininess = Some(96.0);
        raw.materials[0].specular = Some([0.9, 0.8, 0.7]);

        let normalized = normalize(
            &raw,
            &TextureSource::single("tex0.png"),
            ModelTransform::IDENTITY,
        )
        .unwrap();

        assert_eq!(normalized.materials[0].shininess, 96.0);
        assert_eq!(normalized.materials[0].specular, [0.9, 0.8, 0.7]);
        assert_eq!(normalized.materials[1].shininess, DEFAULT_SHININESS);
    }

    #[test]
    fn meshes_without_materials_get_one_default_slot() {
        let raw = RawArtifact {
            meshes: vec![mesh("solo", 0)],
            materials: Vec::new(),
        };
        let normalized = normalize(
            &raw,
            &TextureSource::single("tex0.png"),
            ModelTransform::IDENTITY,
        )
        .unwrap();

        assert_eq!(normalized.materials.len(), 1);
        assert_eq!(normalized.materials[0].texture, Some(0));
    }

    #[test]
    fn normalization_copies_instead_of_mutating_the_original() {
        let raw = artifact(1);
        let mut normalized = normalize(
            &raw,
            &TextureSource::single("tex0.png"),
            ModelTransform::IDENTITY,
        )
        .unwrap();

        normalized.meshes[0].vertices[0].position = [9.0, 9.0, 9.0];
        assert_eq!(raw.meshes[0].vertices[0].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn catalog_pose_is_carried_through() {
        let raw = artifact(1);
        let pose = ModelTransform::IDENTITY.uniform_scale(1.5).at(0.0, -0.6, 0.0);
        let normalized = normalize(&raw, &TextureSource::single("tex0.png"), pose).unwrap();
        assert_eq!(normalized.transform, pose);
    }
}
