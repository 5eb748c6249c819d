//! Asset loading for gallery artifacts.
//!
//! One load cycle fetches a catalog entry's material file, then its mesh
//! (with the material attached while the mesh is parsed), then its texture
//! image(s), and produces CPU-side data for the normalizer. GPU upload
//! is a separate step ([`upload_artifact`]) so everything up to it runs off
//! the render thread and without a device.

pub mod mesh;
pub mod texture;

use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
    sync::{Arc, Mutex},
};

use anyhow::{Context as _, Result};

use crate::{
    data_structures::{
        model::{MaterialSpec, MeshData, Model, ModelVertex, PhongUniform, RawArtifact},
        texture::Texture,
    },
    normalize::NormalizedArtifact,
    progress::LoadProgress,
    registry::ModelEntry,
    resources::texture::{load_bytes, load_string, phong_texture_layout},
};

/// Everything one load cycle produced, still CPU-side.
pub struct LoadedAssets {
    pub raw: Arc<RawArtifact>,
    pub textures: Vec<image::DynamicImage>,
}

/// Raw artifacts shared across load cycles, keyed by mesh URL.
///
/// Re-selecting a model skips the mesh and material fetches. Cached values
/// are behind `Arc` and never handed out mutably; the normalizer deep-copies.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: Mutex<HashMap<String, Arc<RawArtifact>>>,
}

impl ArtifactCache {
    pub fn get(&self, mesh_url: &str) -> Option<Arc<RawArtifact>> {
        self.entries.lock().unwrap().get(mesh_url).cloned()
    }

    fn insert(&self, mesh_url: &str, raw: Arc<RawArtifact>) {
        self.entries.lock().unwrap().insert(mesh_url.to_string(), raw);
    }
}

/// Number of individual fetches a load cycle for `entry` performs.
///
/// Used to size the cycle's [`LoadProgress`]: material + mesh + one per
/// texture. Cache hits report the skipped fetches as finished immediately.
pub fn asset_count(entry: &ModelEntry) -> u32 {
    2 + entry.textures.urls().len() as u32
}

/// Fetch and parse everything `entry` needs.
pub async fn load_artifact(
    entry: &ModelEntry,
    cache: &ArtifactCache,
    progress: &LoadProgress,
) -> Result<LoadedAssets> {
    let raw = match cache.get(&entry.mesh_url) {
        Some(raw) => {
            log::debug!("artifact cache hit for {}", entry.mesh_url);
            // material + mesh fetches are skipped entirely
            progress.finish_asset();
            progress.finish_asset();
            raw
        }
        None => {
            let raw = Arc::new(fetch_raw(entry, progress).await?);
            cache.insert(&entry.mesh_url, raw.clone());
            raw
        }
    };

    // Texture fetches run concurrently; decoded images keep pairing order.
    let textures = futures::future::try_join_all(
        entry
            .textures
            .urls()
            .into_iter()
            .map(|url| async move {
                let bytes = load_bytes(url, progress).await?;
                let format = std::path::Path::new(url)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(image::ImageFormat::from_extension);
                match format {
                    Some(format) => image::load_from_memory_with_format(&bytes, format),
                    None => image::load_from_memory(&bytes),
                }
                .with_context(|| format!("could not decode texture {}", url))
            }),
    )
    .await?;

    Ok(LoadedAssets { raw, textures })
}

async fn fetch_raw(entry: &ModelEntry, progress: &LoadProgress) -> Result<RawArtifact> {
    // The material file comes first so it can be attached during mesh parse.
    let mtl_text = load_string(&entry.material_url, progress).await?;
    let obj_text = load_string(&entry.mesh_url, progress).await?;
    parse_artifact(&obj_text, &mtl_text, &entry.mesh_url).await
}

/// Parse fetched OBJ and MTL text into CPU-side artifact data.
pub async fn parse_artifact(
    obj_text: &str,
    mtl_text: &str,
    mesh_name: &str,
) -> Result<RawArtifact> {
    let parsed_mtl = tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl_text.as_bytes())));
    let (mtl_materials, mtl_index) = match parsed_mtl {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("unusable material file for {}: {}", mesh_name, e);
            (Vec::new(), HashMap::new())
        }
    };

    let mut obj_reader = BufReader::new(Cursor::new(obj_text.as_bytes()));
    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_mtllib| {
            let materials = mtl_materials.clone();
            let index = mtl_index.clone();
            async move { Ok((materials, index)) }
        },
    )
    .await
    .with_context(|| format!("could not parse mesh {}", mesh_name))?;

    // An OBJ without an mtllib directive never invokes the loader callback;
    // fall back to the fetched material list in that case.
    let materials = match obj_materials {
        Ok(materials) if !materials.is_empty() => materials,
        _ => mtl_materials,
    };

    let meshes = models
        .iter()
        .map(|m| to_mesh_data(m, mesh_name))
        .collect();
    let materials = materials.iter().map(to_material_spec).collect();

    Ok(RawArtifact { meshes, materials })
}

fn to_mesh_data(m: &tobj::Model, file_name: &str) -> MeshData {
    let vertices = (0..m.mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                m.mesh.positions[i * 3],
                m.mesh.positions[i * 3 + 1],
                m.mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect();

    MeshData {
        name: if m.name.is_empty() {
            file_name.to_string()
        } else {
            m.name.clone()
        },
        vertices,
        // Indices cover positions, texels and normals alike because we parse
        // with `single_index`.
        indices: m.mesh.indices.clone(),
        material_id: m.mesh.material_id.unwrap_or(0),
    }
}

fn to_material_spec(m: &tobj::Material) -> MaterialSpec {
    MaterialSpec {
        name: m.name.clone(),
        diffuse_texture: m.diffuse_texture.clone(),
        shininess: m.shininess,
        specular: m.specular,
    }
}

/// Upload a normalized artifact and its decoded textures to the GPU.
pub fn upload_artifact(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    normalized: &NormalizedArtifact,
    images: &[image::DynamicImage],
    label: &str,
) -> Result<Model> {
    let layout = phong_texture_layout(device);

    let mut color_maps = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        color_maps.push(Texture::from_image(
            device,
            queue,
            image,
            Some(&format!("{} tex{}", label, index)),
        )?);
    }
    let fallback = Texture::create_solid_color(
        [255, 255, 255, 255],
        device,
        queue,
        &format!("{} fallback map", label),
    );

    let materials = normalized
        .materials
        .iter()
        .map(|material| {
            let color_map = material
                .texture
                .and_then(|index| color_maps.get(index))
                .unwrap_or(&fallback);
            crate::data_structures::model::Material::new(
                device,
                &material.name,
                color_map,
                PhongUniform {
                    specular: material.specular,
                    shininess: material.shininess,
                },
                &layout,
            )
        })
        .collect::<Vec<_>>();

    let meshes = mesh::upload_meshes(&normalized.meshes, materials.len(), device);

    Ok(Model { meshes, materials })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJ: &str = "\
mtllib model.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl bronze
f 1/1/1 2/2/1 3/3/1
";

    const MTL: &str = "\
newmtl bronze
Ns 96.0
Ks 0.5 0.5 0.5
map_Kd tex0.png
";

    fn parse(obj: &str, mtl: &str) -> RawArtifact {
        futures::executor::block_on(parse_artifact(obj, mtl, "model.obj")).expect("parse artifact")
    }

    #[test]
    fn parses_mesh_with_attached_material() {
        let raw = parse(OBJ, MTL);

        assert_eq!(raw.meshes.len(), 1);
        assert_eq!(raw.meshes[0].vertices.len(), 3);
        assert_eq!(raw.meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(raw.meshes[0].material_id, 0);

        assert_eq!(raw.materials.len(), 1);
        let material = &raw.materials[0];
        assert_eq!(material.name, "bronze");
        assert_eq!(material.shininess, Some(96.0));
        assert_eq!(material.specular, Some([0.5, 0.5, 0.5]));
        assert_eq!(material.diffuse_texture.as_deref(), Some("tex0.png"));
    }

    #[test]
    fn texture_v_coordinate_is_flipped_for_wgpu() {
        let raw = parse(OBJ, MTL);
        let uv = raw.meshes[0].vertices[0].tex_coords;
        // vt 0,0 lands at the top of the texture in wgpu's coordinate system.
        assert_eq!(uv, [0.0, 1.0]);
    }

    #[test]
    fn missing_material_file_still_parses_the_mesh() {
        let raw = parse(OBJ, "");
        assert_eq!(raw.meshes.len(), 1);
        assert!(raw.materials.is_empty());
        assert_eq!(raw.meshes[0].material_id, 0);
    }

    #[test]
    fn cache_returns_the_same_shared_artifact() {
        let cache = ArtifactCache::default();
        assert!(cache.get("anan/model.obj").is_none());

        let raw = Arc::new(parse(OBJ, MTL));
        cache.insert("anan/model.obj", raw.clone());

        let hit = cache.get("anan/model.obj").expect("cache hit");
        assert!(Arc::ptr_eq(&raw, &hit));
    }
}
