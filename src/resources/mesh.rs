//! Mesh upload: turning normalized CPU mesh data into GPU buffers.

use wgpu::util::DeviceExt;

use crate::data_structures::model::{Mesh, MeshData};

/// Upload mesh data as vertex and index buffers.
///
/// `material_count` clamps each mesh's material index so a malformed OBJ
/// (a `usemtl` past the MTL's material list) cannot index out of bounds at
/// draw time.
pub fn upload_meshes(
    meshes: &[MeshData],
    material_count: usize,
    device: &wgpu::Device,
) -> Vec<Mesh> {
    meshes
        .iter()
        .map(|data| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", data.name)),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", data.name)),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            Mesh {
                name: data.name.clone(),
                vertex_buffer,
                index_buffer,
                num_elements: data.indices.len() as u32,
                material: data.material_id.min(material_count.saturating_sub(1)),
            }
        })
        .collect()
}
