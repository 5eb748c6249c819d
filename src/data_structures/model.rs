//! Artifact model data, CPU-side and on the GPU.
//!
//! Loading keeps a clean split: [`MeshData`] and [`MaterialSpec`] are plain
//! CPU data produced by the loader and consumed by the normalizer, while
//! [`Model`], [`Mesh`] and [`Material`] own the GPU buffers and bind groups
//! built from them at upload time.

use wgpu::util::DeviceExt;

use crate::data_structures::texture::Texture;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One sub-mesh of an artifact as parsed from the OBJ file.
///
/// `material_id` indexes into the owning artifact's material list.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material_id: usize,
}

/// Shading parameters of one sub-material as parsed from the MTL file.
///
/// `shininess` and `specular` are `None` when the MTL leaves them out; the
/// normalizer substitutes fixed defaults in that case.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSpec {
    pub name: String,
    pub diffuse_texture: Option<String>,
    pub shininess: Option<f32>,
    pub specular: Option<[f32; 3]>,
}

impl MaterialSpec {
    pub fn unnamed() -> Self {
        Self {
            name: "default".to_string(),
            diffuse_texture: None,
            shininess: None,
            specular: None,
        }
    }
}

/// A complete artifact as loaded, before normalization.
///
/// Raw artifacts are cached and shared between load cycles; the normalizer
/// always works on a deep copy so the cached original stays untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct RawArtifact {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialSpec>,
}

/// Blinn-Phong parameters uploaded alongside each material's diffuse map.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PhongUniform {
    pub specular: [f32; 3],
    pub shininess: f32,
}

/// GPU material: diffuse texture, sampler and phong parameters in one bind group.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: &Texture,
        phong: PhongUniform,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let phong_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} phong params", name)),
            contents: bytemuck::cast_slice(&[phong]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(
                        diffuse_texture
                            .sampler
                            .as_ref()
                            .expect("diffuse textures carry a sampler"),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: phong_buffer.as_entire_binding(),
                },
            ],
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            bind_group,
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

/// Draw a [`Model`] with per-instance transforms bound at vertex buffer slot 1.
pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: std::ops::Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
    fn draw_model_instanced(
        &mut self,
        model: &'a Model,
        instances: std::ops::Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: std::ops::Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &'b Model,
        instances: std::ops::Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh_instanced(
                mesh,
                material,
                instances.clone(),
                camera_bind_group,
                light_bind_group,
            );
        }
    }
}
