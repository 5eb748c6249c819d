//! Per-model transformation data for GPU rendering.
//!
//! Each displayed artifact is drawn as a single instance whose transform comes
//! from its catalog entry. The transform is packed into a GPU buffer and read
//! by the vertex shader.

use cgmath::{Euler, One, Rad};

use crate::{data_structures::model, registry::ModelTransform};

/// A renderable transform: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
        }
    }
}

impl From<ModelTransform> for Instance {
    fn from(transform: ModelTransform) -> Self {
        let [rx, ry, rz] = transform.rotation;
        Instance {
            position: transform.position.into(),
            rotation: Euler::new(Rad(rx), Rad(ry), Rad(rz)).into(),
            scale: transform.scale.into(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

/**
 * As we store instance data directly in GPU memory we need to tell what the bytes refer to:
 *
 * offset: zero as we want to use the full space.
 * stride: length of one instance
 *
 * Stride layout here: world matrix as four 4d vectors, then the normal matrix as three 3d vectors.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // We need to switch from using a step mode of Vertex to Instance
            // This means that our shaders will only change to use the next
            // instance when the shader starts processing a new instance
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s. We need to define a slot
                // for each vec4. We don't have to do this in code, though.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal matrix stored as a 3x3
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn identity_transform_yields_identity_matrix() {
        let instance: Instance = ModelTransform::IDENTITY.into();
        assert_eq!(instance.to_matrix(), cgmath::Matrix4::identity());
    }

    #[test]
    fn catalog_transform_places_scale_and_translation() {
        let transform = ModelTransform::IDENTITY
            .uniform_scale(1.5)
            .at(0.0, -0.6, 0.0);
        let instance: Instance = transform.into();
        let matrix = instance.to_matrix();

        // Column-major: w column carries the translation.
        assert_eq!(matrix.w.y, -0.6);
        assert_eq!(matrix.x.x, 1.5);
        assert_eq!(matrix.y.y, 1.5);
        assert_eq!(matrix.z.z, 1.5);
    }

    #[test]
    fn rotation_is_taken_as_radians() {
        let transform = ModelTransform::IDENTITY.rotated(0.0, std::f32::consts::PI, 0.0);
        let instance: Instance = transform.into();
        let matrix = instance.to_matrix();

        // A half turn around y flips the x axis.
        assert!((matrix.x.x - (-1.0)).abs() < 1e-6);
        assert!((matrix.z.z - (-1.0)).abs() < 1e-6);
    }
}
