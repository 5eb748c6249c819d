//! Render pipeline definitions.
//!
//! - `artifact` draws the textured museum model with Blinn-Phong shading
//! - `overlay` draws flat 2D quads for the selector buttons and loading UI
//! - `light` owns the light uniform shared with the artifact shader

pub mod artifact;
pub mod light;
pub mod overlay;

/// All pipelines the gallery renders with, created once at startup.
#[derive(Debug)]
pub struct Pipelines {
    pub artifact: wgpu::RenderPipeline,
    pub overlay: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            artifact: artifact::mk_artifact_pipeline(
                device,
                config,
                light_bind_group_layout,
                camera_bind_group_layout,
            ),
            overlay: overlay::mk_overlay_pipeline(device, config),
        }
    }
}
