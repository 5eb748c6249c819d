//! relic-gallery
//!
//! A small cross-platform viewer for textured museum artifacts, running
//! natively and in the browser via WASM. Artifacts are OBJ/MTL meshes with
//! image textures; the viewer offers a button per catalog entry, shows
//! aggregate progress while an entry's assets load, and orbits the loaded
//! model under a fixed light rig.
//!
//! High-level modules
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: artifact data models (meshes, materials, textures)
//! - `gallery`: selection state machine and the application event loop
//! - `normalize`: post-load material rebinding and pose application
//! - `pipelines`: render pipelines for artifacts and the flat overlay
//! - `progress`: aggregate byte progress for one load cycle
//! - `registry`: the static artifact catalog
//! - `resources`: asset fetching, parsing and GPU upload
//! - `ui`: selector buttons and the loading overlay
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod gallery;
pub mod normalize;
pub mod pipelines;
pub mod progress;
pub mod registry;
pub mod resources;
pub mod ui;

pub use gallery::run;
pub use registry::Registry;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    if let Err(e) = run(Registry::museum()) {
        log::error!("gallery exited with an error: {:#}", e);
    }
}
