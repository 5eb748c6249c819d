//! Gallery data structures: artifact models, textures, and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains CPU-side artifact data plus GPU mesh and material resources
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds the per-model transformation data fed to the vertex shader

pub mod instance;
pub mod model;
pub mod texture;
