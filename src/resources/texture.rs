//! Asset fetching and texture bind-group plumbing.
//!
//! All asset reads funnel through [`load_bytes`], which reports into the
//! current load cycle's [`LoadProgress`]. On native builds assets are read
//! from the staged `assets/` directory; on the web they are fetched over HTTP
//! relative to the configured base path.

#[cfg(not(target_arch = "wasm32"))]
use std::io::Read;

use anyhow::Context as _;

use crate::progress::LoadProgress;

/// URL prefix under which static assets are served on the web build.
///
/// Fixed at build time via the `RELIC_BASE_PATH` env var: `/` for local
/// development, a subpath such as `/relic-gallery/` for production-style
/// serving. Native builds read from the local `assets/` directory instead.
pub fn base_path() -> &'static str {
    option_env!("RELIC_BASE_PATH").unwrap_or("/")
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> reqwest::Url {
    let window = web_sys::window().unwrap();
    let origin = window.location().origin().unwrap();
    let mut base = format!("{}{}", origin, base_path());
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = reqwest::Url::parse(&base).unwrap();
    base.join(file_name).unwrap()
}

/// Fetch one asset, accounting its bytes against `progress`.
pub async fn load_bytes(file_name: &str, progress: &LoadProgress) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name);
        let response = reqwest::get(url).await?;
        if let Some(total) = response.content_length() {
            progress.expect_bytes(total);
        }
        let bytes = response.bytes().await?.to_vec();
        // The browser fetch hands us the whole body at once.
        progress.add_bytes(bytes.len() as u64);
        bytes
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        let file = std::fs::File::open(&path)
            .with_context(|| format!("missing asset {}", path.display()))?;
        progress.expect_bytes(file.metadata()?.len());

        let mut reader = std::io::BufReader::new(file);
        let mut data = Vec::new();
        let mut chunk = [0u8; 64 * 1024];
        loop {
            let read = reader.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
            progress.add_bytes(read as u64);
        }
        data
    };

    progress.finish_asset();
    Ok(data)
}

pub async fn load_string(file_name: &str, progress: &LoadProgress) -> anyhow::Result<String> {
    let bytes = load_bytes(file_name, progress).await?;
    String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", file_name))
}

/// Bind group layout shared by every artifact material: diffuse texture,
/// sampler, and the Blinn-Phong parameter uniform.
pub fn phong_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("Artifact material bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_defaults_to_root() {
        // Builds without RELIC_BASE_PATH serve from the site root.
        if option_env!("RELIC_BASE_PATH").is_none() {
            assert_eq!(base_path(), "/");
        }
    }
}
