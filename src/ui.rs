//! Selector buttons and loading overlay.
//!
//! The UI is a handful of flat quads drawn by the overlay pipeline from a
//! single atlas built at startup: a row of solid-color cells plus a small
//! 5x7 glyph set for labels and the percent readout. Layout and hit-testing
//! are plain functions over screen rectangles so they can be tested without
//! a GPU.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    pipelines::overlay::{self, Vertex},
};

pub const BUTTON_WIDTH: f32 = 160.0;
pub const BUTTON_HEIGHT: f32 = 44.0;
pub const BUTTON_GAP: f32 = 16.0;
const BUTTON_MARGIN_BOTTOM: f32 = 24.0;
const BAR_WIDTH: f32 = 300.0;
const BAR_HEIGHT: f32 = 10.0;

/// A screen-space rectangle, top-left origin, in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

/// One selector button per catalog entry, centered in a row along the bottom.
pub fn button_rects(count: usize, surface_width: f32, surface_height: f32) -> Vec<Rect> {
    let row_width = count as f32 * BUTTON_WIDTH + count.saturating_sub(1) as f32 * BUTTON_GAP;
    let mut x = (surface_width - row_width) / 2.0;
    let y = surface_height - BUTTON_MARGIN_BOTTOM - BUTTON_HEIGHT;
    (0..count)
        .map(|_| {
            let rect = Rect {
                x,
                y,
                w: BUTTON_WIDTH,
                h: BUTTON_HEIGHT,
            };
            x += BUTTON_WIDTH + BUTTON_GAP;
            rect
        })
        .collect()
}

/// Index of the button under the cursor, if any.
pub fn hit_button(rects: &[Rect], px: f32, py: f32) -> Option<usize> {
    rects.iter().position(|rect| rect.contains(px, py))
}

/// Everything the UI shows in one frame.
pub struct UiFrame<'a> {
    pub labels: &'a [String],
    pub active: usize,
    /// `Some(percent)` while a load cycle is pending.
    pub loading_percent: Option<f32>,
    /// Title of the displayed artifact once loading finished.
    pub title: Option<&'a str>,
}

// --- atlas ------------------------------------------------------------------

const GLYPHS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789%-. ";
const GLYPH_CELL: u32 = 8;
const GLYPHS_PER_ROW: u32 = 16;
const ATLAS_WIDTH: u32 = 128;
const ATLAS_HEIGHT: u32 = 40;
const SOLID_ROW_HEIGHT: u32 = 8;

// Solid cell indices within the atlas's top row.
const SOLID_PANEL: u32 = 0;
const SOLID_ACTIVE: u32 = 1;
const SOLID_TRACK: u32 = 2;
const SOLID_FILL: u32 = 3;
const SOLID_SCRIM: u32 = 4;

const SOLID_COLORS: [[u8; 4]; 5] = [
    [34, 34, 42, 230],    // button panel
    [232, 176, 56, 255],  // active button
    [70, 70, 82, 255],    // progress track
    [122, 198, 128, 255], // progress fill
    [0, 0, 0, 150],       // loading scrim
];

/// Classic 5x7 bitmap glyphs, one byte per row, bit 4 = leftmost column.
#[rustfmt::skip]
const GLYPH_ROWS: [[u8; 7]; 40] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // %
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // .
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
];

fn glyph_index(c: char) -> Option<usize> {
    GLYPHS.chars().position(|g| g == c)
}

/// Compose the UI atlas: solid cells in the top row, glyph grid below.
fn build_atlas() -> image::RgbaImage {
    let mut atlas = image::RgbaImage::new(ATLAS_WIDTH, ATLAS_HEIGHT);

    for (cell, color) in SOLID_COLORS.iter().enumerate() {
        let x0 = cell as u32 * GLYPH_CELL;
        for y in 0..SOLID_ROW_HEIGHT {
            for x in x0..x0 + GLYPH_CELL {
                atlas.put_pixel(x, y, image::Rgba(*color));
            }
        }
    }

    for (index, rows) in GLYPH_ROWS.iter().enumerate() {
        let cell_x = (index as u32 % GLYPHS_PER_ROW) * GLYPH_CELL;
        let cell_y = SOLID_ROW_HEIGHT + (index as u32 / GLYPHS_PER_ROW) * GLYPH_CELL;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (0x10 >> col) != 0 {
                    atlas.put_pixel(
                        cell_x + 1 + col,
                        cell_y + row as u32,
                        image::Rgba([235, 235, 235, 255]),
                    );
                }
            }
        }
    }

    atlas
}

// --- quad assembly ----------------------------------------------------------

fn solid_uv(cell: u32) -> [f32; 2] {
    // Sample the cell's center so filtering never bleeds into neighbors.
    [
        (cell as f32 * GLYPH_CELL as f32 + GLYPH_CELL as f32 / 2.0) / ATLAS_WIDTH as f32,
        SOLID_ROW_HEIGHT as f32 / 2.0 / ATLAS_HEIGHT as f32,
    ]
}

fn glyph_uvs(index: usize) -> ([f32; 2], [f32; 2]) {
    let cell_x = (index as u32 % GLYPHS_PER_ROW) * GLYPH_CELL;
    let cell_y = SOLID_ROW_HEIGHT + (index as u32 / GLYPHS_PER_ROW) * GLYPH_CELL;
    let min = [
        cell_x as f32 / ATLAS_WIDTH as f32,
        cell_y as f32 / ATLAS_HEIGHT as f32,
    ];
    let max = [
        (cell_x + 7) as f32 / ATLAS_WIDTH as f32,
        (cell_y + 7) as f32 / ATLAS_HEIGHT as f32,
    ];
    (min, max)
}

struct QuadBatch {
    width: f32,
    height: f32,
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
}

impl QuadBatch {
    fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn to_ndc(&self, px: f32, py: f32) -> [f32; 3] {
        [
            px / self.width * 2.0 - 1.0,
            1.0 - py / self.height * 2.0,
            0.0,
        ]
    }

    fn push_quad(&mut self, rect: Rect, uv_min: [f32; 2], uv_max: [f32; 2]) {
        let base = self.vertices.len() as u16;
        let corners = [
            (rect.x, rect.y, [uv_min[0], uv_min[1]]),
            (rect.x, rect.y + rect.h, [uv_min[0], uv_max[1]]),
            (rect.x + rect.w, rect.y + rect.h, [uv_max[0], uv_max[1]]),
            (rect.x + rect.w, rect.y, [uv_max[0], uv_min[1]]),
        ];
        for (px, py, uv) in corners {
            self.vertices.push(Vertex {
                position: self.to_ndc(px, py),
                tex_coords: uv,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn push_solid(&mut self, rect: Rect, cell: u32) {
        let uv = solid_uv(cell);
        self.push_quad(rect, uv, uv);
    }

    fn push_text(&mut self, text: &str, center_x: f32, baseline_y: f32, scale: f32) {
        let advance = 6.0 * scale;
        let text_width = text.chars().count() as f32 * advance;
        let mut x = center_x - text_width / 2.0;
        let y = baseline_y - 7.0 * scale / 2.0;
        for c in text.chars().map(|c| c.to_ascii_uppercase()) {
            if let Some(index) = glyph_index(c) {
                let (uv_min, uv_max) = glyph_uvs(index);
                self.push_quad(
                    Rect {
                        x,
                        y,
                        w: 7.0 * scale,
                        h: 7.0 * scale,
                    },
                    uv_min,
                    uv_max,
                );
            }
            x += advance;
        }
    }
}

/// Assemble all quads for one frame. Pure; exercised directly by tests.
fn build_quads(frame: &UiFrame, width: f32, height: f32) -> (Vec<Vertex>, Vec<u16>) {
    let mut batch = QuadBatch::new(width, height);

    if let Some(percent) = frame.loading_percent {
        batch.push_solid(
            Rect {
                x: 0.0,
                y: 0.0,
                w: width,
                h: height,
            },
            SOLID_SCRIM,
        );

        let track = Rect {
            x: (width - BAR_WIDTH) / 2.0,
            y: height / 2.0 - BAR_HEIGHT / 2.0,
            w: BAR_WIDTH,
            h: BAR_HEIGHT,
        };
        batch.push_solid(track, SOLID_TRACK);
        let fill_width = BAR_WIDTH * percent.clamp(0.0, 100.0) / 100.0;
        if fill_width > 0.0 {
            batch.push_solid(
                Rect {
                    w: fill_width,
                    ..track
                },
                SOLID_FILL,
            );
        }
        batch.push_text(
            &format!("{:.2}%", percent),
            width / 2.0,
            track.y + track.h + 28.0,
            2.0,
        );
    } else if let Some(title) = frame.title {
        batch.push_text(title, width / 2.0, 48.0, 3.0);
    }

    let rects = button_rects(frame.labels.len(), width, height);
    for (index, (rect, label)) in rects.iter().zip(frame.labels).enumerate() {
        let cell = if index == frame.active {
            SOLID_ACTIVE
        } else {
            SOLID_PANEL
        };
        batch.push_solid(*rect, cell);
        batch.push_text(label, rect.x + rect.w / 2.0, rect.y + rect.h / 2.0, 2.0);
    }

    (batch.vertices, batch.indices)
}

// --- GPU side ---------------------------------------------------------------

/// Owns the atlas and the per-frame quad buffers.
#[derive(Debug)]
pub struct UiRenderer {
    bind_group: wgpu::BindGroup,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl UiRenderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Self> {
        let atlas = build_atlas();
        let atlas = Texture::from_image(
            device,
            queue,
            &image::DynamicImage::ImageRgba8(atlas),
            Some("ui atlas"),
        )?;
        let layout = overlay::mk_texture_bind_group_layout(device);
        let bind_group = overlay::mk_bind_group(device, &atlas, &layout);

        Ok(Self {
            bind_group,
            vertex_buffer: None,
            index_buffer: None,
            index_count: 0,
        })
    }

    /// Rebuild the quad buffers for this frame's UI state.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        frame: &UiFrame,
    ) {
        let (vertices, indices) =
            build_quads(frame, config.width as f32, config.height as f32);
        self.index_count = indices.len() as u32;
        if indices.is_empty() {
            self.vertex_buffer = None;
            self.index_buffer = None;
            return;
        }

        self.vertex_buffer = Some(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("UI Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        self.index_buffer = Some(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("UI Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));
    }

    pub fn draw<'pass>(&'pass self, render_pass: &mut wgpu::RenderPass<'pass>) {
        let (Some(vertex_buffer), Some(index_buffer)) =
            (self.vertex_buffer.as_ref(), self.index_buffer.as_ref())
        else {
            return;
        };
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["Ananda".to_string(), "Bronze".to_string(), "Shanxi".to_string()]
    }

    #[test]
    fn buttons_form_a_centered_row() {
        let rects = button_rects(3, 1280.0, 720.0);
        assert_eq!(rects.len(), 3);

        let left = rects[0].x;
        let right = 1280.0 - (rects[2].x + rects[2].w);
        assert!((left - right).abs() < 0.5);
        assert!(rects.iter().all(|r| r.y + r.h <= 720.0));
        assert!(rects.windows(2).all(|w| w[0].x + w[0].w <= w[1].x));
    }

    #[test]
    fn hit_test_resolves_each_button_and_nothing_else() {
        let rects = button_rects(3, 1280.0, 720.0);
        for (index, rect) in rects.iter().enumerate() {
            let hit = hit_button(&rects, rect.x + rect.w / 2.0, rect.y + rect.h / 2.0);
            assert_eq!(hit, Some(index));
        }
        assert_eq!(hit_button(&rects, 10.0, 10.0), None);
    }

    #[test]
    fn loading_frame_adds_scrim_bar_and_readout() {
        let labels = labels();
        let frame = UiFrame {
            labels: &labels,
            active: 1,
            loading_percent: Some(42.5),
            title: None,
        };
        let (vertices, indices) = build_quads(&frame, 1280.0, 720.0);
        assert!(!vertices.is_empty());
        assert_eq!(indices.len() % 6, 0);

        // scrim + track + fill, plus "42.50%" (6 glyphs), plus 3 buttons
        // with 6-glyph labels each.
        let quads = indices.len() / 6;
        assert_eq!(quads, 3 + 6 + 3 * (1 + 6));
    }

    #[test]
    fn empty_progress_draws_no_fill_quad() {
        let labels = labels();
        let some = |p| UiFrame {
            labels: &labels,
            active: 0,
            loading_percent: Some(p),
            title: None,
        };
        let quads_at = |p| build_quads(&some(p), 1280.0, 720.0).1.len() / 6;
        // "0.00%" has one glyph fewer than "50.00%".
        assert_eq!(quads_at(0.0) + 2, quads_at(50.0));
    }

    #[test]
    fn glyphs_exist_for_every_catalog_label() {
        for label in labels() {
            for c in label.to_ascii_uppercase().chars() {
                assert!(glyph_index(c).is_some(), "missing glyph for {:?}", c);
            }
        }
    }

    #[test]
    fn all_vertices_stay_in_ndc_range() {
        let labels = labels();
        let frame = UiFrame {
            labels: &labels,
            active: 0,
            loading_percent: Some(100.0),
            title: None,
        };
        let (vertices, _) = build_quads(&frame, 800.0, 600.0);
        for v in vertices {
            assert!((-1.0..=1.0).contains(&v.position[0]));
            assert!((-1.0..=1.0).contains(&v.position[1]));
        }
    }
}
