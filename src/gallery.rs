//! Gallery control flow and application event loop.
//!
//! The gallery is a small state machine: selecting a catalog entry starts a
//! load cycle, the loading overlay shows aggregate fetch progress, and once
//! the cycle's assets are normalized and uploaded the artifact is displayed.
//!
//! Every load cycle carries a [`LoadTicket`] stamped with a generation
//! counter. Switching models bumps the generation, so a cycle that finishes
//! after it has been superseded is discarded instead of displayed: the last
//! selection always wins, regardless of completion order.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and GPU context, then starts loading the
//!    catalog's default entry
//! 2. clicking a selector button selects that entry and starts a new cycle
//! 3. load tasks run off the event loop (tokio on native, `spawn_local` on
//!    the web) and report back through the winit event loop proxy
//! 4. `RedrawRequested` renders the current phase: artifact, overlay, or both

use std::{iter, sync::Arc};

use instant::Instant;
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::{Context, MouseButtonState},
    data_structures::{
        instance::Instance,
        model::{DrawModel, Model},
        texture::Texture,
    },
    normalize::{normalize, NormalizedArtifact},
    progress::LoadProgress,
    registry::Registry,
    resources::{asset_count, load_artifact, upload_artifact, ArtifactCache},
    ui::{self, UiFrame, UiRenderer},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// One load cycle's identity: which entry it is for and when it was started.
///
/// Tickets from superseded cycles fail [`GalleryState::is_current`] and their
/// results are dropped on arrival.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: String,
    pub generation: u64,
}

/// Selection state: the catalog plus the single active model id.
///
/// The active id is only ever mutated through [`select`](Self::select), which
/// also stamps the returned ticket. Pure; owns no GPU or IO resources.
#[derive(Debug)]
pub struct GalleryState {
    registry: Registry,
    active_id: String,
    generation: u64,
}

impl GalleryState {
    pub fn new(registry: Registry) -> Self {
        let active_id = registry.default_entry().id.clone();
        Self {
            registry,
            active_id,
            generation: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active_index(&self) -> usize {
        self.registry
            .entries()
            .iter()
            .position(|entry| entry.id == self.active_id)
            .unwrap_or(0)
    }

    /// Make `id` the active model and start a new load generation.
    pub fn select(&mut self, id: &str) -> anyhow::Result<LoadTicket> {
        let entry = self.registry.get(id)?;
        self.active_id = entry.id.clone();
        self.generation += 1;
        Ok(LoadTicket {
            id: self.active_id.clone(),
            generation: self.generation,
        })
    }

    /// Whether `ticket` still belongs to the newest load cycle.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }
}

/// The artifact as rendered: GPU model plus its single-instance transform.
#[derive(Debug)]
pub struct DisplayArtifact {
    pub model: Model,
    pub instance_buffer: wgpu::Buffer,
}

/// Where the viewer subtree currently is: empty, suspended behind the
/// loading overlay, or showing an artifact.
enum Phase {
    Idle,
    Loading { progress: Arc<LoadProgress> },
    Ready { display: DisplayArtifact },
}

pub(crate) enum GalleryEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    Loaded {
        ticket: LoadTicket,
        artifact: NormalizedArtifact,
        images: Vec<image::DynamicImage>,
    },
    LoadFailed {
        ticket: LoadTicket,
        error: String,
    },
}

pub(crate) struct AppState {
    ctx: Context,
    gallery: GalleryState,
    phase: Phase,
    cache: Arc<ArtifactCache>,
    ui: UiRenderer,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, registry: Registry) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let ui = UiRenderer::new(&ctx.device, &ctx.queue)?;
        Ok(Self {
            ctx,
            gallery: GalleryState::new(registry),
            phase: Phase::Idle,
            cache: Arc::new(ArtifactCache::default()),
            ui,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn apply_loaded(
        &mut self,
        ticket: LoadTicket,
        artifact: NormalizedArtifact,
        images: Vec<image::DynamicImage>,
    ) {
        if !self.gallery.is_current(&ticket) {
            log::info!("discarding superseded load of '{}'", ticket.id);
            return;
        }

        match upload_artifact(
            &self.ctx.device,
            &self.ctx.queue,
            &artifact,
            &images,
            &ticket.id,
        ) {
            Ok(model) => {
                let instance: Instance = artifact.transform.into();
                let instance_data = [instance.to_raw()];
                let instance_buffer =
                    self.ctx
                        .device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("Artifact Instance Buffer"),
                            contents: bytemuck::cast_slice(&instance_data),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                self.phase = Phase::Ready {
                    display: DisplayArtifact {
                        model,
                        instance_buffer,
                    },
                };
            }
            Err(e) => {
                log::error!("uploading '{}' failed: {:#}", ticket.id, e);
                self.phase = Phase::Idle;
            }
        }
    }

    fn apply_load_failure(&mut self, ticket: LoadTicket, error: String) {
        if !self.gallery.is_current(&ticket) {
            log::debug!("superseded load of '{}' failed late: {}", ticket.id, error);
            return;
        }
        log::error!("loading '{}' failed: {}", ticket.id, error);
        self.phase = Phase::Idle;
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let labels: Vec<String> = self
            .gallery
            .registry()
            .entries()
            .iter()
            .map(|entry| entry.title.clone())
            .collect();
        let active_title = self
            .gallery
            .registry()
            .get(self.gallery.active_id())
            .map(|entry| entry.title.clone())
            .unwrap_or_default();
        let frame = UiFrame {
            labels: &labels,
            active: self.gallery.active_index(),
            loading_percent: match &self.phase {
                Phase::Loading { progress } => Some(progress.percent()),
                _ => None,
            },
            title: match &self.phase {
                Phase::Ready { .. } => Some(active_title.as_str()),
                _ => None,
            },
        };
        self.ui.prepare(&self.ctx.device, &self.ctx.config, &frame);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            if let Phase::Ready { display } = &self.phase {
                render_pass.set_pipeline(&self.ctx.pipelines.artifact);
                render_pass.set_vertex_buffer(1, display.instance_buffer.slice(..));
                render_pass.draw_model_instanced(
                    &display.model,
                    0..1,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }

            // The overlay comes last so the loading scrim covers the scene.
            render_pass.set_pipeline(&self.ctx.pipelines.overlay);
            self.ui.draw(&mut render_pass);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Spawn one load cycle off the event loop and report back through `proxy`.
fn spawn_load(
    #[cfg(not(target_arch = "wasm32"))] runtime: &tokio::runtime::Runtime,
    proxy: EventLoopProxy<GalleryEvent>,
    state: &mut AppState,
    ticket: LoadTicket,
) {
    let entry = match state.gallery.registry().get(&ticket.id) {
        Ok(entry) => entry.clone(),
        Err(e) => {
            log::error!("{:#}", e);
            return;
        }
    };

    let progress = LoadProgress::for_assets(asset_count(&entry));
    state.phase = Phase::Loading {
        progress: progress.clone(),
    };

    let cache = state.cache.clone();
    let task = async move {
        let started = Instant::now();
        let event = match load_artifact(&entry, &cache, &progress).await {
            Ok(assets) => match normalize(&assets.raw, &entry.textures, entry.transform) {
                Ok(artifact) => {
                    log::info!("loaded '{}' in {:?}", ticket.id, started.elapsed());
                    GalleryEvent::Loaded {
                        ticket,
                        artifact,
                        images: assets.textures,
                    }
                }
                Err(e) => GalleryEvent::LoadFailed {
                    ticket,
                    error: format!("{:#}", e),
                },
            },
            Err(e) => GalleryEvent::LoadFailed {
                ticket,
                error: format!("{:#}", e),
            },
        };
        if proxy.send_event(event).is_err() {
            log::error!("event loop closed before a load cycle could finish");
        }
    };

    #[cfg(not(target_arch = "wasm32"))]
    runtime.spawn(task);
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(task);
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<GalleryEvent>,
    registry: Option<Registry>,
    state: Option<AppState>,
}

impl App {
    fn new(event_loop: &EventLoop<GalleryEvent>, registry: Registry) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            registry: Some(registry),
            state: None,
        }
    }

    /// Load the catalog's default entry; called once the context exists.
    fn load_default_entry(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let default_id = state.gallery.active_id().to_string();
        match state.gallery.select(&default_id) {
            Ok(ticket) => spawn_load(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                self.proxy.clone(),
                state,
                ticket,
            ),
            Err(e) => log::error!("{:#}", e),
        }
    }
}

impl ApplicationHandler<GalleryEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(registry) = self.registry.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Relic Gallery");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let init_future = AppState::new(window, registry);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = self.async_runtime.block_on(init_future);
            let state = match state {
                Ok(state) => state,
                Err(e) => panic!(
                    "App initialization failed. Cannot create the main context: {}",
                    e
                ),
            };
            self.state = Some(state);
            self.load_default_entry();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_future
                    .await
                    .expect("App initialization failed. Cannot create the main context");
                assert!(proxy
                    .send_event(GalleryEvent::Initialized(Box::new(state)))
                    .is_ok());
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: GalleryEvent) {
        match event {
            GalleryEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(*state);

                // Important: Trigger a resize and redraw now that we are initialized
                let app_state = self.state.as_mut().unwrap();
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
                app_state.ctx.window.request_redraw();
                self.load_default_entry();
            }
            GalleryEvent::Loaded {
                ticket,
                artifact,
                images,
            } => {
                if let Some(state) = &mut self.state {
                    state.apply_loaded(ticket, artifact, images);
                }
            }
            GalleryEvent::LoadFailed { ticket, error } => {
                if let Some(state) = &mut self.state {
                    state.apply_load_failure(ticket, error);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if let MouseButtonState::Left = state.ctx.mouse.pressed {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        if let WindowEvent::CursorMoved {
            device_id: _,
            position,
        } = event
        {
            state.ctx.mouse.coords = position;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                match state.render() {
                    Ok(_) => {
                        // Apply accumulated mouse input for the next frame.
                        state
                            .ctx
                            .camera
                            .controller
                            .update(&mut state.ctx.camera.camera);
                        state
                            .ctx
                            .camera
                            .uniform
                            .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                        state.ctx.queue.write_buffer(
                            &state.ctx.camera.buffer,
                            0,
                            bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                        );
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => {
                    let rects = ui::button_rects(
                        state.gallery.registry().entries().len(),
                        state.ctx.config.width as f32,
                        state.ctx.config.height as f32,
                    );
                    let coords = state.ctx.mouse.coords;
                    if let Some(index) = ui::hit_button(&rects, coords.x as f32, coords.y as f32) {
                        let id = state.gallery.registry().entries()[index].id.clone();
                        let already_shown = id == state.gallery.active_id()
                            && !matches!(state.phase, Phase::Idle);
                        if !already_shown {
                            match state.gallery.select(&id) {
                                Ok(ticket) => spawn_load(
                                    #[cfg(not(target_arch = "wasm32"))]
                                    &self.async_runtime,
                                    self.proxy.clone(),
                                    state,
                                    ticket,
                                ),
                                Err(e) => log::error!("{:#}", e),
                            }
                        }
                    } else {
                        state.ctx.mouse.pressed = MouseButtonState::Left;
                    }
                }
                (MouseButton::Right, true) => {
                    state.ctx.mouse.pressed = MouseButtonState::Right;
                }
                (_, false) => state.ctx.mouse.pressed = MouseButtonState::None,
                _ => (),
            },
            _ => {}
        }
    }
}

/// Run the gallery over the given catalog until the window closes.
pub fn run(registry: Registry) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<GalleryEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, registry);

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_an_entry_makes_it_and_only_it_active() {
        let mut gallery = GalleryState::new(Registry::museum());
        for id in ["anan", "shanxi", "qingtong"] {
            gallery.select(id).unwrap();
            assert_eq!(gallery.active_id(), id);
            let index = gallery.active_index();
            assert_eq!(gallery.registry().entries()[index].id, id);
        }
    }

    #[test]
    fn selecting_an_unknown_id_is_an_error_and_changes_nothing() {
        let mut gallery = GalleryState::new(Registry::museum());
        let before = gallery.active_id().to_string();
        assert!(gallery.select("nonexistent").is_err());
        assert_eq!(gallery.active_id(), before);
    }

    #[test]
    fn a_newer_selection_invalidates_older_tickets() {
        let mut gallery = GalleryState::new(Registry::museum());
        let first = gallery.select("anan").unwrap();
        let second = gallery.select("shanxi").unwrap();

        assert!(!gallery.is_current(&first));
        assert!(gallery.is_current(&second));
    }

    #[test]
    fn reselecting_the_same_id_supersedes_the_pending_cycle() {
        let mut gallery = GalleryState::new(Registry::museum());
        let first = gallery.select("anan").unwrap();
        let second = gallery.select("anan").unwrap();

        assert_eq!(first.id, second.id);
        assert!(!gallery.is_current(&first));
        assert!(gallery.is_current(&second));
    }
}
