//! Application event loop.
//!
//! Startup happens once: create the window and GPU context, load the asset,
//! run the scene assembler over the hierarchy and upload the batched scene.
//! After that the loop only reacts to pointer moves (camera parallax),
//! resizes (projection/surface sync) and redraws.

use std::sync::Arc;

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    assembler::{self, Scene},
    context::Context,
    render::GpuScene,
    resources::{self, LoadedScene, SCENE_FILE, TEXTURE_FILE},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// How often the frame time gets logged.
const FRAME_LOG_INTERVAL: Duration = Duration::from_secs(5);

pub struct AppState {
    pub(crate) ctx: Context,
    pub(crate) scene: Scene,
    pub(crate) gpu: GpuScene,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await;

        let LoadedScene {
            mut root,
            meshes,
            goblet_material,
            couvert_material,
        } = resources::load_scene(SCENE_FILE, TEXTURE_FILE, &ctx.device, &ctx.queue).await?;

        assembler::assemble(&mut root, &goblet_material, &couvert_material)?;
        let scene = Scene::new(root);

        let gpu = GpuScene::new(
            &ctx.device,
            &ctx.queue,
            &scene,
            meshes,
            &ctx.layouts.material,
            &ctx.layouts.lights,
            &ctx.layouts.shadow_pass,
        );

        Ok(Self {
            ctx,
            scene,
            gpu,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceStatus> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let camera = &mut self.ctx.camera;
        camera
            .uniform
            .update_view_proj(&camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &camera.buffer,
            0,
            bytemuck::cast_slice(&[camera.uniform]),
        );

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture)
            | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
            wgpu::CurrentSurfaceTexture::Timeout => return Err(wgpu::SurfaceStatus::Timeout),
            wgpu::CurrentSurfaceTexture::Occluded => return Err(wgpu::SurfaceStatus::Occluded),
            wgpu::CurrentSurfaceTexture::Outdated => return Err(wgpu::SurfaceStatus::Outdated),
            wgpu::CurrentSurfaceTexture::Lost => return Err(wgpu::SurfaceStatus::Lost),
            wgpu::CurrentSurfaceTexture::Validation => return Err(wgpu::SurfaceStatus::Validation),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        self.gpu
            .encode_shadow_passes(&mut encoder, &self.ctx.pipelines.shadow);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.scene.background),
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
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.ctx.pipelines.scene);
            self.gpu.draw(&mut render_pass, &self.ctx.camera.bind_group);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

pub(crate) enum AppEvent {
    /// Message from the wasm `spawn_local` once async init finished.
    #[allow(dead_code)]
    Initialized(AppState),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    state: Option<AppState>,
    last_time: Instant,
    time_since_log: Duration,
    frames_since_log: u32,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            last_time: Instant::now(),
            time_since_log: Duration::from_millis(0),
            frames_since_log: 0,
        })
    }

    fn track_frame(&mut self) -> Duration {
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();
        self.time_since_log += dt;
        self.frames_since_log += 1;
        if self.time_since_log >= FRAME_LOG_INTERVAL {
            log::debug!(
                "{:.1} fps",
                self.frames_since_log as f32 / self.time_since_log.as_secs_f32()
            );
            self.time_since_log = Duration::from_millis(0);
            self.frames_since_log = 0;
        }
        dt
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            // The hosting page renders the scene as its background layer.
            const CANVAS_ID: &str = "bg";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create the window: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(AppState::new(window)) {
                Ok(mut state) => {
                    let size = state.ctx.window.inner_size();
                    state.resize(size.width, size.height);
                    state.ctx.window.request_redraw();
                    self.state = Some(state);
                }
                Err(e) => {
                    log::error!("App initialization failed: {e:?}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = AppState::new(window)
                    .await
                    .expect_throw("App initialization failed");
                assert!(proxy.send_event(AppEvent::Initialized(state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(mut state) => {
                // Trigger a resize and redraw now that we are initialized
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
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

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                let camera = &mut state.ctx.camera;
                camera.controller.handle_pointer(
                    &mut camera.camera,
                    position.x,
                    position.y,
                    state.ctx.config.width as f32,
                    state.ctx.config.height as f32,
                );
            }
            WindowEvent::RedrawRequested => {
                let _dt = self.track_frame();
                let state = match &mut self.state {
                    Some(state) => state,
                    None => return,
                };
                match state.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceStatus::Lost | wgpu::SurfaceStatus::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {:?}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
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

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    run().unwrap_throw();
}
