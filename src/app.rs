//! Application state holding the wgpu graphics context
//!
//! Owns the surface, the open capture device and the beauty flag, runs one
//! acquire/process/upload cycle per tick and presents the processed frame
//! onto a transparent surface so the desktop shows a circular cutout.

use std::sync::Arc;
use std::time::Instant;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::camera::CameraGrabber;
use crate::frame::DisplayFrame;
use crate::pipeline;

/// Main application state
pub struct App {
    /// Reference to the window
    window: Arc<Window>,
    /// The wgpu surface for presenting rendered frames
    surface: wgpu::Surface<'static>,
    /// The wgpu device for creating GPU resources
    device: wgpu::Device,
    /// The command queue for submitting GPU work
    queue: wgpu::Queue,
    /// Surface configuration
    config: wgpu::SurfaceConfiguration,
    /// Current window size in physical pixels
    size: PhysicalSize<u32>,

    // Capture and processing
    grabber: CameraGrabber,
    beauty_enabled: bool,

    // Frame presentation
    frame_texture: Option<wgpu::Texture>,
    frame_bind_group: Option<wgpu::BindGroup>,
    frame_bind_group_layout: wgpu::BindGroupLayout,
    overlay_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,

    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // Hover controls
    hovered: bool,
    close_requested: bool,

    // Tick accounting
    ticks_since_report: u64,
    skips_since_report: u64,
    last_report: Instant,
}

impl App {
    /// Create a new App instance with initialized wgpu context
    ///
    /// Takes ownership of the already-open capture device; it is released
    /// when the App drops.
    pub async fn new(window: Arc<Window>, grabber: CameraGrabber) -> Self {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find suitable GPU adapter");

        log::info!("Using GPU: {}", adapter.get_info().name);
        log::info!("Backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Camera Bubble Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Surface format: {:?}", surface_format);

        // The circular cutout relies on per-pixel window alpha
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PostMultiplied)
        {
            wgpu::CompositeAlphaMode::PostMultiplied
        } else {
            surface_caps.alpha_modes[0]
        };

        log::info!("Alpha mode: {:?}", alpha_mode);

        // The tick drives presentation, so never let vsync block it
        let present_mode = if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Immediate)
        {
            wgpu::PresentMode::Immediate
        } else if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Mailbox)
        {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::Fifo
        };

        log::info!("Present mode: {:?}", present_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };

        surface.configure(&device, &config);

        // Create sampler
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Create overlay pipeline
        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let overlay_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Overlay Pipeline Layout"),
                bind_group_layouts: &[&frame_bind_group_layout],
                push_constant_ranges: &[],
            });

        let overlay_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Pipeline"),
            layout: Some(&overlay_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &overlay_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &overlay_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let mut style = (*egui_ctx.style()).clone();
        style.visuals.window_shadow = egui::epaint::Shadow::NONE;
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            grabber,
            beauty_enabled: true,
            frame_texture: None,
            frame_bind_group: None,
            frame_bind_group_layout,
            overlay_pipeline,
            sampler,
            egui_ctx,
            egui_state,
            egui_renderer,
            hovered: false,
            close_requested: false,
            ticks_since_report: 0,
            skips_since_report: 0,
            last_report: Instant::now(),
        }
    }

    /// Handle a window event, returning true if egui consumed it
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(&self.window, event);
        response.consumed
    }

    /// Resize the surface
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Get current size
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Toggle the beauty filter on/off
    pub fn toggle_beauty(&mut self) {
        self.beauty_enabled = !self.beauty_enabled;
        log::info!("Beauty filter enabled: {}", self.beauty_enabled);
    }

    /// Whether the beauty filter is currently on
    pub fn beauty_enabled(&self) -> bool {
        self.beauty_enabled
    }

    /// Track whether the cursor is inside the window
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Consume a pending close request from the hover controls
    pub fn take_close_request(&mut self) -> bool {
        std::mem::take(&mut self.close_requested)
    }

    /// Run one tick: acquire a frame, process it, upload the result
    ///
    /// A skipped tick leaves the previous texture in place, so the overlay
    /// keeps showing the last good frame.
    pub fn update_camera(&mut self) {
        self.ticks_since_report += 1;

        match pipeline::process_tick(self.grabber.try_acquire(), self.beauty_enabled) {
            Some(display) => self.upload_frame(&display),
            None => self.skips_since_report += 1,
        }
    }

    /// Upload a processed frame into the overlay texture, recreating it if
    /// the frame size changed
    fn upload_frame(&mut self, frame: &DisplayFrame) {
        let needs_new_texture = match &self.frame_texture {
            None => true,
            Some(tex) => tex.size().width != frame.size,
        };

        if needs_new_texture {
            log::info!("Creating frame texture: {}x{}", frame.size, frame.size);

            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Frame Texture"),
                size: wgpu::Extent3d {
                    width: frame.size,
                    height: frame.size,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: frame.texture_format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Frame Bind Group"),
                layout: &self.frame_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            self.frame_texture = Some(texture);
            self.frame_bind_group = Some(bind_group);
        }

        if let Some(texture) = &self.frame_texture {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &frame.data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(frame.size * 4),
                    rows_per_image: Some(frame.size),
                },
                wgpu::Extent3d {
                    width: frame.size,
                    height: frame.size,
                    depth_or_array_layers: 1,
                },
            );
        }
    }

    /// Render the current frame and the hover controls
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Everything outside the circle stays clear so the desktop shows
        // through
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(bind_group) = &self.frame_bind_group {
                render_pass.set_pipeline(&self.overlay_pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        // Render egui UI
        self.render_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.update_tick_stats();

        Ok(())
    }

    fn render_ui(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let raw_input = self.egui_state.take_egui_input(&self.window);

        // Get UI state before running egui
        let hovered = self.hovered;
        let beauty_enabled = self.beauty_enabled;

        // Run egui with a closure that doesn't borrow self
        let mut close_clicked = false;
        let mut toggle_clicked = false;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            // Controls only show while the cursor is inside the window
            if !hovered {
                return;
            }

            egui::Area::new(egui::Id::new("hover_controls"))
                .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 10.0))
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        let close = egui::Button::new(
                            egui::RichText::new("X")
                                .size(13.0)
                                .strong()
                                .color(egui::Color32::WHITE),
                        )
                        .fill(egui::Color32::from_rgb(200, 60, 60))
                        .corner_radius(egui::CornerRadius::same(10));
                        if ui.add(close).clicked() {
                            close_clicked = true;
                        }

                        let label = if beauty_enabled {
                            "beauty: on"
                        } else {
                            "beauty: off"
                        };
                        let toggle = egui::Button::new(
                            egui::RichText::new(label)
                                .size(11.0)
                                .color(egui::Color32::WHITE),
                        )
                        .fill(egui::Color32::from_black_alpha(170))
                        .corner_radius(egui::CornerRadius::same(10));
                        if ui.add(toggle).clicked() {
                            toggle_clicked = true;
                        }
                    });
                });
        });

        // Apply UI actions
        if close_clicked {
            self.close_requested = true;
        }
        if toggle_clicked {
            self.toggle_beauty();
        }

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let render_pass_static: &mut wgpu::RenderPass<'static> =
                unsafe { std::mem::transmute(&mut render_pass) };

            self.egui_renderer
                .render(render_pass_static, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    /// Once per second, log how the tick cadence is doing
    fn update_tick_stats(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_report).as_secs_f64();
        if elapsed >= 1.0 {
            let shown = self.ticks_since_report - self.skips_since_report;
            log::debug!(
                "{} ticks, {} skipped, {:.1} fps",
                self.ticks_since_report,
                self.skips_since_report,
                shown as f64 / elapsed
            );
            self.ticks_since_report = 0;
            self.skips_since_report = 0;
            self.last_report = now;
        }
    }
}
