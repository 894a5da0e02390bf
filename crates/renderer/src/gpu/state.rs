use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, warn};
use wgpu::util::DeviceExt;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::window::{Window, WindowLevel};

use crate::backend::{
    LayerStyle, PointerEvents, ProgramLayout, RenderBackend, ShaderStage, Uniform, UniformValue,
};
use crate::compile::{adapt_glsl, check_glsl};

use super::backing::BackingStore;
use super::context::GpuContext;
use super::pipeline::{blit_pipeline, cloud_pipeline, glsl_module, PipelineLayouts};
use super::uniforms::CloudUniforms;

pub struct GpuShader {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
}

pub struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
}

/// wgpu implementation of the drawing context.
///
/// Calls arrive in immediate-mode order (clear, activate, uniforms, draw);
/// the clear and program are recorded and the whole frame is encoded and
/// presented when the draw arrives.
pub struct GpuBackend {
    window: Arc<Window>,
    context: GpuContext,
    layouts: PipelineLayouts,
    blit: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    backing: BackingStore,
    uniforms: CloudUniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: Option<wgpu::Buffer>,
    active: Option<wgpu::RenderPipeline>,
    pending_clear: Option<[f32; 4]>,
    viewport: (u32, u32, u32, u32),
    display_size: (f64, f64),
}

impl GpuBackend {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let context = GpuContext::new(window.clone())?;
        let device = &context.device;
        let layouts = PipelineLayouts::new(device);
        let blit = blit_pipeline(device, &layouts, context.config.format);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("backing store sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let backing = BackingStore::new(device, &layouts.blit_layout, &sampler, 0, 0);

        let uniforms = CloudUniforms::default();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cloud uniforms"),
            size: CloudUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cloud uniform bind group"),
            layout: &layouts.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let display = window.inner_size().to_logical::<f64>(window.scale_factor());
        Ok(Self {
            window,
            context,
            layouts,
            blit,
            sampler,
            backing,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer: None,
            active: None,
            pending_clear: None,
            viewport: (0, 0, 0, 0),
            display_size: (display.width, display.height),
        })
    }

    /// Follows the window's physical size.
    pub fn resize_swapchain(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size);
    }

    /// Runs `create` inside a validation error scope and returns the first
    /// error wgpu reports.
    fn scoped<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(device);
        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(value),
        }
    }

    fn acquire_frame(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.context.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                None
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                None
            }
            Err(err) => {
                error!(error = %err, "failed to acquire swapchain image");
                None
            }
        }
    }

    fn encode_cloud_pass(&self, encoder: &mut wgpu::CommandEncoder, first: u32, count: u32) {
        let load = match self.pending_clear {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: f64::from(a),
            }),
            None => wgpu::LoadOp::Load,
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cloud pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.backing.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let (Some(pipeline), Some(vertices)) = (self.active.as_ref(), self.vertex_buffer.as_ref())
        else {
            return;
        };
        let (x, y, width, height) = self.viewport;
        let width = width.min(self.backing.width.saturating_sub(x));
        let height = height.min(self.backing.height.saturating_sub(y));
        if width == 0 || height == 0 {
            return;
        }
        pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.draw(first..first + count, 0..1);
    }

    fn encode_blit(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blit pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let scale = self.window.scale_factor();
        let (width, height) = self.display_size;
        let width = ((width * scale).round() as u32).min(self.context.config.width);
        let height = ((height * scale).round() as u32).min(self.context.config.height);
        if width == 0 || height == 0 || self.backing.is_empty() {
            return;
        }
        pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        pass.set_pipeline(&self.blit);
        pass.set_bind_group(0, &self.backing.blit_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

impl RenderBackend for GpuBackend {
    type Shader = GpuShader;
    type Program = GpuProgram;

    fn apply_layer_style(&mut self, style: &LayerStyle) {
        let window = self.window.as_ref();
        window.set_decorations(false);
        if style.fixed_fullscreen {
            window.set_outer_position(PhysicalPosition::new(0, 0));
            if let Some(monitor) = window.current_monitor() {
                let _ = window.request_inner_size(monitor.size());
            }
        }
        if style.pointer_events == PointerEvents::None {
            if let Err(err) = window.set_cursor_hittest(false) {
                warn!(error = %err, "window system cannot pass pointer events through");
            }
        }
        window.set_window_level(if style.z_index > 0 {
            WindowLevel::AlwaysOnBottom
        } else {
            WindowLevel::Normal
        });
        window.set_transparent(style.transparent);
        debug!(?style, "applied layer style");
    }

    fn backing_store_size(&self) -> (u32, u32) {
        (self.backing.width, self.backing.height)
    }

    fn set_backing_store_size(&mut self, width: u32, height: u32) {
        self.backing = BackingStore::new(
            &self.context.device,
            &self.layouts.blit_layout,
            &self.sampler,
            width,
            height,
        );
    }

    fn set_display_size(&mut self, width: f64, height: f64) {
        self.display_size = (width, height);
        let current = self.window.inner_size().to_logical::<f64>(self.window.scale_factor());
        if (current.width - width).abs() >= 1.0 || (current.height - height).abs() >= 1.0 {
            let _ = self.window.request_inner_size(LogicalSize::new(width, height));
        }
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<GpuShader, String> {
        let adapted = adapt_glsl(stage, source);
        check_glsl(stage, &adapted)?;
        let label = format!("cloud {stage} shader");
        let module = self.scoped(|device| glsl_module(device, &label, stage, Cow::Owned(adapted)))?;
        Ok(GpuShader { stage, module })
    }

    fn delete_shader(&mut self, shader: GpuShader) {
        debug!(stage = %shader.stage, "released shader module");
        drop(shader.module);
    }

    fn link_program(
        &mut self,
        vertex: &GpuShader,
        fragment: &GpuShader,
        layout: &ProgramLayout,
    ) -> Result<GpuProgram, String> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            return Err(format!(
                "expected vertex and fragment stages, got {} and {}",
                vertex.stage, fragment.stage
            ));
        }
        let pipeline = self.scoped(|device| {
            cloud_pipeline(device, &self.layouts, &vertex.module, &fragment.module, layout)
        })?;
        Ok(GpuProgram { pipeline })
    }

    fn upload_vertices(&mut self, vertices: &[f32]) {
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fullscreen triangle"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.vertex_buffer = Some(buffer);
    }

    fn use_program(&mut self, program: &GpuProgram) {
        self.active = Some(program.pipeline.clone());
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.pending_clear = Some(color);
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) {
        self.uniforms.set(uniform, value);
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        let Some(frame) = self.acquire_frame() else {
            return;
        };
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cloud frame encoder"),
            });
        self.encode_cloud_pass(&mut encoder, first, count);
        self.encode_blit(&mut encoder, &target);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        self.pending_clear = None;
    }
}
