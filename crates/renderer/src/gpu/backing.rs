/// Offscreen colour target the cloud program renders into.
///
/// Sized to the backing-store resolution and stretched over the swapchain by
/// the blit pass, so the two resolutions vary independently.
pub(crate) struct BackingStore {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub blit_bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

pub(crate) const BACKING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

impl BackingStore {
    pub fn new(
        device: &wgpu::Device,
        blit_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
    ) -> Self {
        // Zero-sized textures are invalid; the viewport still reports the
        // real size so nothing is drawn.
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("cloud backing store"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: BACKING_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit bind group"),
            layout: blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Self {
            _texture: texture,
            view,
            blit_bind_group,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
