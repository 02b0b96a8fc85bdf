use crate::context::{GpuHandle, GpuResource, RenderContext, Warning};
use crate::error::{ResourceError, ResourceResult};
use crate::gl::{
    Attachment, ColorBuffer, ComponentType, Filter, FramebufferStatus, GlApi, ImageDesc, ImageTarget,
    InternalFormat, PixelFormat, RawHandle, ResourceKind, TexParam, TextureTarget, Wrap,
};

use super::texture::{SetupBinding, Texture};

/// Requested storage and sampling of one color attachment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorAttachmentSpec {
    pub internal_format: InternalFormat,
    pub filter: Filter,
    pub wrap: Wrap,
}

impl ColorAttachmentSpec {
    pub const fn new(internal_format: InternalFormat, filter: Filter, wrap: Wrap) -> Self {
        Self { internal_format, filter, wrap }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DepthStencilKind {
    None,
    /// Sampleable combined depth-stencil texture.
    Texture,
    /// Test-only combined depth-stencil storage.
    #[default]
    Renderbuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc {
    pub width: u32,
    pub height: u32,
    pub color_attachments: Vec<ColorAttachmentSpec>,
    pub depth_stencil: DepthStencilKind,
    pub samples: u32,
}

/// Broad storage class of a color attachment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FormatCategory {
    Rgb,
    Rgba,
    SingleChannel,
    FloatingPoint,
}

/// Storage actually allocated for a requested internal format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ColorStorage {
    pub category: FormatCategory,
    pub internal_format: InternalFormat,
    pub format: PixelFormat,
    pub component_type: ComponentType,
}

impl ColorStorage {
    /// Half/full float formats keep their channels as float storage, `Red` becomes
    /// single-channel float, the RGB family is 3-channel bytes and everything else RGBA8.
    pub fn infer(internal_format: InternalFormat) -> Self {
        if internal_format.is_float() {
            let format = match internal_format.channels() {
                1 => PixelFormat::Red,
                2 => PixelFormat::Rg,
                3 => PixelFormat::Rgb,
                _ => PixelFormat::Rgba,
            };
            return Self {
                category: FormatCategory::FloatingPoint,
                internal_format,
                format,
                component_type: ComponentType::Float,
            };
        }
        match internal_format {
            InternalFormat::Red => Self {
                category: FormatCategory::SingleChannel,
                internal_format,
                format: PixelFormat::Red,
                component_type: ComponentType::Float,
            },
            InternalFormat::Rgb | InternalFormat::Rgb8 | InternalFormat::Srgb => Self {
                category: FormatCategory::Rgb,
                internal_format,
                format: PixelFormat::Rgb,
                component_type: ComponentType::UnsignedByte,
            },
            _ => Self {
                category: FormatCategory::Rgba,
                internal_format: InternalFormat::Rgba8,
                format: PixelFormat::Rgba,
                component_type: ComponentType::UnsignedByte,
            },
        }
    }
}

/// Depth-stencil storage that is never sampled.
#[derive(Debug)]
pub struct Renderbuffer {
    handle: GpuHandle,
    samples: u32,
}

impl Renderbuffer {
    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle.raw()
    }

    #[inline]
    pub fn samples(&self) -> u32 {
        self.samples
    }
}

#[derive(Debug)]
pub enum DepthStencilAttachment {
    Texture(Texture),
    Renderbuffer(Renderbuffer),
}

impl DepthStencilAttachment {
    pub fn handle(&self) -> RawHandle {
        match self {
            DepthStencilAttachment::Texture(t) => t.handle(),
            DepthStencilAttachment::Renderbuffer(r) => r.handle(),
        }
    }
}

/// Off-screen render target owning all of its attachments.
#[derive(Debug)]
pub struct Framebuffer {
    handle: GpuHandle,
    color: Vec<Texture>,
    storages: Vec<ColorStorage>,
    depth_stencil: Option<DepthStencilAttachment>,
    width: u32,
    height: u32,
    samples: u32,
    status: FramebufferStatus,
}

struct Attachments {
    color: Vec<Texture>,
    storages: Vec<ColorStorage>,
    depth_stencil: Option<DepthStencilAttachment>,
}

impl Framebuffer {
    /// Allocates the framebuffer and every attachment in `desc`.
    ///
    /// The color attachment count is checked before anything is allocated.
    /// An incomplete result is reported as a warning, not an error; check
    /// [`is_complete`](Framebuffer::is_complete) before rendering into it.
    pub fn new<G: GlApi>(ctx: &mut RenderContext<G>, desc: &FramebufferDesc) -> ResourceResult<Self> {
        let count = desc.color_attachments.len();
        let max = ctx.config().max_color_attachments;
        if !(1..=max).contains(&count) {
            return Err(ResourceError::ColorAttachmentCount { requested: count, max });
        }
        if desc.width == 0 || desc.height == 0 || desc.samples == 0 {
            return Err(ResourceError::InvalidDimensions {
                width: desc.width,
                height: desc.height,
                samples: desc.samples,
            });
        }

        let handle = ctx.create(ResourceKind::Framebuffer)?;
        let previous = ctx.bound_framebuffer();
        ctx.bind_framebuffer(Some(handle.raw()));

        let attached = Self::attach(ctx, desc);
        let status = match &attached {
            Ok(_) => ctx.gl().check_framebuffer_status(),
            Err(_) => FramebufferStatus::Incomplete(0),
        };
        ctx.bind_framebuffer(previous);
        let Attachments { color, storages, depth_stencil } = attached?;

        if let FramebufferStatus::Incomplete(code) = status {
            ctx.warn(Warning::FramebufferIncomplete { framebuffer: handle.raw(), status: code });
        }
        log::debug!(
            "framebuffer {} created ({}x{}, {} color, {:?} depth-stencil, {} samples)",
            handle.raw(),
            desc.width,
            desc.height,
            count,
            desc.depth_stencil,
            desc.samples
        );

        Ok(Self {
            handle,
            color,
            storages,
            depth_stencil,
            width: desc.width,
            height: desc.height,
            samples: desc.samples,
            status,
        })
    }

    fn attach<G: GlApi>(ctx: &mut RenderContext<G>, desc: &FramebufferDesc) -> ResourceResult<Attachments> {
        let (width, height, samples) = (desc.width, desc.height, desc.samples);
        let multisampled = samples > 1;

        let mut color = Vec::with_capacity(desc.color_attachments.len());
        let mut storages = Vec::with_capacity(desc.color_attachments.len());
        for (index, spec) in (0u32..).zip(&desc.color_attachments) {
            let storage = ColorStorage::infer(spec.internal_format);
            let texture = ctx.create(ResourceKind::Texture)?;
            let raw = texture.raw();

            let target = if multisampled {
                TextureTarget::Texture2DMultisample
            } else {
                TextureTarget::Texture2D
            };
            let setup = SetupBinding::begin(ctx, target, raw);
            let gl = ctx.gl_mut();
            if multisampled {
                gl.tex_image_2d_multisample(samples, storage.internal_format, width, height);
            } else {
                let image = ImageDesc {
                    width,
                    height,
                    internal_format: storage.internal_format,
                    format: storage.format,
                    component_type: storage.component_type,
                };
                gl.tex_image_2d(ImageTarget::Texture2D, &image, None);
                gl.tex_parameter(target, TexParam::MinFilter(spec.filter));
                gl.tex_parameter(target, TexParam::MagFilter(spec.filter));
                gl.tex_parameter(target, TexParam::WrapS(spec.wrap));
                gl.tex_parameter(target, TexParam::WrapT(spec.wrap));
            }
            gl.framebuffer_texture_2d(Attachment::Color(index), target, raw);
            setup.end(ctx);

            let texture_samples = if multisampled { samples } else { 0 };
            color.push(Texture::from_parts(texture, target, width, height, storage.internal_format, texture_samples));
            storages.push(storage);
        }

        if color.len() > 1 {
            let buffers: Vec<_> = (0..color.len() as u32).map(ColorBuffer::Color).collect();
            ctx.gl_mut().draw_buffers(&buffers);
        }

        let depth_stencil = match desc.depth_stencil {
            DepthStencilKind::None => None,
            DepthStencilKind::Texture => {
                if samples != 1 {
                    ctx.warn(Warning::MultisampledDepthTexture { samples });
                }
                let texture = ctx.create(ResourceKind::Texture)?;
                let raw = texture.raw();
                let setup = SetupBinding::begin(ctx, TextureTarget::Texture2D, raw);
                let image = ImageDesc {
                    width,
                    height,
                    internal_format: InternalFormat::Depth24Stencil8,
                    format: PixelFormat::DepthStencil,
                    component_type: ComponentType::UnsignedInt24_8,
                };
                let gl = ctx.gl_mut();
                gl.tex_image_2d(ImageTarget::Texture2D, &image, None);
                gl.framebuffer_texture_2d(Attachment::DepthStencil, TextureTarget::Texture2D, raw);
                setup.end(ctx);
                Some(DepthStencilAttachment::Texture(Texture::from_parts(
                    texture,
                    TextureTarget::Texture2D,
                    width,
                    height,
                    InternalFormat::Depth24Stencil8,
                    0,
                )))
            }
            DepthStencilKind::Renderbuffer => {
                let renderbuffer = ctx.create(ResourceKind::Renderbuffer)?;
                let raw = renderbuffer.raw();
                let previous = ctx.bound_renderbuffer();
                ctx.bind_renderbuffer(Some(raw));
                let gl = ctx.gl_mut();
                gl.renderbuffer_storage(samples, InternalFormat::Depth24Stencil8, width, height);
                gl.framebuffer_renderbuffer(Attachment::DepthStencil, raw);
                ctx.bind_renderbuffer(previous);
                Some(DepthStencilAttachment::Renderbuffer(Renderbuffer { handle: renderbuffer, samples }))
            }
        };

        Ok(Attachments { color, storages, depth_stencil })
    }

    pub fn bind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_framebuffer(Some(self.handle.raw()));
    }

    pub fn unbind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_framebuffer(None);
    }

    /// Binds color attachment `index` for sampling on `unit`.
    ///
    /// A bad index or unit records a warning and binds nothing.
    pub fn bind_color_buffer_as_texture<G: GlApi>(&self, ctx: &mut RenderContext<G>, unit: u32, index: usize) -> bool {
        match self.color.get(index) {
            Some(texture) => texture.bind(ctx, unit),
            None => {
                ctx.warn(Warning::AttachmentIndexOutOfRange { index, count: self.color.len() });
                false
            }
        }
    }

    pub fn color_attachments(&self) -> &[Texture] {
        &self.color
    }

    /// Inferred storage of each color attachment, in attachment order.
    pub fn color_storages(&self) -> &[ColorStorage] {
        &self.storages
    }

    pub fn depth_stencil(&self) -> Option<&DepthStencilAttachment> {
        self.depth_stencil.as_ref()
    }

    /// Native id for operations this layer does not wrap (blits, readback).
    #[inline]
    pub fn raw_handle(&self) -> RawHandle {
        self.handle.raw()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn status(&self) -> FramebufferStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

impl GpuResource for Framebuffer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Framebuffer
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use crate::gl::MockGl;
    use crate::gl::mock::{AttachedObject, Call, INCOMPLETE_MULTISAMPLE};

    fn ctx() -> RenderContext<MockGl> {
        RenderContext::new(MockGl::new(), ContextConfig::default())
    }

    fn spec(internal_format: InternalFormat) -> ColorAttachmentSpec {
        ColorAttachmentSpec::new(internal_format, Filter::Linear, Wrap::ClampToEdge)
    }

    fn desc(colors: Vec<ColorAttachmentSpec>, depth_stencil: DepthStencilKind, samples: u32) -> FramebufferDesc {
        FramebufferDesc { width: 1280, height: 720, color_attachments: colors, depth_stencil, samples }
    }

    // ── format inference ──────────────────────────────────────────────────

    #[test]
    fn infer_follows_format_table() {
        use FormatCategory::*;
        let cases = [
            (InternalFormat::Rgba16F, FloatingPoint),
            (InternalFormat::Rgb32F, FloatingPoint),
            (InternalFormat::R16F, FloatingPoint),
            (InternalFormat::Red, SingleChannel),
            (InternalFormat::Rgb, Rgb),
            (InternalFormat::Rgb8, Rgb),
            (InternalFormat::Srgb, Rgb),
            (InternalFormat::Rgba, Rgba),
            (InternalFormat::SrgbAlpha, Rgba),
            (InternalFormat::R8, Rgba),
        ];
        for (format, category) in cases {
            assert_eq!(ColorStorage::infer(format).category, category, "{format:?}");
        }
    }

    #[test]
    fn float_storage_keeps_channels() {
        let s = ColorStorage::infer(InternalFormat::Rgb16F);
        assert_eq!(s.format, PixelFormat::Rgb);
        assert_eq!(s.component_type, ComponentType::Float);
        assert_eq!(s.internal_format, InternalFormat::Rgb16F);

        let fallback = ColorStorage::infer(InternalFormat::Rgba);
        assert_eq!(fallback.internal_format, InternalFormat::Rgba8);
        assert_eq!(fallback.component_type, ComponentType::UnsignedByte);
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn hdr_target_with_renderbuffer_is_complete() {
        let mut ctx = ctx();
        let fb = Framebuffer::new(
            &mut ctx,
            &desc(vec![spec(InternalFormat::Rgba16F)], DepthStencilKind::Renderbuffer, 1),
        )
        .unwrap();

        assert_eq!(fb.color_attachments().len(), 1);
        assert_eq!(fb.color_storages()[0].category, FormatCategory::FloatingPoint);
        assert_eq!(fb.color_attachments()[0].internal_format(), Some(InternalFormat::Rgba16F));
        let Some(DepthStencilAttachment::Renderbuffer(rb)) = fb.depth_stencil() else {
            panic!("expected a depth-stencil renderbuffer");
        };
        assert_eq!(
            ctx.gl().attachment(fb.raw_handle(), Attachment::DepthStencil),
            Some(AttachedObject::Renderbuffer(rb.handle()))
        );
        assert!(fb.is_complete());
        assert_eq!((fb.width(), fb.height()), (1280, 720));
        assert!(ctx.warnings().next().is_none());

        let texture = ctx.gl().texture(fb.color_attachments()[0].handle()).unwrap();
        assert!(texture.has_param(TexParam::MinFilter(Filter::Linear)));
        assert!(texture.has_param(TexParam::WrapS(Wrap::ClampToEdge)));
    }

    #[test]
    fn every_supported_count_yields_that_many_attachments() {
        let formats = [
            InternalFormat::Rgb,
            InternalFormat::Rgba,
            InternalFormat::Red,
            InternalFormat::Rgba16F,
        ];
        for count in 1..=32usize {
            let mut ctx = ctx();
            let colors: Vec<_> = (0..count).map(|i| spec(formats[i % formats.len()])).collect();
            let fb = Framebuffer::new(&mut ctx, &desc(colors.clone(), DepthStencilKind::None, 1)).unwrap();

            assert_eq!(fb.color_attachments().len(), count);
            for (i, (storage, spec)) in fb.color_storages().iter().zip(&colors).enumerate() {
                assert_eq!(*storage, ColorStorage::infer(spec.internal_format));
                assert_eq!(
                    ctx.gl().attachment(fb.raw_handle(), Attachment::Color(i as u32)),
                    Some(AttachedObject::Texture(fb.color_attachments()[i].handle()))
                );
            }
            let draw_buffer_calls = ctx.gl().count_calls(|c| matches!(c, Call::DrawBuffers(_)));
            assert_eq!(draw_buffer_calls, usize::from(count > 1));
        }
    }

    #[test]
    fn draw_buffers_follow_attachment_order() {
        let mut ctx = ctx();
        let colors = vec![spec(InternalFormat::Rgb16F); 3];
        Framebuffer::new(&mut ctx, &desc(colors, DepthStencilKind::Renderbuffer, 1)).unwrap();
        assert!(ctx.gl().calls().contains(&Call::DrawBuffers(vec![
            ColorBuffer::Color(0),
            ColorBuffer::Color(1),
            ColorBuffer::Color(2),
        ])));
    }

    #[test]
    fn unsupported_counts_allocate_nothing() {
        for count in [0usize, 33] {
            let mut ctx = ctx();
            let colors = vec![spec(InternalFormat::Rgba); count];
            let err = Framebuffer::new(&mut ctx, &desc(colors, DepthStencilKind::Renderbuffer, 1)).unwrap_err();
            assert!(matches!(err, ResourceError::ColorAttachmentCount { requested, max: 32 } if requested == count));
            assert!(ctx.gl().created().is_empty());
        }
    }

    #[test]
    fn zero_samples_are_rejected() {
        let mut ctx = ctx();
        let err = Framebuffer::new(&mut ctx, &desc(vec![spec(InternalFormat::Rgb)], DepthStencilKind::None, 0))
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidDimensions { samples: 0, .. }));
    }

    #[test]
    fn allocation_failure_midway_restores_binding_and_releases() {
        let mut ctx = ctx();
        let colors = vec![spec(InternalFormat::Rgb); 2];
        let first = Framebuffer::new(&mut ctx, &desc(colors.clone(), DepthStencilKind::None, 1)).unwrap();
        first.bind(&mut ctx);

        // framebuffer and first color texture succeed, the second texture fails
        ctx.gl_mut().fail_allocation_after(2);
        let err = Framebuffer::new(&mut ctx, &desc(colors, DepthStencilKind::None, 1)).unwrap_err();
        assert!(matches!(err, ResourceError::Allocation { kind: ResourceKind::Texture, .. }));
        assert_eq!(ctx.bound_framebuffer(), Some(first.raw_handle()));

        assert_eq!(ctx.maintain(), 2);
        assert_eq!(ctx.gl().live_count(), 3);
        assert!(ctx.gl().invalid_releases().is_empty());
    }

    #[test]
    fn multisampled_colors_get_no_sampler_state() {
        let mut ctx = ctx();
        let fb = Framebuffer::new(
            &mut ctx,
            &desc(vec![spec(InternalFormat::Rgba16F)], DepthStencilKind::Renderbuffer, 4),
        )
        .unwrap();

        let color = &fb.color_attachments()[0];
        assert_eq!(color.target(), TextureTarget::Texture2DMultisample);
        assert_eq!(color.samples(), 4);
        assert_eq!(ctx.gl().count_calls(|c| matches!(c, Call::TexParameter { .. })), 0);
        let Some(DepthStencilAttachment::Renderbuffer(rb)) = fb.depth_stencil() else {
            panic!("expected a depth-stencil renderbuffer");
        };
        assert_eq!(ctx.gl().renderbuffer_samples(rb.handle()), Some(4));
        assert!(fb.is_complete());
    }

    #[test]
    fn multisampled_depth_texture_warns_and_proceeds() {
        let mut ctx = ctx();
        let fb = Framebuffer::new(
            &mut ctx,
            &desc(vec![spec(InternalFormat::Rgb)], DepthStencilKind::Texture, 4),
        )
        .unwrap();

        assert!(matches!(fb.depth_stencil(), Some(DepthStencilAttachment::Texture(_))));
        assert!(!fb.is_complete());
        assert_eq!(fb.status(), FramebufferStatus::Incomplete(INCOMPLETE_MULTISAMPLE));
        let warnings = ctx.take_warnings();
        assert_eq!(warnings[0], Warning::MultisampledDepthTexture { samples: 4 });
        assert!(matches!(warnings[1], Warning::FramebufferIncomplete { .. }));
    }

    #[test]
    fn single_sample_depth_texture_is_complete() {
        let mut ctx = ctx();
        let fb = Framebuffer::new(
            &mut ctx,
            &desc(vec![spec(InternalFormat::Rgb)], DepthStencilKind::Texture, 1),
        )
        .unwrap();
        let depth = fb.depth_stencil().unwrap();
        assert_eq!(
            ctx.gl().attachment(fb.raw_handle(), Attachment::DepthStencil),
            Some(AttachedObject::Texture(depth.handle()))
        );
        assert!(fb.is_complete());
    }

    #[test]
    fn incomplete_framebuffer_is_still_usable() {
        let mut ctx = ctx();
        ctx.gl_mut().force_incomplete(true);
        let fb = Framebuffer::new(
            &mut ctx,
            &desc(vec![spec(InternalFormat::Rgb)], DepthStencilKind::Renderbuffer, 1),
        )
        .unwrap();
        assert!(!fb.is_complete());
        fb.bind(&mut ctx);
        assert_eq!(ctx.bound_framebuffer(), Some(fb.raw_handle()));
    }

    #[test]
    fn construction_restores_previous_framebuffer() {
        let mut ctx = ctx();
        let a = Framebuffer::new(&mut ctx, &desc(vec![spec(InternalFormat::Rgb)], DepthStencilKind::None, 1)).unwrap();
        a.bind(&mut ctx);
        let _b = Framebuffer::new(&mut ctx, &desc(vec![spec(InternalFormat::Rgb)], DepthStencilKind::None, 1)).unwrap();
        assert_eq!(ctx.bound_framebuffer(), Some(a.raw_handle()));
        assert_eq!(ctx.gl().bound_framebuffer(), Some(a.raw_handle()));
    }

    #[test]
    fn color_buffer_index_is_checked() {
        let mut ctx = ctx();
        let fb = Framebuffer::new(&mut ctx, &desc(vec![spec(InternalFormat::Rgb); 2], DepthStencilKind::None, 1))
            .unwrap();

        assert!(fb.bind_color_buffer_as_texture(&mut ctx, 0, 1));
        assert_eq!(ctx.bound_texture(0, TextureTarget::Texture2D), Some(fb.color_attachments()[1].handle()));

        assert!(!fb.bind_color_buffer_as_texture(&mut ctx, 0, 2));
        assert_eq!(ctx.take_warnings(), vec![Warning::AttachmentIndexOutOfRange { index: 2, count: 2 }]);
    }

    #[test]
    fn destroy_releases_every_attachment_once() {
        let mut ctx = ctx();
        let fb = Framebuffer::new(
            &mut ctx,
            &desc(vec![spec(InternalFormat::Rgba16F); 3], DepthStencilKind::Renderbuffer, 1),
        )
        .unwrap();
        let created: Vec<_> = ctx.gl().created().iter().map(|(_, h)| *h).collect();
        assert_eq!(created.len(), 5);
        fb.bind(&mut ctx);

        ctx.destroy(fb);

        for handle in created {
            assert_eq!(ctx.gl().release_count(handle), 1);
        }
        assert_eq!(ctx.gl().live_count(), 0);
        assert_eq!(ctx.bound_framebuffer(), None);
        assert!(ctx.gl().invalid_releases().is_empty());
    }
}
