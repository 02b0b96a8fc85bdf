use crate::context::{GpuHandle, GpuResource, RenderContext, Warning};
use crate::error::{ResourceError, ResourceResult};
use crate::gl::{
    Attachment, ColorBuffer, ComponentType, CubeFace, Filter, FramebufferStatus, GlApi, ImageDesc,
    ImageTarget, InternalFormat, PixelFormat, RawHandle, ResourceKind, TexParam, TextureTarget, Wrap,
};

use super::texture::{SetupBinding, Texture};

/// Planar maps serve directional/spot shadows, cube maps serve point lights.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DepthMapKind {
    Planar,
    Cube,
}

/// Depth-only render target for shadow mapping.
///
/// Planar maps clamp to a white border so lookups outside the light frustum
/// read as fully lit.
#[derive(Debug)]
pub struct DepthMap {
    // Field order is release order: the framebuffer goes before its attachment.
    framebuffer: GpuHandle,
    depth: Texture,
    kind: DepthMapKind,
    status: FramebufferStatus,
}

pub const DEPTH_BORDER_COLOR: [f32; 4] = [1.0; 4];

impl DepthMap {
    pub fn new<G: GlApi>(
        ctx: &mut RenderContext<G>,
        width: u32,
        height: u32,
        kind: DepthMapKind,
    ) -> ResourceResult<Self> {
        if width == 0 || height == 0 {
            return Err(ResourceError::InvalidDimensions { width, height, samples: 1 });
        }

        let framebuffer = ctx.create(ResourceKind::Framebuffer)?;
        let texture = ctx.create(ResourceKind::Texture)?;
        let depth_raw = texture.raw();

        let previous = ctx.bound_framebuffer();
        ctx.bind_framebuffer(Some(framebuffer.raw()));

        let desc = ImageDesc {
            width,
            height,
            internal_format: InternalFormat::DepthComponent,
            format: PixelFormat::DepthComponent,
            component_type: ComponentType::Float,
        };

        let target = match kind {
            DepthMapKind::Planar => TextureTarget::Texture2D,
            DepthMapKind::Cube => TextureTarget::CubeMap,
        };
        let setup = SetupBinding::begin(ctx, target, depth_raw);
        let gl = ctx.gl_mut();
        gl.tex_parameter(target, TexParam::MinFilter(Filter::Nearest));
        gl.tex_parameter(target, TexParam::MagFilter(Filter::Nearest));
        match kind {
            DepthMapKind::Planar => {
                gl.tex_image_2d(ImageTarget::Texture2D, &desc, None);
                gl.tex_parameter(target, TexParam::WrapS(Wrap::ClampToBorder));
                gl.tex_parameter(target, TexParam::WrapT(Wrap::ClampToBorder));
                gl.tex_parameter(target, TexParam::BorderColor(DEPTH_BORDER_COLOR));
                gl.framebuffer_texture_2d(Attachment::Depth, target, depth_raw);
            }
            DepthMapKind::Cube => {
                for face in CubeFace::ALL {
                    gl.tex_image_2d(ImageTarget::CubeFace(face), &desc, None);
                }
                gl.tex_parameter(target, TexParam::WrapS(Wrap::ClampToEdge));
                gl.tex_parameter(target, TexParam::WrapT(Wrap::ClampToEdge));
                gl.tex_parameter(target, TexParam::WrapR(Wrap::ClampToEdge));
                gl.framebuffer_texture(Attachment::Depth, depth_raw);
            }
        }

        // No color output at all.
        gl.draw_buffers(&[ColorBuffer::None]);
        gl.read_buffer(ColorBuffer::None);

        let status = gl.check_framebuffer_status();
        setup.end(ctx);
        if let FramebufferStatus::Incomplete(code) = status {
            ctx.warn(Warning::FramebufferIncomplete { framebuffer: framebuffer.raw(), status: code });
        }
        ctx.bind_framebuffer(previous);

        log::debug!("{kind:?} depth map {} created ({width}x{height})", framebuffer.raw());
        let depth = Texture::from_parts(texture, target, width, height, InternalFormat::DepthComponent, 0);
        Ok(Self { framebuffer, depth, kind, status })
    }

    pub fn bind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_framebuffer(Some(self.framebuffer.raw()));
    }

    pub fn unbind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_framebuffer(None);
    }

    /// Binds the depth texture for sampling on `unit` (0..texture_units).
    pub fn bind_depth_buffer_as_texture<G: GlApi>(&self, ctx: &mut RenderContext<G>, unit: u32) -> bool {
        self.depth.bind(ctx, unit)
    }

    pub fn depth_texture(&self) -> &Texture {
        &self.depth
    }

    pub fn kind(&self) -> DepthMapKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.depth.width()
    }

    pub fn height(&self) -> u32 {
        self.depth.height()
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    #[inline]
    pub fn raw_handle(&self) -> RawHandle {
        self.framebuffer.raw()
    }
}

impl GpuResource for DepthMap {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Framebuffer
    }

    fn raw_handle(&self) -> RawHandle {
        self.framebuffer.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use crate::gl::MockGl;
    use crate::gl::mock::{AttachedObject, Call};

    fn ctx() -> RenderContext<MockGl> {
        RenderContext::new(MockGl::new(), ContextConfig::default())
    }

    #[test]
    fn planar_border_reads_as_fully_lit() {
        let mut ctx = ctx();
        let map = DepthMap::new(&mut ctx, 1024, 1024, DepthMapKind::Planar).unwrap();
        let record = ctx.gl().texture(map.depth_texture().handle()).unwrap();

        assert_eq!(record.border_color(), Some([1.0, 1.0, 1.0, 1.0]));
        assert!(record.has_param(TexParam::WrapS(Wrap::ClampToBorder)));
        assert!(record.has_param(TexParam::WrapT(Wrap::ClampToBorder)));
        assert!(record.has_param(TexParam::MinFilter(Filter::Nearest)));
        assert!(map.is_complete());
    }

    #[test]
    fn planar_has_no_color_output() {
        let mut ctx = ctx();
        let map = DepthMap::new(&mut ctx, 512, 512, DepthMapKind::Planar).unwrap();
        let calls = ctx.gl().calls();
        assert!(calls.contains(&Call::DrawBuffers(vec![ColorBuffer::None])));
        assert!(calls.contains(&Call::ReadBuffer(ColorBuffer::None)));
        assert_eq!(
            ctx.gl().attachment(map.raw_handle(), Attachment::Depth),
            Some(AttachedObject::Texture(map.depth_texture().handle()))
        );
    }

    #[test]
    fn cube_allocates_six_faces_as_layered_attachment() {
        let mut ctx = ctx();
        let map = DepthMap::new(&mut ctx, 256, 256, DepthMapKind::Cube).unwrap();
        let record = ctx.gl().texture(map.depth_texture().handle()).unwrap();

        assert_eq!(record.images.len(), 6);
        assert!(record.has_param(TexParam::WrapR(Wrap::ClampToEdge)));
        assert_eq!(record.border_color(), None);
        assert_eq!(ctx.gl().count_calls(|c| matches!(c, Call::FramebufferTexture { .. })), 1);
        assert!(map.is_complete());
    }

    #[test]
    fn construction_restores_previous_framebuffer() {
        let mut ctx = ctx();
        let first = DepthMap::new(&mut ctx, 64, 64, DepthMapKind::Planar).unwrap();
        first.bind(&mut ctx);
        let _second = DepthMap::new(&mut ctx, 64, 64, DepthMapKind::Cube).unwrap();
        assert_eq!(ctx.bound_framebuffer(), Some(first.raw_handle()));
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut ctx = ctx();
        assert!(DepthMap::new(&mut ctx, 0, 64, DepthMapKind::Planar).is_err());
        assert!(ctx.gl().created().is_empty());
    }

    #[test]
    fn incomplete_is_reported_as_warning() {
        let mut ctx = ctx();
        ctx.gl_mut().force_incomplete(true);
        let map = DepthMap::new(&mut ctx, 64, 64, DepthMapKind::Planar).unwrap();
        assert!(!map.is_complete());
        assert!(matches!(ctx.take_warnings().as_slice(), [Warning::FramebufferIncomplete { .. }]));
    }

    #[test]
    fn destroy_releases_framebuffer_and_texture_once() {
        let mut ctx = ctx();
        let map = DepthMap::new(&mut ctx, 64, 64, DepthMapKind::Planar).unwrap();
        let fb = map.raw_handle();
        let tex = map.depth_texture().handle();
        map.bind_depth_buffer_as_texture(&mut ctx, 2);

        ctx.destroy(map);

        assert_eq!(ctx.gl().release_count(fb), 1);
        assert_eq!(ctx.gl().release_count(tex), 1);
        assert_eq!(ctx.gl().live_count(), 0);
        assert_eq!(ctx.bound_texture(2, TextureTarget::Texture2D), None);
    }
}
