use std::path::Path;

use crate::context::{GpuHandle, GpuResource, RenderContext, Warning};
use crate::error::{ResourceError, ResourceResult};
use crate::gl::{
    ComponentType, Filter, GlApi, ImageDesc, ImageTarget, InternalFormat, PixelFormat, RawHandle,
    ResourceKind, TexParam, TextureTarget, Wrap,
};

use super::decoded::DecodedImage;

/// Sampler state applied to a raw texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sampling {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap: Wrap,
    pub mipmaps: bool,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            wrap: Wrap::Repeat,
            mipmaps: false,
        }
    }
}

impl Sampling {
    /// Linear filtering, clamped to the edge, no mipmaps.
    pub const fn linear_clamped() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap: Wrap::ClampToEdge,
            mipmaps: false,
        }
    }
}

/// Description of a texture uploaded from caller-provided bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawTextureDesc {
    pub width: u32,
    pub height: u32,
    pub internal_format: InternalFormat,
    pub format: PixelFormat,
    pub component_type: ComponentType,
    pub sampling: Sampling,
}

impl RawTextureDesc {
    fn image_desc(&self) -> ImageDesc {
        ImageDesc {
            width: self.width,
            height: self.height,
            internal_format: self.internal_format,
            format: self.format,
            component_type: self.component_type,
        }
    }

    /// Bytes needed for a tightly packed image of this description.
    fn byte_len(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.format.channels() as usize
            * self.component_type.size() as usize
    }
}

/// Temporarily binds a texture on the active unit while it is being set up.
pub(crate) struct SetupBinding {
    unit: u32,
    target: TextureTarget,
    previous: Option<RawHandle>,
}

impl SetupBinding {
    pub(crate) fn begin<G: GlApi>(ctx: &mut RenderContext<G>, target: TextureTarget, texture: RawHandle) -> Self {
        let unit = ctx.active_texture_unit();
        let previous = ctx.bound_texture(unit, target);
        ctx.bind_texture_unit(unit, target, Some(texture));
        Self { unit, target, previous }
    }

    pub(crate) fn end<G: GlApi>(self, ctx: &mut RenderContext<G>) {
        ctx.bind_texture_unit(self.unit, self.target, self.previous);
    }
}

/// A sampled 2-D image (or a framebuffer attachment exposed as one).
#[derive(Debug)]
pub struct Texture {
    handle: GpuHandle,
    target: TextureTarget,
    width: u32,
    height: u32,
    internal_format: Option<InternalFormat>,
    samples: u32,
}

impl Texture {
    /// Loads and decodes `path` (flipped vertically), then uploads it with mipmaps.
    ///
    /// A missing or undecodable file is fatal.
    pub fn from_image_file<G: GlApi>(
        ctx: &mut RenderContext<G>,
        path: impl AsRef<Path>,
        gamma: bool,
    ) -> ResourceResult<Self> {
        let path = path.as_ref();
        let image = DecodedImage::open(path, true)
            .map_err(|reason| ResourceError::Image { path: path.to_path_buf(), reason })?;
        Self::upload_decoded(ctx, &image, gamma, &path.display().to_string())
    }

    /// Uploads an already decoded image.
    ///
    /// 3 channels map to RGB (sRGB with `gamma`) and repeat wrapping, 4 channels
    /// to RGBA (sRGB-alpha with `gamma`) and edge clamping. Any other channel
    /// count records a warning; the texture exists but holds no image.
    pub fn from_image<G: GlApi>(ctx: &mut RenderContext<G>, image: &DecodedImage, gamma: bool) -> ResourceResult<Self> {
        Self::upload_decoded(ctx, image, gamma, "decoded image")
    }

    fn upload_decoded<G: GlApi>(
        ctx: &mut RenderContext<G>,
        image: &DecodedImage,
        gamma: bool,
        source: &str,
    ) -> ResourceResult<Self> {
        let layout = match (image.channels, gamma) {
            (3, false) => Some((InternalFormat::Rgb, PixelFormat::Rgb, Wrap::Repeat)),
            (3, true) => Some((InternalFormat::Srgb, PixelFormat::Rgb, Wrap::Repeat)),
            (4, false) => Some((InternalFormat::Rgba, PixelFormat::Rgba, Wrap::ClampToEdge)),
            (4, true) => Some((InternalFormat::SrgbAlpha, PixelFormat::Rgba, Wrap::ClampToEdge)),
            _ => None,
        };

        check_pixels(image.width, image.height, image.byte_len(), Some(image.pixels.len()))?;

        let handle = ctx.create(ResourceKind::Texture)?;
        let setup = SetupBinding::begin(ctx, TextureTarget::Texture2D, handle.raw());

        let target = TextureTarget::Texture2D;
        let gl = ctx.gl_mut();
        if let Some((_, _, wrap)) = layout {
            gl.tex_parameter(target, TexParam::WrapS(wrap));
            gl.tex_parameter(target, TexParam::WrapT(wrap));
        }
        gl.tex_parameter(target, TexParam::MinFilter(Filter::LinearMipmapLinear));
        gl.tex_parameter(target, TexParam::MagFilter(Filter::Linear));

        let internal_format = match layout {
            Some((internal_format, format, _)) => {
                let desc = ImageDesc {
                    width: image.width,
                    height: image.height,
                    internal_format,
                    format,
                    component_type: ComponentType::UnsignedByte,
                };
                upload_packed(gl, ImageTarget::Texture2D, &desc, Some(&image.pixels));
                gl.generate_mipmap(target);
                Some(internal_format)
            }
            None => {
                ctx.warn(Warning::UnsupportedChannelCount {
                    source: source.to_string(),
                    channels: image.channels,
                });
                None
            }
        };
        setup.end(ctx);

        log::debug!(
            "texture {} created from {source} ({}x{}, {} channels)",
            handle.raw(),
            image.width,
            image.height,
            image.channels
        );
        Ok(Self {
            handle,
            target,
            width: image.width,
            height: image.height,
            internal_format,
            samples: 0,
        })
    }

    /// Uploads caller-provided bytes (or allocates uninitialized storage for `None`).
    pub fn from_raw<G: GlApi>(
        ctx: &mut RenderContext<G>,
        desc: &RawTextureDesc,
        data: Option<&[u8]>,
    ) -> ResourceResult<Self> {
        check_pixels(desc.width, desc.height, desc.byte_len(), data.map(<[u8]>::len))?;

        let handle = ctx.create(ResourceKind::Texture)?;
        let target = TextureTarget::Texture2D;
        let setup = SetupBinding::begin(ctx, target, handle.raw());
        let gl = ctx.gl_mut();
        upload_packed(gl, ImageTarget::Texture2D, &desc.image_desc(), data);
        apply_sampling(gl, target, &desc.sampling);
        if desc.sampling.mipmaps {
            gl.generate_mipmap(target);
        }
        setup.end(ctx);

        log::debug!("texture {} created ({}x{} {:?})", handle.raw(), desc.width, desc.height, desc.internal_format);
        Ok(Self {
            handle,
            target,
            width: desc.width,
            height: desc.height,
            internal_format: Some(desc.internal_format),
            samples: 0,
        })
    }

    /// Wraps storage allocated elsewhere in this crate (framebuffer attachments).
    pub(crate) fn from_parts(
        handle: GpuHandle,
        target: TextureTarget,
        width: u32,
        height: u32,
        internal_format: InternalFormat,
        samples: u32,
    ) -> Self {
        Self { handle, target, width, height, internal_format: Some(internal_format), samples }
    }

    /// Binds on `unit` (0..texture_units). Out of range records a warning and returns `false`.
    pub fn bind<G: GlApi>(&self, ctx: &mut RenderContext<G>, unit: u32) -> bool {
        ctx.bind_texture_unit(unit, self.target, Some(self.handle.raw()))
    }

    pub fn unbind<G: GlApi>(&self, ctx: &mut RenderContext<G>, unit: u32) -> bool {
        ctx.bind_texture_unit(unit, self.target, None)
    }

    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle.raw()
    }

    #[inline]
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `None` when no image was uploaded.
    #[inline]
    pub fn internal_format(&self) -> Option<InternalFormat> {
        self.internal_format
    }

    /// Sample count of multisampled storage, 0 otherwise.
    #[inline]
    pub fn samples(&self) -> u32 {
        self.samples
    }
}

impl GpuResource for Texture {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle.raw()
    }
}

/// Rejects empty images and pixel data shorter than `required` bytes.
pub(crate) fn check_pixels(width: u32, height: u32, required: usize, supplied: Option<usize>) -> ResourceResult<()> {
    if width == 0 || height == 0 {
        return Err(ResourceError::InvalidDimensions { width, height, samples: 1 });
    }
    match supplied {
        Some(len) if len < required => Err(ResourceError::InvalidSize { size: required, data_len: Some(len) }),
        _ => Ok(()),
    }
}

/// Uploads tightly packed rows, then restores the default unpack alignment of 4.
pub(crate) fn upload_packed<G: GlApi>(gl: &mut G, target: ImageTarget, desc: &ImageDesc, data: Option<&[u8]>) {
    gl.set_unpack_alignment(1);
    gl.tex_image_2d(target, desc, data);
    gl.set_unpack_alignment(4);
}

pub(crate) fn apply_sampling<G: GlApi>(gl: &mut G, target: TextureTarget, sampling: &Sampling) {
    gl.tex_parameter(target, TexParam::MinFilter(sampling.min_filter));
    gl.tex_parameter(target, TexParam::MagFilter(sampling.mag_filter));
    gl.tex_parameter(target, TexParam::WrapS(sampling.wrap));
    gl.tex_parameter(target, TexParam::WrapT(sampling.wrap));
}
