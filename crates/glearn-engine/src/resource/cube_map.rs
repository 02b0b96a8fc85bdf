use std::path::Path;

use crate::context::{GpuHandle, GpuResource, RenderContext, Warning};
use crate::error::ResourceResult;
use crate::gl::{
    ComponentType, CubeFace, Filter, GlApi, ImageDesc, ImageTarget, InternalFormat, PixelFormat,
    RawHandle, ResourceKind, TexParam, TextureTarget, Wrap,
};

use super::decoded::DecodedImage;
use super::texture::{SetupBinding, check_pixels, upload_packed};

/// Six-face environment texture (skyboxes, reflections).
#[derive(Debug)]
pub struct CubeMap {
    handle: GpuHandle,
    loaded: [bool; 6],
}

impl CubeMap {
    /// Loads `dir/<name>` for each face in +X, -X, +Y, -Y, +Z, -Z order.
    ///
    /// Faces are not flipped. A face that cannot be read is left undefined and
    /// reported as a warning; the cube map is still created.
    pub fn from_face_files<G: GlApi>(
        ctx: &mut RenderContext<G>,
        dir: impl AsRef<Path>,
        faces: [&str; 6],
    ) -> ResourceResult<Self> {
        let dir = dir.as_ref();
        let images = faces.map(|name| {
            let path = dir.join(name);
            match DecodedImage::open_rgb(&path) {
                Ok(image) => Some(image),
                Err(reason) => {
                    ctx.warn(Warning::ImageLoadFailed { path, reason });
                    None
                }
            }
        });
        Self::from_faces(ctx, &images)
    }

    /// Uploads decoded faces (ordered like [`CubeFace::ALL`]); `None` faces stay undefined.
    ///
    /// RGB faces are stored as RGB and RGBA faces as RGBA. A face with any other
    /// channel count records a warning and stays undefined. An empty face or one
    /// whose pixels are shorter than its size is fatal and nothing is allocated.
    pub fn from_faces<G: GlApi>(
        ctx: &mut RenderContext<G>,
        faces: &[Option<DecodedImage>; 6],
    ) -> ResourceResult<Self> {
        for image in faces.iter().flatten() {
            check_pixels(image.width, image.height, image.byte_len(), Some(image.pixels.len()))?;
        }

        let handle = ctx.create(ResourceKind::Texture)?;
        let target = TextureTarget::CubeMap;
        let setup = SetupBinding::begin(ctx, target, handle.raw());

        let mut loaded = [false; 6];
        for ((face, image), slot) in CubeFace::ALL.iter().zip(faces).zip(loaded.iter_mut()) {
            let Some(image) = image else { continue };
            let (internal_format, format) = match image.channels {
                3 => (InternalFormat::Rgb, PixelFormat::Rgb),
                4 => (InternalFormat::Rgba, PixelFormat::Rgba),
                channels => {
                    ctx.warn(Warning::UnsupportedChannelCount { source: format!("cube face {face:?}"), channels });
                    continue;
                }
            };
            let desc = ImageDesc {
                width: image.width,
                height: image.height,
                internal_format,
                format,
                component_type: ComponentType::UnsignedByte,
            };
            upload_packed(ctx.gl_mut(), ImageTarget::CubeFace(*face), &desc, Some(&image.pixels));
            *slot = true;
        }

        let gl = ctx.gl_mut();
        gl.tex_parameter(target, TexParam::MagFilter(Filter::Linear));
        gl.tex_parameter(target, TexParam::MinFilter(Filter::Linear));
        gl.tex_parameter(target, TexParam::WrapS(Wrap::ClampToEdge));
        gl.tex_parameter(target, TexParam::WrapT(Wrap::ClampToEdge));
        gl.tex_parameter(target, TexParam::WrapR(Wrap::ClampToEdge));
        setup.end(ctx);

        let count = loaded.iter().filter(|l| **l).count();
        log::debug!("cube map {} created ({count}/6 faces)", handle.raw());
        Ok(Self { handle, loaded })
    }

    pub fn bind<G: GlApi>(&self, ctx: &mut RenderContext<G>, unit: u32) -> bool {
        ctx.bind_texture_unit(unit, TextureTarget::CubeMap, Some(self.handle.raw()))
    }

    pub fn unbind<G: GlApi>(&self, ctx: &mut RenderContext<G>, unit: u32) -> bool {
        ctx.bind_texture_unit(unit, TextureTarget::CubeMap, None)
    }

    pub fn is_face_loaded(&self, face: CubeFace) -> bool {
        CubeFace::ALL
            .iter()
            .position(|f| *f == face)
            .is_some_and(|i| self.loaded[i])
    }

    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle.raw()
    }
}

impl GpuResource for CubeMap {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle.raw()
    }
}
