//! Backend-neutral vocabulary for the native calls issued by the resource layer.
//!
//! Every enum here maps one-to-one onto a GL constant in the glow backend.
//! Only the values the wrappers actually issue are modelled.

use std::fmt;
use std::num::NonZeroU32;

/// Opaque native object id assigned by the driver.
///
/// Zero is never a valid id; "nothing bound" is spelled `Option::<RawHandle>::None`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RawHandle(NonZeroU32);

impl RawHandle {
    #[inline]
    pub const fn new(id: NonZeroU32) -> Self {
        Self(id)
    }

    /// Returns `None` for the reserved zero id.
    #[inline]
    pub fn from_u32(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    #[inline]
    pub const fn get(self) -> NonZeroU32 {
        self.0
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Capability tag of a native object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Buffer,
    VertexArray,
    Texture,
    Renderbuffer,
    Framebuffer,
    Program,
    Shader,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::VertexArray => "vertex array",
            ResourceKind::Texture => "texture",
            ResourceKind::Renderbuffer => "renderbuffer",
            ResourceKind::Framebuffer => "framebuffer",
            ResourceKind::Program => "program",
            ResourceKind::Shader => "shader",
        };
        f.write_str(name)
    }
}

// ── buffers ───────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
    Uniform,
}

impl BufferTarget {
    pub const ALL: [BufferTarget; 3] = [
        BufferTarget::Array,
        BufferTarget::ElementArray,
        BufferTarget::Uniform,
    ];
}

/// Driver hint describing how often buffer contents change.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

// ── vertex input ──────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    Float,
    /// Packed 24-bit depth + 8-bit stencil.
    UnsignedInt24_8,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u32 {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort | ComponentType::HalfFloat => 2,
            ComponentType::Int
            | ComponentType::UnsignedInt
            | ComponentType::Float
            | ComponentType::UnsignedInt24_8 => 4,
        }
    }
}

/// How the bytes of the bound array buffer feed one shader input slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    pub slot: u32,
    /// Components per vertex, 1..=4.
    pub components: u32,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
    /// 0 advances per vertex, N > 0 advances once every N instances.
    pub divisor: u32,
}

impl VertexAttribute {
    /// Tightly described float attribute advancing per vertex.
    pub const fn floats(slot: u32, components: u32, stride: u32, offset: u32) -> Self {
        Self {
            slot,
            components,
            component_type: ComponentType::Float,
            normalized: false,
            stride,
            offset,
            divisor: 0,
        }
    }

    pub const fn with_divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    /// Whether the shader input receives integers rather than floats: an
    /// integer component type that is not normalized.
    pub const fn is_integer(&self) -> bool {
        !self.normalized
            && matches!(
                self.component_type,
                ComponentType::Byte
                    | ComponentType::UnsignedByte
                    | ComponentType::Short
                    | ComponentType::UnsignedShort
                    | ComponentType::Int
                    | ComponentType::UnsignedInt
            )
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawMode {
    Points,
    Lines,
    Triangles,
    TriangleStrip,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IndexType {
    UnsignedShort,
    UnsignedInt,
}

// ── textures ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureTarget {
    Texture2D,
    Texture2DMultisample,
    CubeMap,
}

impl TextureTarget {
    pub const ALL: [TextureTarget; 3] = [
        TextureTarget::Texture2D,
        TextureTarget::Texture2DMultisample,
        TextureTarget::CubeMap,
    ];
}

/// Cube map faces in the order the driver enumerates them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// +X, -X, +Y, -Y, +Z, -Z (right, left, top, bottom, back, front).
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];
}

/// Destination of a 2-D image upload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageTarget {
    Texture2D,
    CubeFace(CubeFace),
}

/// Storage format requested from the driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InternalFormat {
    Red,
    R8,
    R16F,
    R32F,
    Rg16F,
    Rgb,
    Rgb8,
    Rgb16F,
    Rgb32F,
    Srgb,
    Rgba,
    Rgba8,
    Rgba16F,
    Rgba32F,
    SrgbAlpha,
    DepthComponent,
    Depth24Stencil8,
}

impl InternalFormat {
    /// `true` for half- and single-precision float formats.
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            InternalFormat::R16F
                | InternalFormat::R32F
                | InternalFormat::Rg16F
                | InternalFormat::Rgb16F
                | InternalFormat::Rgb32F
                | InternalFormat::Rgba16F
                | InternalFormat::Rgba32F
        )
    }

    /// Channel count of the format's color data (depth formats report 1).
    pub const fn channels(self) -> u8 {
        match self {
            InternalFormat::Red
            | InternalFormat::R8
            | InternalFormat::R16F
            | InternalFormat::R32F
            | InternalFormat::DepthComponent
            | InternalFormat::Depth24Stencil8 => 1,
            InternalFormat::Rg16F => 2,
            InternalFormat::Rgb
            | InternalFormat::Rgb8
            | InternalFormat::Rgb16F
            | InternalFormat::Rgb32F
            | InternalFormat::Srgb => 3,
            InternalFormat::Rgba
            | InternalFormat::Rgba8
            | InternalFormat::Rgba16F
            | InternalFormat::Rgba32F
            | InternalFormat::SrgbAlpha => 4,
        }
    }
}

/// Layout of client-side pixel data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PixelFormat {
    Red,
    Rg,
    Rgb,
    Rgba,
    DepthComponent,
    DepthStencil,
}

impl PixelFormat {
    pub const fn channels(self) -> u32 {
        match self {
            PixelFormat::Red | PixelFormat::DepthComponent | PixelFormat::DepthStencil => 1,
            PixelFormat::Rg => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Filter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Wrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// A single sampler parameter applied to the texture bound on the active unit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TexParam {
    MinFilter(Filter),
    MagFilter(Filter),
    WrapS(Wrap),
    WrapT(Wrap),
    WrapR(Wrap),
    BorderColor([f32; 4]),
}

/// Full description of one level-0 image upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub internal_format: InternalFormat,
    pub format: PixelFormat,
    pub component_type: ComponentType,
}

// ── framebuffers ──────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Attachment {
    Color(u32),
    Depth,
    DepthStencil,
}

/// Entry of a draw/read buffer list.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorBuffer {
    None,
    Color(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramebufferStatus {
    Complete,
    /// Raw status code reported by the driver.
    Incomplete(u32),
}

impl FramebufferStatus {
    pub const fn is_complete(self) -> bool {
        matches!(self, FramebufferStatus::Complete)
    }
}

// ── programs ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);

/// Value written by one uniform call. Matrices are column-major.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}
