//! Scene helpers for the glearn sandbox: a fly-through camera, shared texture
//! cache, indexed meshes, placed objects and models, and bitmap-font text
//! rendering.
//!
//! Everything draws through a `glearn_engine::RenderContext`, so the same code
//! runs against the live glow backend and the recording mock.

pub mod camera;
pub mod mesh;
pub mod model;
pub mod object;
pub mod text;
pub mod texture_cache;

pub use camera::{Camera, CameraConfig, Direction, MouseLook};
pub use mesh::{MaterialKind, Mesh, MeshTexture, Vertex};
pub use model::{ImportedMesh, Model};
pub use object::Object;
pub use text::{DEFAULT_PIXEL_SIZE, GLYPH_UNIT, GlyphBitmap, TextRenderer, glyph_quad};
pub use texture_cache::TextureCache;
