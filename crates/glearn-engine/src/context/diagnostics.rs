use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

use crate::gl::RawHandle;

/// A recoverable problem. The operation that raised it carried on.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    TextureUnitOutOfRange { unit: u32, units: u32 },
    UniformNotFound { program: RawHandle, name: String },
    UniformBlockNotFound { program: RawHandle, name: String },
    /// Decoded image has a channel count with no texture mapping; nothing was uploaded.
    UnsupportedChannelCount { source: String, channels: u8 },
    ImageLoadFailed { path: PathBuf, reason: String },
    FramebufferIncomplete { framebuffer: RawHandle, status: u32 },
    /// Depth-stencil textures are single-sample; the framebuffer is likely incomplete.
    MultisampledDepthTexture { samples: u32 },
    AttachmentIndexOutOfRange { index: usize, count: usize },
    GlyphMissing { ch: char },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::TextureUnitOutOfRange { unit, units } => {
                write!(f, "texture unit {unit} out of range (0..{units})")
            }
            Warning::UniformNotFound { program, name } => {
                write!(f, "uniform `{name}` not found in program {program}")
            }
            Warning::UniformBlockNotFound { program, name } => {
                write!(f, "uniform block `{name}` not found in program {program}")
            }
            Warning::UnsupportedChannelCount { source, channels } => {
                write!(f, "{source}: unsupported channel count {channels}")
            }
            Warning::ImageLoadFailed { path, reason } => {
                write!(f, "failed to load {}: {reason}", path.display())
            }
            Warning::FramebufferIncomplete { framebuffer, status } => {
                write!(f, "framebuffer {framebuffer} incomplete (status 0x{status:04X})")
            }
            Warning::MultisampledDepthTexture { samples } => {
                write!(f, "depth-stencil texture requested with {samples} samples")
            }
            Warning::AttachmentIndexOutOfRange { index, count } => {
                write!(f, "color attachment {index} out of range ({count} attached)")
            }
            Warning::GlyphMissing { ch } => write!(f, "no glyph for {ch:?}"),
        }
    }
}

/// Bounded warning channel. Every warning is logged when it is recorded.
#[derive(Debug)]
pub(crate) struct Diagnostics {
    warnings: VecDeque<Warning>,
    capacity: usize,
}

impl Diagnostics {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            warnings: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        if self.warnings.len() == self.capacity {
            self.warnings.pop_front();
        }
        self.warnings.push_back(warning);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    pub(crate) fn take(&mut self) -> Vec<Warning> {
        self.warnings.drain(..).collect()
    }
}
