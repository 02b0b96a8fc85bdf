use std::fmt;
use std::path::PathBuf;

use crate::gl::{ResourceKind, ShaderStage};

/// Fatal failure of a resource operation.
///
/// Returned by constructors and by the few mutating operations that can be
/// rejected up front. Recoverable conditions go to the context's warning
/// channel instead (see [`crate::context::Warning`]).
#[derive(Debug)]
pub enum ResourceError {
    /// The driver refused to create a native object.
    Allocation { kind: ResourceKind, reason: String },
    /// A source file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// An image file could not be opened or decoded.
    Image { path: PathBuf, reason: String },
    InvalidDimensions { width: u32, height: u32, samples: u32 },
    /// Buffer size is zero or disagrees with the initial data length, or pixel
    /// data is shorter than the image it describes.
    InvalidSize { size: usize, data_len: Option<usize> },
    UpdateOutOfRange { offset: usize, len: usize, size: usize },
    RangeOutOfBounds { offset: usize, len: usize, size: usize },
    NoArrayBufferBound { slot: u32 },
    AttributeSlotOutOfRange { slot: u32, max: u32 },
    InvalidAttribute { slot: u32, components: u32 },
    ColorAttachmentCount { requested: usize, max: usize },
    ShaderCompile { stage: ShaderStage, log: String },
    ProgramLink { log: String },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Allocation { kind, reason } => {
                write!(f, "failed to allocate {kind}: {reason}")
            }
            ResourceError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ResourceError::Image { path, reason } => {
                write!(f, "failed to load image {}: {reason}", path.display())
            }
            ResourceError::InvalidDimensions { width, height, samples } => {
                write!(f, "invalid dimensions {width}x{height} with {samples} sample(s)")
            }
            ResourceError::InvalidSize { size, data_len: Some(len) } => {
                write!(f, "expected {size} bytes but initial data length is {len}")
            }
            ResourceError::InvalidSize { size, data_len: None } => {
                write!(f, "invalid buffer size {size}")
            }
            ResourceError::UpdateOutOfRange { offset, len, size } => {
                write!(f, "update of {len} bytes at offset {offset} exceeds buffer size {size}")
            }
            ResourceError::RangeOutOfBounds { offset, len, size } => {
                write!(f, "range [{offset}, {offset}+{len}) exceeds buffer size {size}")
            }
            ResourceError::NoArrayBufferBound { slot } => {
                write!(f, "no array buffer bound while configuring attribute {slot}")
            }
            ResourceError::AttributeSlotOutOfRange { slot, max } => {
                write!(f, "attribute slot {slot} out of range (max {max})")
            }
            ResourceError::InvalidAttribute { slot, components } => {
                write!(f, "attribute {slot} has {components} components (expected 1..=4)")
            }
            ResourceError::ColorAttachmentCount { requested, max } => {
                write!(f, "{requested} color attachments requested (expected 1..={max})")
            }
            ResourceError::ShaderCompile { stage, log } => {
                write!(f, "{stage} shader failed to compile: {log}")
            }
            ResourceError::ProgramLink { log } => write!(f, "program failed to link: {log}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_stage_and_log() {
        let err = ResourceError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:3: syntax error".into(),
        };
        assert_eq!(err.to_string(), "fragment shader failed to compile: 0:3: syntax error");
    }

    #[test]
    fn io_error_exposes_source() {
        use std::error::Error;
        let err = ResourceError::Io {
            path: PathBuf::from("shaders/missing.vert"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("shaders/missing.vert"));
    }

    #[test]
    fn invalid_size_distinguishes_mismatch() {
        let zero = ResourceError::InvalidSize { size: 0, data_len: None };
        let mismatch = ResourceError::InvalidSize { size: 16, data_len: Some(8) };
        assert_eq!(zero.to_string(), "invalid buffer size 0");
        assert!(mismatch.to_string().contains("initial data length 8"));
    }
}
