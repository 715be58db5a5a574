//! Render request model.

use std::path::{Path, PathBuf};

use burnsub_subtitle_model::Subtitle;

/// Round an odd dimension up to the next even value.
///
/// Chroma-subsampled pixel formats (yuv420p) cannot encode odd widths or
/// heights.
pub fn even_dimension(value: u32) -> u32 {
    if value % 2 == 1 {
        value.checked_add(1).unwrap_or(value - 1)
    } else {
        value
    }
}

/// Everything one render invocation needs. Immutable once built.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    source_path: PathBuf,
    subtitle: Subtitle,
    output_path: PathBuf,
    width: u32,
    height: u32,
    font_size: Option<u32>,
    total_frames: u64,
}

impl RenderRequest {
    /// Build a request. Odd target dimensions are rounded up by one.
    pub fn new(
        source_path: impl Into<PathBuf>,
        subtitle: Subtitle,
        output_path: impl Into<PathBuf>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            subtitle,
            output_path: output_path.into(),
            width: even_dimension(width),
            height: even_dimension(height),
            font_size: None,
            total_frames: 0,
        }
    }

    /// Override the font size of the `Default` style.
    pub fn with_font_size(mut self, font_size: Option<u32>) -> Self {
        self.font_size = font_size;
        self
    }

    /// Expected frame count, taken from the source probe.
    pub fn with_total_frames(mut self, total_frames: u64) -> Self {
        self.total_frames = total_frames;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn subtitle(&self) -> &Subtitle {
        &self.subtitle
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Target width; always even.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height; always even.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn font_size(&self) -> Option<u32> {
        self.font_size
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}
