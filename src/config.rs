//! Configuration for annotation loading.

use crate::decoders::DEFAULT_MAX_DECOMPRESSED_SIZE;
use crate::geometry::RECT_MATCH_TOLERANCE;
use crate::images::{ImageLimits, DEFAULT_MAX_IMAGE_PIXELS};

/// Scale of the page render used to crop stamp images.
pub const DEFAULT_RENDER_SCALE: f64 = 3.0;

/// Author recorded when an annotation has no `/T`.
pub const DEFAULT_AUTHOR: &str = "User";

/// How stamp images are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StampStrategy {
    /// Crop from a page render, then decode appearance images for stamps the
    /// render did not cover
    #[default]
    RenderThenVector,
    /// Only crop from a page render
    RenderOnly,
    /// Only decode images embedded in stamp appearances
    VectorOnly,
}

impl StampStrategy {
    /// Whether the page render is used.
    pub fn uses_render(&self) -> bool {
        matches!(self, Self::RenderThenVector | Self::RenderOnly)
    }

    /// Whether appearance images are decoded.
    pub fn uses_vector(&self) -> bool {
        matches!(self, Self::RenderThenVector | Self::VectorOnly)
    }
}

/// Annotation loading configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Render scale for stamp cropping.
    pub render_scale: f64,

    /// Per-coordinate tolerance when matching stamp rectangles.
    pub rect_match_tolerance: f64,

    /// Stamp image strategy.
    pub stamp_strategy: StampStrategy,

    /// Worker threads; `0` uses the available parallelism.
    pub worker_threads: usize,

    /// Author for annotations without `/T`.
    pub default_author: String,

    /// Maximum decompressed size of a single stream in bytes.
    pub max_stream_size: usize,

    /// Maximum pixel count of a decoded image.
    pub max_image_pixels: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
            rect_match_tolerance: RECT_MATCH_TOLERANCE,
            stamp_strategy: StampStrategy::default(),
            worker_threads: 0,
            default_author: DEFAULT_AUTHOR.to_string(),
            max_stream_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
            max_image_pixels: DEFAULT_MAX_IMAGE_PIXELS,
        }
    }

    /// Set the stamp render scale.
    pub fn with_render_scale(mut self, scale: f64) -> Self {
        self.render_scale = scale;
        self
    }

    /// Set the rectangle match tolerance.
    pub fn with_rect_match_tolerance(mut self, tolerance: f64) -> Self {
        self.rect_match_tolerance = tolerance;
        self
    }

    /// Set the stamp strategy.
    pub fn with_stamp_strategy(mut self, strategy: StampStrategy) -> Self {
        self.stamp_strategy = strategy;
        self
    }

    /// Set the worker thread count.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Set the fallback author.
    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    /// Set the decompressed stream size limit.
    pub fn with_max_stream_size(mut self, bytes: usize) -> Self {
        self.max_stream_size = bytes;
        self
    }

    /// Set the decoded image pixel limit.
    pub fn with_max_image_pixels(mut self, pixels: u64) -> Self {
        self.max_image_pixels = pixels;
        self
    }

    /// Thread count actually used for the worker pool.
    pub fn effective_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Image decoding limits derived from this configuration.
    pub fn image_limits(&self) -> ImageLimits {
        ImageLimits {
            max_stream_size: self.max_stream_size,
            max_pixels: self.max_image_pixels,
        }
    }
}
