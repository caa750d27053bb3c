use crate::core::models::angles::AngleFamily;
use crate::core::models::residue::ChainLayout;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Number of contiguous frame ranges the trajectory is cut into.
    pub splits: usize,
    /// Render chunk `i` from every frame up to its end instead of its own range.
    pub cumulative: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationConfig {
    /// Coefficients with `|r| <= threshold` are discarded.
    pub threshold: f64,
    /// Rows per block when accumulating the Gram matrix.
    pub block_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Keep every `stride`-th frame before detection.
    pub stride: usize,
    pub window_width: usize,
    pub penalty: f64,
    pub unwrap: bool,
    /// Fold unwrapped values back into `(-360, 360)`; only applies with `unwrap`.
    pub rewrap: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderingConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub family: AngleFamily,
    pub chain_layout: ChainLayout,
    pub chunking: ChunkingConfig,
    pub correlation: CorrelationConfig,
    pub segmentation: SegmentationConfig,
    pub rendering: RenderingConfig,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    family: Option<AngleFamily>,
    chain_layout: Option<ChainLayout>,
    splits: Option<usize>,
    cumulative: Option<bool>,
    threshold: Option<f64>,
    block_rows: Option<usize>,
    stride: Option<usize>,
    window_width: Option<usize>,
    penalty: Option<f64>,
    unwrap: Option<bool>,
    rewrap: Option<bool>,
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(mut self, family: AngleFamily) -> Self {
        self.family = Some(family);
        self
    }
    pub fn chain_layout(mut self, layout: ChainLayout) -> Self {
        self.chain_layout = Some(layout);
        self
    }
    pub fn splits(mut self, splits: usize) -> Self {
        self.splits = Some(splits);
        self
    }
    pub fn cumulative(mut self, cumulative: bool) -> Self {
        self.cumulative = Some(cumulative);
        self
    }
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
    pub fn block_rows(mut self, rows: usize) -> Self {
        self.block_rows = Some(rows);
        self
    }
    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }
    pub fn window_width(mut self, width: usize) -> Self {
        self.window_width = Some(width);
        self
    }
    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = Some(penalty);
        self
    }
    pub fn unwrap(mut self, unwrap: bool) -> Self {
        self.unwrap = Some(unwrap);
        self
    }
    pub fn rewrap(mut self, rewrap: bool) -> Self {
        self.rewrap = Some(rewrap);
        self
    }
    pub fn canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas_width = Some(width);
        self.canvas_height = Some(height);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let chunking = ChunkingConfig {
            splits: self
                .splits
                .ok_or(ConfigError::MissingParameter("splits"))?,
            cumulative: self
                .cumulative
                .ok_or(ConfigError::MissingParameter("cumulative"))?,
        };
        let correlation = CorrelationConfig {
            threshold: self
                .threshold
                .ok_or(ConfigError::MissingParameter("threshold"))?,
            block_rows: self
                .block_rows
                .ok_or(ConfigError::MissingParameter("block_rows"))?,
        };
        let segmentation = SegmentationConfig {
            stride: self
                .stride
                .ok_or(ConfigError::MissingParameter("stride"))?,
            window_width: self
                .window_width
                .ok_or(ConfigError::MissingParameter("window_width"))?,
            penalty: self
                .penalty
                .ok_or(ConfigError::MissingParameter("penalty"))?,
            unwrap: self
                .unwrap
                .ok_or(ConfigError::MissingParameter("unwrap"))?,
            rewrap: self
                .rewrap
                .ok_or(ConfigError::MissingParameter("rewrap"))?,
        };
        let rendering = RenderingConfig {
            width: self
                .canvas_width
                .ok_or(ConfigError::MissingParameter("canvas"))?,
            height: self
                .canvas_height
                .ok_or(ConfigError::MissingParameter("canvas"))?,
        };
        let config = AnalysisConfig {
            family: self.family.ok_or(ConfigError::MissingParameter("family"))?,
            chain_layout: self
                .chain_layout
                .ok_or(ConfigError::MissingParameter("chain_layout"))?,
            chunking,
            correlation,
            segmentation,
            rendering,
        };
        config.validate()?;
        Ok(config)
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name, reason: &str| ConfigError::InvalidParameter {
            name,
            reason: reason.to_string(),
        };
        if self.chunking.splits == 0 {
            return Err(invalid("splits", "must be at least 1"));
        }
        let t = self.correlation.threshold;
        if !(0.0..1.0).contains(&t) {
            return Err(invalid("threshold", "must lie in [0, 1)"));
        }
        if self.correlation.block_rows == 0 {
            return Err(invalid("block_rows", "must be at least 1"));
        }
        if self.segmentation.stride == 0 {
            return Err(invalid("stride", "must be at least 1"));
        }
        if self.segmentation.window_width < 2 {
            return Err(invalid("window_width", "must be at least 2"));
        }
        let penalty = self.segmentation.penalty;
        if penalty.is_nan() || penalty < 0.0 {
            return Err(invalid("penalty", "must be a non-negative number"));
        }
        if self.rendering.width == 0 || self.rendering.height == 0 {
            return Err(invalid("canvas", "dimensions must be at least 1 pixel"));
        }
        Ok(())
    }
}
