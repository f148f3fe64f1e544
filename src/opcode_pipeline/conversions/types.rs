//! Pipeline configuration types

use crate::opcode_pipeline::engine::ApplyConfig;
use crate::opcode_pipeline::opcodes::OpcodeStage;
use crate::opcode_pipeline::tiff::TiffOptions;

/// Configuration for applying opcode lists to a raster file
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub apply: ApplyConfig,
    pub tiff: TiffOptions,
    /// Whether to validate image dimensions before running opcodes
    pub validate_dimensions: bool,
    /// Only run opcodes of this stage; `None` runs the whole sequence.
    /// Lists read from files are tagged with this stage (or the linear stage).
    pub stage: Option<OpcodeStage>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            apply: ApplyConfig::default(),
            tiff: TiffOptions::default(),
            validate_dimensions: true,
            stage: None,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    apply: Option<ApplyConfig>,
    tiff: Option<TiffOptions>,
    validate_dimensions: Option<bool>,
    stage: Option<Option<OpcodeStage>>,
}

impl PipelineConfigBuilder {
    pub fn apply(mut self, apply: ApplyConfig) -> Self {
        self.apply = Some(apply);
        self
    }

    pub fn tiff(mut self, tiff: TiffOptions) -> Self {
        self.tiff = Some(tiff);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn stage(mut self, stage: Option<OpcodeStage>) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            apply: self.apply.unwrap_or(default.apply),
            tiff: self.tiff.unwrap_or(default.tiff),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            stage: self.stage.unwrap_or(default.stage),
        }
    }
}
