use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use crate::opcode_pipeline::{
    codec,
    common::error::{PipelineError, Result},
    conversions::types::PipelineConfig,
    engine::{ExecutionReport, OpcodeExecutor},
    opcodes::{Opcode, for_stage},
    tiff::{RasterReader, RasterWriter, StandardTiffWriter, TiffRasterReader},
};

pub struct OpcodePipeline<R: RasterReader, W: RasterWriter> {
    reader: R,
    writer: W,
    executor: OpcodeExecutor,
    config: PipelineConfig,
}

impl OpcodePipeline<TiffRasterReader, StandardTiffWriter> {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_custom(TiffRasterReader, StandardTiffWriter, config)
    }
}

impl<R: RasterReader, W: RasterWriter> OpcodePipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            reader,
            writer,
            executor: OpcodeExecutor::new(config.apply.clone())?,
            config,
        })
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Applies `opcodes` to the raster in `image_data` and writes the result.
    ///
    /// With a configured stage, only opcodes tagged with it run.
    #[instrument(skip(self, image_data, opcodes, output), fields(input_size = image_data.len(), opcodes = opcodes.len()))]
    pub fn process(
        &self,
        image_data: &[u8],
        opcodes: &[Opcode],
        output: &mut dyn Write,
    ) -> Result<ExecutionReport> {
        info!("Starting opcode pass");

        let raster = {
            let _span = tracing::info_span!("decode_raster").entered();
            self.reader.read_raster(image_data)?
        };

        {
            let _span = tracing::info_span!("validate_dimensions",
                width = raster.width(),
                height = raster.height()
            ).entered();
            self.validate_dimensions(raster.width(), raster.height())?;
        }

        let selected;
        let opcodes = match self.config.stage {
            Some(stage) => {
                selected = for_stage(opcodes, stage);
                &selected[..]
            }
            None => opcodes,
        };

        let execution = {
            let _span = tracing::info_span!("apply_opcodes", count = opcodes.len()).entered();
            self.executor.apply_with_report(&raster, opcodes)
        };

        {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer
                .write_raster(&execution.raster, output, &self.config.tiff)?;
        }

        info!(
            width = execution.raster.width(),
            height = execution.raster.height(),
            skipped = execution.report.skipped().len(),
            "Opcode pass complete"
        );
        Ok(execution.report)
    }

    /// Reads one image and any number of opcode list blobs, writes the result.
    ///
    /// Lists are concatenated in the given order.
    #[instrument(skip(self, image_path, opcode_paths, output_path))]
    pub fn process_file<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
        &self,
        image_path: P,
        opcode_paths: &[Q],
        output_path: O,
    ) -> Result<ExecutionReport> {
        let image_path = image_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %image_path.display(),
            lists = opcode_paths.len(),
            output = %output_path.display(),
            "Processing file"
        );

        let image_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(image_path).map_err(|e| {
                PipelineError::InputReadError(format!("{}: {}", image_path.display(), e))
            })?
        };

        let stage = self.config.stage.unwrap_or_default();
        let mut opcodes = Vec::new();
        for path in opcode_paths {
            let path = path.as_ref();
            let _span = tracing::info_span!("read_opcode_list", path = %path.display()).entered();
            let bytes = std::fs::read(path).map_err(|e| {
                PipelineError::InputReadError(format!("{}: {}", path.display(), e))
            })?;
            opcodes.extend(codec::decode_stage(&bytes, stage)?);
        }

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                PipelineError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        self.process(&image_data, &opcodes, &mut output_file)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replaces the configuration, rebuilding the worker pool if needed.
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<()> {
        if config.apply != self.config.apply {
            self.executor = OpcodeExecutor::new(config.apply.clone())?;
        }
        self.config = config;
        Ok(())
    }
}
