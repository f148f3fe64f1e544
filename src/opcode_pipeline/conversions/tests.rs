use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use crate::opcode_pipeline::codec::encode;
use crate::opcode_pipeline::common::error::{PipelineError, Result};
use crate::opcode_pipeline::conversions::{OpcodePipeline, PipelineConfig};
use crate::opcode_pipeline::engine::{ApplyConfig, SkipReason};
use crate::opcode_pipeline::opcodes::{FixVignetteRadial, Opcode, OpcodeStage, TrimBounds};
use crate::opcode_pipeline::raster::Raster;
use crate::opcode_pipeline::tiff::{
    RasterReader, RasterWriter, StandardTiffWriter, TiffOptions, TiffRasterReader,
};

struct MockReader {
    should_fail: bool,
    mock_data: Option<Raster>,
}

impl RasterReader for MockReader {
    fn read_raster(&self, _data: &[u8]) -> Result<Raster> {
        if self.should_fail {
            return Err(PipelineError::DecodeError("Mock decode error".to_string()));
        }
        match &self.mock_data {
            Some(raster) => Ok(raster.clone()),
            None => Ok(Raster::filled(10, 8, 1, 16, 1000)?),
        }
    }
}

struct MockWriter {
    should_fail: bool,
    written_data: Arc<Mutex<Vec<Raster>>>,
}

impl RasterWriter for MockWriter {
    fn write_raster(&self, raster: &Raster, _output: &mut dyn Write, _options: &TiffOptions) -> Result<()> {
        if self.should_fail {
            return Err(PipelineError::EncodeError("Mock encode error".to_string()));
        }
        self.written_data.lock().unwrap().push(raster.clone());
        Ok(())
    }
}

fn mock_pipeline(
    reader_fails: bool,
    writer_fails: bool,
    config: PipelineConfig,
) -> (OpcodePipeline<MockReader, MockWriter>, Arc<Mutex<Vec<Raster>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let reader = MockReader {
        should_fail: reader_fails,
        mock_data: None,
    };
    let writer = MockWriter {
        should_fail: writer_fails,
        written_data: written.clone(),
    };
    let pipeline = OpcodePipeline::with_custom(reader, writer, config).unwrap();
    (pipeline, written)
}

#[test]
fn test_config_builder() {
    let config = PipelineConfig::builder()
        .apply(ApplyConfig::builder().decode_gamma(true).build())
        .validate_dimensions(false)
        .stage(Some(OpcodeStage::Demosaiced))
        .build();

    assert!(config.apply.decode_gamma);
    assert!(!config.apply.encode_gamma);
    assert!(!config.validate_dimensions);
    assert_eq!(config.stage, Some(OpcodeStage::Demosaiced));
    assert_eq!(config.tiff, TiffOptions::default());
}

#[test]
fn test_successful_pass() {
    let (pipeline, written) = mock_pipeline(false, false, PipelineConfig::default());
    let opcodes = [Opcode::from(TrimBounds::new(1, 2, 7, 9))];

    let mut output = Cursor::new(Vec::new());
    let report = pipeline.process(b"fake image", &opcodes, &mut output).unwrap();

    let written = written.lock().unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!((written[0].width(), written[0].height()), (7, 6));
    assert_eq!(report.steps().len(), 1);
}

#[test]
fn test_reader_failure() {
    let (pipeline, written) = mock_pipeline(true, false, PipelineConfig::default());
    let mut output = Cursor::new(Vec::new());
    let result = pipeline.process(b"fake image", &[], &mut output);

    assert!(matches!(result.unwrap_err(), PipelineError::DecodeError(_)));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_writer_failure() {
    let (pipeline, _) = mock_pipeline(false, true, PipelineConfig::default());
    let mut output = Cursor::new(Vec::new());
    let result = pipeline.process(b"fake image", &[], &mut output);

    assert!(matches!(result.unwrap_err(), PipelineError::EncodeError(_)));
}

#[test]
fn test_stage_filter_limits_opcodes() {
    let config = PipelineConfig::builder().stage(Some(OpcodeStage::Raw)).build();
    let (pipeline, written) = mock_pipeline(false, false, config);
    let opcodes = [
        Opcode::from(TrimBounds::new(0, 0, 4, 4)).with_stage(OpcodeStage::Raw),
        Opcode::from(TrimBounds::new(0, 0, 2, 2)),
    ];

    let mut output = Cursor::new(Vec::new());
    pipeline.process(b"fake image", &opcodes, &mut output).unwrap();

    let written = written.lock().unwrap();
    assert_eq!((written[0].width(), written[0].height()), (4, 4));
}

#[test]
fn test_disabled_opcodes_reported() {
    let (pipeline, _) = mock_pipeline(false, false, PipelineConfig::default());
    let mut opcode = Opcode::from(FixVignetteRadial::default());
    opcode.enabled = false;

    let mut output = Cursor::new(Vec::new());
    let report = pipeline.process(b"fake image", &[opcode], &mut output).unwrap();
    assert_eq!(report.skipped()[0].reason, SkipReason::Disabled);
}

#[test]
fn test_set_config_rejects_zero_threads() {
    let (mut pipeline, _) = mock_pipeline(false, false, PipelineConfig::default());
    let config = PipelineConfig::builder()
        .apply(ApplyConfig::builder().threads(Some(0)).build())
        .build();
    assert!(matches!(
        pipeline.set_config(config),
        Err(PipelineError::ThreadPool(_))
    ));
    assert_eq!(pipeline.config().apply.threads, None);
}

#[test]
fn test_process_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("input.tiff");
    let list_path = dir.path().join("list2.bin");
    let output_path = dir.path().join("output.tiff");

    let source = Raster::filled(12, 10, 1, 16, 2000).unwrap();
    let mut image = Vec::new();
    StandardTiffWriter
        .write_raster(&source, &mut image, &TiffOptions::default())
        .unwrap();
    std::fs::write(&image_path, image).unwrap();
    std::fs::write(&list_path, encode(&[Opcode::from(TrimBounds::new(2, 3, 8, 9))])).unwrap();

    let pipeline = OpcodePipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline
        .process_file(&image_path, &[&list_path], &output_path)
        .unwrap();
    assert!(report.skipped().is_empty());

    let written = TiffRasterReader
        .read_raster(&std::fs::read(&output_path).unwrap())
        .unwrap();
    assert_eq!((written.width(), written.height()), (6, 6));
    assert!(written.data().iter().all(|&v| v == 2000));
}

#[test]
fn test_process_file_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = OpcodePipeline::new(PipelineConfig::default()).unwrap();
    let result = pipeline.process_file(
        dir.path().join("missing.tiff"),
        &[dir.path().join("missing.bin")],
        dir.path().join("out.tiff"),
    );
    assert!(matches!(result.unwrap_err(), PipelineError::InputReadError(_)));
}

#[test]
fn test_process_file_surfaces_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("input.tiff");
    let list_path = dir.path().join("bad.bin");

    let mut image = Vec::new();
    StandardTiffWriter
        .write_raster(&Raster::filled(4, 4, 1, 16, 0).unwrap(), &mut image, &TiffOptions::default())
        .unwrap();
    std::fs::write(&image_path, image).unwrap();
    std::fs::write(&list_path, [0u8, 0, 0, 1, 0, 0]).unwrap();

    let pipeline = OpcodePipeline::new(PipelineConfig::default()).unwrap();
    let result = pipeline.process_file(&image_path, &[&list_path], dir.path().join("out.tiff"));
    assert!(matches!(result.unwrap_err(), PipelineError::Opcode(_)));
}
