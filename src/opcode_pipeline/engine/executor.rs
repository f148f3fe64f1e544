use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, instrument, warn};

use crate::opcode_pipeline::common::error::{PipelineError, Result};
use crate::opcode_pipeline::engine::buffer::WorkBuffer;
use crate::opcode_pipeline::engine::gain_map::apply_gain_map;
use crate::opcode_pipeline::engine::gamma::GammaCurve;
use crate::opcode_pipeline::engine::report::{ExecutionReport, SkipReason};
use crate::opcode_pipeline::engine::trim::trim_bounds;
use crate::opcode_pipeline::engine::types::ApplyConfig;
use crate::opcode_pipeline::engine::vignette::fix_vignette_radial;
use crate::opcode_pipeline::engine::warp::warp_rectilinear;
use crate::opcode_pipeline::opcodes::{Opcode, OpcodePayload};
use crate::opcode_pipeline::raster::Raster;

/// Result of one pass together with what happened during it.
#[derive(Debug)]
pub struct Execution {
    pub raster: Raster,
    pub report: ExecutionReport,
}

/// Runs opcode sequences against rasters.
///
/// The source raster is never modified; each call produces a fresh raster.
/// Execution cannot fail: opcodes that are disabled, unknown or carry
/// degenerate parameters are skipped and reported.
pub struct OpcodeExecutor {
    config: ApplyConfig,
    pool: Option<ThreadPool>,
}

impl OpcodeExecutor {
    pub fn new(config: ApplyConfig) -> Result<Self> {
        let pool = match config.threads {
            None => None,
            Some(0) => {
                return Err(PipelineError::ThreadPool(
                    "thread count must be at least 1".to_string(),
                ));
            }
            Some(threads) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("opcode-worker-{i}"))
                    .build()
                    .map_err(|e| PipelineError::ThreadPool(e.to_string()))?,
            ),
        };
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Runs `opcodes` over a copy of `source`.
    ///
    /// Output samples are clamped to the raster's depth, so samples already
    /// above `max_value` come back at `max_value` even when nothing runs.
    pub fn apply(&self, source: &Raster, opcodes: &[Opcode]) -> Raster {
        self.apply_with_report(source, opcodes).raster
    }

    /// An absent source is nothing to do, not an error.
    pub fn apply_optional(&self, source: Option<&Raster>, opcodes: &[Opcode]) -> Option<Raster> {
        source.map(|raster| self.apply(raster, opcodes))
    }

    #[instrument(skip_all, fields(
        width = source.width(),
        height = source.height(),
        opcodes = opcodes.len()
    ))]
    pub fn apply_with_report(&self, source: &Raster, opcodes: &[Opcode]) -> Execution {
        let execution = match &self.pool {
            Some(pool) => pool.install(|| self.run(source, opcodes)),
            None => self.run(source, opcodes),
        };
        info!(
            width = execution.raster.width(),
            height = execution.raster.height(),
            skipped = execution.report.skipped().len(),
            "Opcode pass complete"
        );
        execution
    }

    fn run(&self, source: &Raster, opcodes: &[Opcode]) -> Execution {
        let mut report = ExecutionReport::new();
        let mut buffer = WorkBuffer::from_raster(source);

        if self.config.decode_gamma {
            self.gamma_stage(&mut buffer, GammaCurve::decode(self.config.gamma_exponent), "gamma_decode", &mut report);
        }

        for (index, opcode) in opcodes.iter().enumerate() {
            let id = opcode.id();
            if !opcode.enabled {
                debug!(index, %id, "Skipping disabled opcode");
                report.record_skip(index, id, SkipReason::Disabled);
                continue;
            }
            if let Err(e) = opcode.validate() {
                warn!(index, %id, error = %e, "Skipping opcode with invalid parameters");
                report.record_skip(index, id, SkipReason::Invalid(e.to_string()));
                continue;
            }

            if matches!(opcode.payload, OpcodePayload::Unknown(_)) {
                debug!(index, %id, "Skipping unknown opcode");
                report.record_skip(index, id, SkipReason::Unsupported);
                continue;
            }

            buffer = report.timed(id.to_string(), || match &opcode.payload {
                OpcodePayload::WarpRectilinear(warp) => warp_rectilinear(buffer, warp),
                OpcodePayload::FixVignetteRadial(vignette) => fix_vignette_radial(buffer, vignette),
                OpcodePayload::TrimBounds(trim) => trim_bounds(buffer, trim),
                OpcodePayload::GainMap(map) => apply_gain_map(buffer, map),
                OpcodePayload::Unknown(_) => buffer,
            });
            debug!(index, %id, "Applied opcode");
        }

        if self.config.encode_gamma {
            self.gamma_stage(&mut buffer, GammaCurve::encode(self.config.gamma_exponent), "gamma_encode", &mut report);
        }

        Execution {
            raster: buffer.into_raster(source.bits_per_sample()),
            report,
        }
    }

    fn gamma_stage(
        &self,
        buffer: &mut WorkBuffer,
        curve: GammaCurve,
        name: &str,
        report: &mut ExecutionReport,
    ) {
        if !curve.is_valid() {
            warn!(exponent = self.config.gamma_exponent, "Ignoring unusable gamma exponent");
            return;
        }
        report.timed(name, || curve.apply_buffer(buffer));
    }
}

/// One-shot execution on the global worker pool.
///
/// Same clamping as [`OpcodeExecutor::apply`].
pub fn apply(
    source: &Raster,
    opcodes: &[Opcode],
    decode_gamma: bool,
    encode_gamma: bool,
    gamma_exponent: f32,
) -> Raster {
    let config = ApplyConfig::builder()
        .decode_gamma(decode_gamma)
        .encode_gamma(encode_gamma)
        .gamma_exponent(gamma_exponent)
        .build();
    OpcodeExecutor { config, pool: None }.apply(source, opcodes)
}
