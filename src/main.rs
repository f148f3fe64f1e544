use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use dng_opcodes_rs::logger;
use dng_opcodes_rs::opcode_pipeline::{
    ApplyConfig, CfaFix, Opcode, OpcodePayload, OpcodePipeline, OpcodeStage, PipelineConfig,
    RasterReader, TiffCompression, TiffOptions, TiffRasterReader, decode_stage, encode,
    encode_stage, flat_field_gain_maps, min_gain, strip_luminance, swap_cfa_channels,
};

#[derive(Parser, Debug)]
#[command(name = "dng-opcodes", version)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the opcodes of one or more opcode list blobs.
    Inspect(InspectArgs),
    /// Apply opcode lists to a TIFF image.
    Apply(ApplyArgs),
    /// Repair gain map site order and luminance across a batch of lists.
    FixCfa(FixCfaArgs),
    /// Build a gain map list from a flat-field TIFF exposure.
    FlatField(FlatFieldArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Opcode list blobs.
    #[arg(required = true)]
    lists: Vec<PathBuf>,

    /// Stage the lists belong to (1, 2 or 3).
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=3))]
    stage: u32,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input TIFF image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Opcode list blobs, applied in order.
    #[arg(long = "list", required = true)]
    lists: Vec<PathBuf>,

    /// Output TIFF path.
    #[arg(long)]
    out: PathBuf,

    /// Linearise samples before the first opcode.
    #[arg(long, default_value_t = false)]
    decode_gamma: bool,

    /// Re-encode samples after the last opcode.
    #[arg(long, default_value_t = false)]
    encode_gamma: bool,

    #[arg(long, default_value_t = 2.2)]
    gamma: f32,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    #[arg(long, value_enum, default_value_t = CompressionArg::None)]
    compression: CompressionArg,

    /// Use horizontal differencing with compression.
    #[arg(long, default_value_t = false)]
    predictor: bool,

    /// Print per-opcode timings when done.
    #[arg(long, default_value_t = false)]
    summary: bool,
}

#[derive(Parser, Debug)]
struct FixCfaArgs {
    /// Opcode list blobs of one capture sequence.
    #[arg(required = true)]
    lists: Vec<PathBuf>,

    /// Directory the corrected lists are written to.
    #[arg(long)]
    out_dir: PathBuf,

    /// Mosaic layout correction to apply.
    #[arg(long, value_enum)]
    fix: Option<CfaArg>,

    /// Divide the per-node luminance out of each frame's gain maps.
    #[arg(long, default_value_t = false)]
    strip_luminance: bool,
}

#[derive(Parser, Debug)]
struct FlatFieldArgs {
    /// Single-channel mosaic TIFF of an evenly lit surface.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output opcode list blob.
    #[arg(long)]
    out: PathBuf,

    /// Keep only the colour ratios between sites.
    #[arg(long, default_value_t = false)]
    strip_luminance: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    Deflate,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::Deflate => TiffCompression::DeflateBalanced,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CfaArg {
    Bggr,
    Grbg,
}

impl From<CfaArg> for CfaFix {
    fn from(arg: CfaArg) -> Self {
        match arg {
            CfaArg::Bggr => CfaFix::Bggr,
            CfaArg::Grbg => CfaFix::Grbg,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logger::init_with_default("debug");
    } else {
        logger::init();
    }

    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Apply(args) => cmd_apply(args),
        Command::FixCfa(args) => cmd_fix_cfa(args),
        Command::FlatField(args) => cmd_flat_field(args),
    }
}

fn read_list(path: &Path, stage: OpcodeStage) -> anyhow::Result<Vec<Opcode>> {
    let bytes = std::fs::read(path).with_context(|| format!("read list '{}'", path.display()))?;
    decode_stage(&bytes, stage).with_context(|| format!("decode list '{}'", path.display()))
}

fn describe(payload: &OpcodePayload) -> String {
    match payload {
        OpcodePayload::WarpRectilinear(warp) => format!(
            "{} plane(s), center ({:.4}, {:.4})",
            warp.planes.len(),
            warp.center_x,
            warp.center_y
        ),
        OpcodePayload::FixVignetteRadial(v) => format!(
            "k={:?}, center ({:.4}, {:.4})",
            v.k, v.center_x, v.center_y
        ),
        OpcodePayload::TrimBounds(t) => {
            format!("top={} left={} bottom={} right={}", t.top, t.left, t.bottom, t.right)
        }
        OpcodePayload::GainMap(m) => format!(
            "rect ({}, {})-({}, {}), plane {}+{}, pitch {}x{}, grid {}x{}x{}",
            m.top,
            m.left,
            m.bottom,
            m.right,
            m.plane,
            m.planes,
            m.row_pitch,
            m.col_pitch,
            m.map_points_v,
            m.map_points_h,
            m.map_planes
        ),
        OpcodePayload::Unknown(u) => format!("{} opaque bytes", u.data.len()),
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let stage = OpcodeStage::from_index(args.stage).unwrap_or_default();
    for path in &args.lists {
        let opcodes = read_list(path, stage)?;
        println!("{} ({} opcodes)", path.display(), opcodes.len());
        for (index, opcode) in opcodes.iter().enumerate() {
            println!(
                "  #{index:<3} {:<18} v{:#010x} flags={:#x}  {}",
                opcode.id().to_string(),
                opcode.header.version,
                opcode.header.flags.bits(),
                describe(&opcode.payload)
            );
        }
    }
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let apply = ApplyConfig::builder()
        .decode_gamma(args.decode_gamma)
        .encode_gamma(args.encode_gamma)
        .gamma_exponent(args.gamma)
        .threads(args.threads)
        .build();
    let tiff = TiffOptions::builder()
        .compression(args.compression.into())
        .predictor(args.predictor.then_some(2))
        .build();
    let config = PipelineConfig::builder().apply(apply).tiff(tiff).build();

    let pipeline = OpcodePipeline::new(config).context("set up pipeline")?;
    let report = pipeline
        .process_file(&args.in_path, &args.lists, &args.out)
        .with_context(|| format!("apply opcodes to '{}'", args.in_path.display()))?;

    if args.summary {
        report.print_summary();
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_fix_cfa(args: FixCfaArgs) -> anyhow::Result<()> {
    let stage = OpcodeStage::Linear;
    let mut frames = Vec::with_capacity(args.lists.len());
    for path in &args.lists {
        frames.push((path, read_list(path, stage)?));
    }

    let global_min = if args.strip_luminance {
        let all: Vec<Opcode> = frames.iter().flat_map(|(_, ops)| ops.iter().cloned()).collect();
        let min = min_gain(&all);
        info!(?min, frames = frames.len(), "Batch minimum gain");
        min
    } else {
        None
    };

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    for (path, mut opcodes) in frames {
        if args.strip_luminance {
            strip_luminance(&mut opcodes, global_min)
                .with_context(|| format!("strip luminance in '{}'", path.display()))?;
        }
        if let Some(fix) = args.fix {
            swap_cfa_channels(&mut opcodes, fix.into())
                .with_context(|| format!("swap sites in '{}'", path.display()))?;
        }

        let name = path
            .file_name()
            .with_context(|| format!("no file name in '{}'", path.display()))?;
        let out = args.out_dir.join(name);
        std::fs::write(&out, encode(&opcodes))
            .with_context(|| format!("write list '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

fn cmd_flat_field(args: FlatFieldArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let flat = TiffRasterReader
        .read_raster(&bytes)
        .with_context(|| format!("decode image '{}'", args.in_path.display()))?;

    let opcodes = flat_field_gain_maps(&flat, args.strip_luminance)?;
    std::fs::write(&args.out, encode_stage(&opcodes, OpcodeStage::Linear))
        .with_context(|| format!("write list '{}'", args.out.display()))?;

    eprintln!("wrote {} gain maps to {}", opcodes.len(), args.out.display());
    Ok(())
}
