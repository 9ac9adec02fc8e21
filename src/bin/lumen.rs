use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgGroup, Parser, Subcommand};

use lumen::{AovType, BufferConfig, BufferParams, PassType, RenderBuffers};

#[derive(Parser, Debug)]
#[command(name = "lumen", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved buffer layout of a config.
    Inspect(InspectArgs),
    /// Decode one pass or AOV of a raw buffer dump into an image.
    Extract(ExtractArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Buffer config JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["pass", "aov"])))]
struct ExtractArgs {
    /// Buffer config JSON describing the dump.
    #[arg(long)]
    config: PathBuf,

    /// Raw accumulation buffer: little-endian f32, `width * height * stride` values.
    #[arg(long)]
    buffer: PathBuf,

    /// Pass to extract, e.g. `combined` or `diffuse_direct`.
    #[arg(long, value_parser = parse_pass)]
    pass: Option<PassType>,

    /// AOV to extract, by name.
    #[arg(long)]
    aov: Option<String>,

    /// Samples accumulated into the buffer.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    sample: u32,

    /// Exposure multiplier for exposure-scaled passes.
    #[arg(long, default_value_t = 1.0)]
    exposure: f32,

    /// Output image; `.png` is clamped to 8 bits, `.exr` keeps full float range.
    #[arg(long)]
    out: PathBuf,
}

fn parse_pass(s: &str) -> Result<PassType, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown pass '{s}'"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Extract(args) => cmd_extract(args),
    }
}

fn load_params(path: &Path) -> anyhow::Result<BufferParams> {
    let cfg = BufferConfig::from_path(path)
        .with_context(|| format!("load buffer config '{}'", path.display()))?;
    Ok(cfg.to_params()?)
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let params = load_params(&args.config)?;
    let layout = &params.passes;

    println!(
        "tile {}x{} at ({}, {}) in {}x{} frame",
        params.width,
        params.height,
        params.full_x,
        params.full_y,
        params.full_width,
        params.full_height
    );
    println!("stride {} floats per pixel", layout.size());
    for pass in layout.passes() {
        let Some(resolved) = layout.get_pass(pass.kind) else {
            continue;
        };
        let mut flags = Vec::new();
        if pass.filter {
            flags.push("filter");
        }
        if pass.exposure {
            flags.push("exposure");
        }
        println!(
            "  pass {:<24} offset {:>3}  components {}  {}",
            format!("{:?}", pass.kind),
            resolved.offset,
            pass.components,
            flags.join(" ")
        );
    }
    for aov in layout.aovs() {
        let Some(resolved) = layout.get_aov(&aov.name) else {
            continue;
        };
        println!(
            "  aov  {:<24} offset {:>3}  components {}",
            aov.name,
            resolved.offset,
            aov.kind.components()
        );
    }
    if let (Some(offset), Some(clean)) = (layout.denoising_offset(), layout.denoising_clean()) {
        let suffix = if clean { " (with clean pass)" } else { "" };
        println!("  denoising block at offset {offset}{suffix}");
    }
    Ok(())
}

fn read_raw_f32(path: &Path) -> anyhow::Result<Vec<f32>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read buffer '{}'", path.display()))?;
    if bytes.len() % 4 != 0 {
        anyhow::bail!(
            "buffer '{}' is {} bytes, not a whole number of f32 values",
            path.display(),
            bytes.len()
        );
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let params = load_params(&args.config)?;
    let raw = read_raw_f32(&args.buffer)?;
    let expected = params.pixel_count() * params.passes.size();
    if raw.len() != expected {
        anyhow::bail!(
            "buffer holds {} floats, layout expects {expected}",
            raw.len()
        );
    }

    let mut buffers = RenderBuffers::new_host();
    buffers.reset(&params)?;
    buffers
        .buffer_mut()
        .device_mut()
        .context("render buffer has no device storage after reset")?
        .copy_from_slice(&raw);
    buffers.copy_from_device()?;

    let pixels = params.pixel_count();
    let (components, found, what) = match (&args.pass, &args.aov) {
        (Some(kind), _) => {
            // Lighting passes only divide by their color pass when read as RGB.
            let descriptor = kind.descriptor();
            let components = match descriptor.components {
                1 => 1,
                _ if descriptor.divide.is_some() => 3,
                _ => 4,
            };
            let mut out = vec![0.0; pixels * components];
            let found =
                buffers.get_pass_rect(*kind, args.exposure, args.sample, components, &mut out);
            (components, found.then_some(out), format!("pass {kind:?}"))
        }
        (None, Some(name)) => {
            let kind = params
                .passes
                .aovs()
                .iter()
                .find(|a| &a.name == name)
                .map_or(AovType::Float, |a| a.kind);
            let components = kind.components() as usize;
            let mut out = vec![0.0; pixels * components];
            let found =
                buffers.get_aov_rect(name, args.exposure, args.sample, components, &mut out);
            (components, found.then_some(out), format!("aov '{name}'"))
        }
        (None, None) => anyhow::bail!("one of --pass or --aov is required"),
    };
    let Some(values) = found else {
        anyhow::bail!("{what} is not available in this layout");
    };

    let rgba = expand_to_rgba(&values, components);
    write_image(&args.out, params.width, params.height, rgba)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn expand_to_rgba(values: &[f32], components: usize) -> Vec<f32> {
    values
        .chunks_exact(components)
        .flat_map(|px| match *px {
            [v] => [v, v, v, 1.0],
            [r, g, b] => [r, g, b, 1.0],
            [r, g, b, a] => [r, g, b, a],
            _ => [0.0, 0.0, 0.0, 1.0],
        })
        .collect()
}

fn write_image(path: &Path, width: u32, height: u32, rgba: Vec<f32>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let format = image::ImageFormat::from_path(path)
        .with_context(|| format!("infer image format of '{}'", path.display()))?;
    match format {
        image::ImageFormat::OpenExr => {
            let img = image::Rgba32FImage::from_raw(width, height, rgba)
                .context("pixel count does not match image size")?;
            image::DynamicImage::ImageRgba32F(img)
                .save_with_format(path, format)
                .with_context(|| format!("write exr '{}'", path.display()))?;
        }
        image::ImageFormat::Png => {
            let bytes: Vec<u8> = rgba
                .iter()
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect();
            image::save_buffer_with_format(
                path,
                &bytes,
                width,
                height,
                image::ColorType::Rgba8,
                format,
            )
            .with_context(|| format!("write png '{}'", path.display()))?;
        }
        other => anyhow::bail!("unsupported output format {other:?}, use .png or .exr"),
    }
    Ok(())
}
