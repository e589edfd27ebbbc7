use anyhow::{Context, Result};
use argh::FromArgs;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::time::Instant;
use strum::IntoEnumIterator;
use texture_rotation::{EffectParameters, Renderer, Rotation};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs, Debug)]
/// Rotate and flip an image on the GPU.
struct Args {
    /// source image
    #[argh(positional)]
    input: PathBuf,

    /// destination image, or a directory when --all is set
    #[argh(positional)]
    output: PathBuf,

    /// rotation code (0, 90, 180, 270, -1, -90, -180, -270) or name (rotate90, flip-rotate90, ...)
    #[argh(
        option,
        short = 'r',
        default = "Rotation::None",
        from_str_fn(parse_rotation)
    )]
    rotation: Rotation,

    /// output width before rotation, defaults to the source width
    #[argh(option)]
    width: Option<u32>,

    /// output height before rotation, defaults to the source height
    #[argh(option)]
    height: Option<u32>,

    /// contrast multiplier
    #[argh(option, default = "1.0")]
    contrast: f32,

    /// brightness offset
    #[argh(option, default = "0.0")]
    brightness: f32,

    /// saturation multiplier, 0 is greyscale
    #[argh(option, default = "1.0")]
    saturation: f32,

    /// gamma exponent
    #[argh(option, default = "1.0")]
    gamma: f32,

    /// write every rotation into the output directory
    #[argh(switch)]
    all: bool,
}

impl Args {
    fn effect_parameters(&self) -> EffectParameters {
        EffectParameters::new()
            .with_contrast(self.contrast)
            .with_brightness(self.brightness)
            .with_saturation(self.saturation)
            .with_gamma(self.gamma)
    }
}

fn parse_rotation(value: &str) -> Result<Rotation, String> {
    if let Ok(code) = value.parse::<i32>() {
        return Rotation::try_from(code).map_err(|err| err.to_string());
    }
    value
        .parse()
        .map_err(|_| format!("{value} is not a rotation name"))
}

fn rotation_output_path(dir: &Path, input: &Path, rotation: Rotation) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_else(|| "image".into());
    dir.join(format!("{stem}-{rotation}.png"))
}

async fn render_to(renderer: &mut Renderer, rotation: Rotation, path: &Path) -> Result<()> {
    let start = Instant::now();
    renderer.set_rotation(rotation);
    let output = renderer
        .render()
        .await
        .with_context(|| format!("Failed to render {rotation}"))?;
    debug!(elapsed = ?start.elapsed(), %rotation, "Rendered frame");

    let saved = match ImageFormat::from_path(path) {
        // jpeg has no alpha channel
        Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgba8(output.clone())
            .to_rgb8()
            .save(path),
        _ => output.save(path),
    };
    saved.with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        "Wrote {} ({}x{})",
        path.display(),
        output.width(),
        output.height()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Args = argh::from_env();
    debug!(?args, "Parsed arguments");

    let img = image::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let mut renderer = Renderer::new()
        .await
        .context("Failed to create renderer")?;
    renderer.upload_image(&img)?;
    renderer.set_output_size(
        args.width.unwrap_or(img.width()),
        args.height.unwrap_or(img.height()),
    );
    renderer.update_effects(args.effect_parameters())?;

    if args.all {
        std::fs::create_dir_all(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?;
        for rotation in Rotation::iter() {
            let path = rotation_output_path(&args.output, &args.input, rotation);
            render_to(&mut renderer, rotation, &path).await?;
        }
    } else {
        render_to(&mut renderer, args.rotation, &args.output).await?;
    }

    if let Some(msg) = renderer.frame_time_msg() {
        info!("{msg}");
    }

    Ok(())
}
