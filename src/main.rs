//! # Memeforge CLI
//!
//! Command-line interface for meme and collage compositing.
//!
//! ## Usage
//!
//! ```bash
//! # Render a template with new captions
//! memeforge render drake.json --text 0="writing code" --text 1="writing tests" -o meme.png
//!
//! # Brighten and stylize
//! memeforge render drake.json --brightness 130 --style comic -o meme.png
//!
//! # Three images side by side
//! memeforge collage --layout horizontal3 a.jpg b.jpg c.jpg -o collage.png
//!
//! # Stylize any image
//! memeforge stylize photo.jpg --style watercolor --intensity 0.6 -o painted.png
//!
//! # List styles and collage layouts
//! memeforge styles
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memeforge::{
    DefaultImageLoader, EditingSession, EditorConfig, FilterEngine, FilterSettings, FontRegistry, ImageLoader,
    MemeforgeError, Template,
    collage::{Collage, CollageLayout, LAYOUTS},
    filter::FILTER_IDENTITY,
    render::{RenderContext, RenderSettings},
    style::{LOOKS, StyleOutcome, apply_style_with_timeout},
    template::{AreaId, TextStyle},
};

/// Memeforge - Meme and collage compositor
#[derive(Parser, Debug)]
#[command(name = "memeforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log render and style progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Filter engine, overriding the config file (css or manual)
    #[arg(long, global = true)]
    filter_engine: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct FilterArgs {
    /// Brightness percent (100 = unchanged)
    #[arg(long, default_value_t = FILTER_IDENTITY)]
    brightness: f32,

    /// Contrast percent (100 = unchanged)
    #[arg(long, default_value_t = FILTER_IDENTITY)]
    contrast: f32,

    /// Saturation percent (100 = unchanged)
    #[arg(long, default_value_t = FILTER_IDENTITY)]
    saturation: f32,
}

impl From<FilterArgs> for FilterSettings {
    fn from(args: FilterArgs) -> Self {
        FilterSettings::new(args.brightness, args.contrast, args.saturation)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template to an image file
    Render {
        /// Template JSON file
        template: PathBuf,

        /// Caption for an area, as `AREA=TEXT` (AREA is an id or an index)
        #[arg(long = "text", value_name = "AREA=TEXT")]
        texts: Vec<String>,

        /// Replace the template image (URL, data URL or path)
        #[arg(long)]
        image: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Artistic style to apply after rendering
        #[arg(long)]
        style: Option<String>,

        /// Style strength from 0 to 1
        #[arg(long, default_value = "1.0")]
        intensity: f32,

        /// Output file (format from extension)
        #[arg(short, long, default_value = "meme.png")]
        output: PathBuf,
    },

    /// Compose several images into one collage
    Collage {
        /// Cell layout
        #[arg(long, default_value = "grid2x2")]
        layout: String,

        /// Images in cell order
        images: Vec<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Caption centered on the collage
        #[arg(long)]
        caption: Option<String>,

        /// Output file (format from extension)
        #[arg(short, long, default_value = "collage.png")]
        output: PathBuf,
    },

    /// Apply an artistic style to an image
    Stylize {
        /// Input image (URL, data URL or path)
        input: String,

        /// Style name (see `memeforge styles`)
        #[arg(long)]
        style: String,

        /// Style strength from 0 to 1
        #[arg(long, default_value = "1.0")]
        intensity: f32,

        /// Output file (format from extension)
        #[arg(short, long, default_value = "styled.png")]
        output: PathBuf,
    },

    /// List available styles and collage layouts
    Styles,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), MemeforgeError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Styles = cli.command {
        println!("Available styles:");
        for name in LOOKS {
            println!("  {}", name);
        }
        println!("\nAvailable layouts:");
        for name in LAYOUTS {
            println!("  {}", name);
        }
        return Ok(());
    }

    let mut config = EditorConfig::load_or_default(cli.config.as_deref())?;
    if let Some(engine) = &cli.filter_engine {
        config.filter.engine = match engine.to_lowercase().as_str() {
            "css" => FilterEngine::Css,
            "manual" => FilterEngine::Manual,
            other => return Err(MemeforgeError::Config(format!("Unknown filter engine '{}'", other))),
        };
    }
    let fonts = Arc::new(FontRegistry::from_paths(&config.fonts));
    let ctx = RenderContext::with_default_client()?.with_capacity(config.cache.max_images);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(execute(cli.command, config, fonts, ctx))
}

async fn execute(
    command: Commands,
    config: EditorConfig,
    fonts: Arc<FontRegistry>,
    ctx: RenderContext,
) -> Result<(), MemeforgeError> {
    match command {
        Commands::Render {
            template,
            texts,
            image,
            filters,
            style,
            intensity,
            output,
        } => {
            let mut template = Template::from_json(&std::fs::read_to_string(&template)?)?;
            if let Some(image) = image {
                template.image_url = image;
            }
            let captions = texts
                .iter()
                .map(|entry| parse_text_arg(entry, &template))
                .collect::<Result<Vec<_>, _>>()?;
            let mut session = EditingSession::new(Arc::new(template), &config, fonts)?;
            for (area, text) in captions {
                session.set_text(&area, text)?;
            }
            session.set_filters(filters.into());

            let loader = DefaultImageLoader::new(ctx.clone());
            render_ready(&mut session, &loader).await?;

            if let Some(style) = style {
                let engine = config.style.backend.engine(ctx.http_client.clone());
                let outcome = session
                    .apply_style(engine.as_ref(), &style, intensity, config.style.timeout())
                    .await?;
                if let StyleOutcome::Fallback { error, .. } = &outcome {
                    eprintln!("Style not applied: {}", error);
                } else {
                    render_ready(&mut session, &loader).await?;
                }
            }

            write_output(&output, &session.export(format_for(&output)?)?)
        }

        Commands::Collage {
            layout,
            images,
            filters,
            caption,
            output,
        } => {
            let layout = CollageLayout::by_name(&layout).ok_or_else(|| {
                MemeforgeError::Template(format!("Unknown layout '{}'. Run 'memeforge styles'.", layout))
            })?;
            let mut collage = Collage::new(layout);
            for image in images {
                collage.add_image(image)?;
            }
            collage.filters = filters.into();
            if let Some(caption) = caption {
                let center = memeforge::collage::COLLAGE_SIZE as f32 / 2.0;
                collage.content.add_free(caption, center, center, TextStyle::caption());
            }

            let loader = DefaultImageLoader::new(ctx);
            let settings = RenderSettings::from(&config);
            let (canvas, item_errors) = collage.render(&loader, &settings, &fonts).await;
            for item in &item_errors {
                eprintln!("Text not rendered ({}): {}", item.target, item.message);
            }
            canvas
                .save(&output)
                .map_err(|e| MemeforgeError::Encode(format!("Failed to write {}: {}", output.display(), e)))?;
            println!("Saved to {}", output.display());
            Ok(())
        }

        Commands::Stylize {
            input,
            style,
            intensity,
            output,
        } => {
            let loader = DefaultImageLoader::new(ctx.clone());
            let image = loader.load(&input).await?;
            let engine = config.style.backend.engine(ctx.http_client.clone());
            let outcome =
                apply_style_with_timeout(engine.as_ref(), &image, &style, intensity, config.style.timeout()).await;
            let image = match outcome {
                StyleOutcome::Styled(image) => image,
                StyleOutcome::Fallback { error, .. } => return Err(error),
            };
            let format = format_for(&output)?;
            let image = match format {
                image::ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(image.to_rgb8()),
                _ => image,
            };
            image
                .save_with_format(&output, format)
                .map_err(|e| MemeforgeError::Encode(format!("Failed to write {}: {}", output.display(), e)))?;
            println!("Saved to {}", output.display());
            Ok(())
        }

        Commands::Styles => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    if !verbose {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Split `AREA=TEXT` and resolve AREA against the template. A bare number
/// addresses the area by position.
fn parse_text_arg(entry: &str, template: &Template) -> Result<(AreaId, String), MemeforgeError> {
    let (area, text) = entry
        .split_once('=')
        .ok_or_else(|| MemeforgeError::Template(format!("Expected AREA=TEXT, got '{}'", entry)))?;
    let id = template.find_area(area).map(|a| a.id.clone()).ok_or_else(|| {
        let known: Vec<&str> = template.text_areas.iter().map(|a| a.id.as_str()).collect();
        MemeforgeError::Template(format!("No text area '{}' (areas: {})", area, known.join(", ")))
    })?;
    Ok((id, text.replace("\\n", "\n")))
}

async fn render_ready(session: &mut EditingSession, loader: &DefaultImageLoader) -> Result<(), MemeforgeError> {
    let result = session.render(loader).await?;
    if let Some(error) = &result.error {
        return Err(MemeforgeError::Render(error.to_string()));
    }
    for item in &result.item_errors {
        eprintln!("Text not rendered ({}): {}", item.target, item.message);
    }
    Ok(())
}

fn format_for(path: &Path) -> Result<image::ImageFormat, MemeforgeError> {
    image::ImageFormat::from_path(path)
        .map_err(|e| MemeforgeError::Encode(format!("Unknown output format for {}: {}", path.display(), e)))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), MemeforgeError> {
    std::fs::write(path, bytes)?;
    println!("Saved to {}", path.display());
    Ok(())
}
