// ABOUTME: Main entry point for the deckforge program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use deckforge::{Config, Generator, PicsumResolver, Presentation, Screen, ScreenController};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deck for a topic and export it as PPTX
    Generate(GenerateArgs),

    /// Export a saved deck (JSON) as PPTX
    Export(ExportArgs),

    /// Run the web app
    Serve(ServeArgs),

    /// Open a saved deck in the web app preview
    Preview(PreviewArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Topic of the presentation
    #[arg(short, long)]
    topic: String,

    /// Directory for the PPTX file
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also save the generated deck as JSON
    #[arg(long)]
    save_json: Option<PathBuf>,

    /// Slide aspect ratio: 16:9 or 4:3
    #[arg(long)]
    aspect_ratio: Option<String>,
}

#[derive(Args)]
struct ExportArgs {
    /// Path to the deck JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Topic used for the file name and document title
    #[arg(short, long)]
    topic: String,

    /// Directory for the PPTX file
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Slide aspect ratio: 16:9 or 4:3
    #[arg(long)]
    aspect_ratio: Option<String>,

    /// Link images by URL instead of downloading them into the file
    #[arg(long)]
    no_embed_images: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Args)]
struct PreviewArgs {
    /// Path to the deck JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Topic shown in the preview header
    #[arg(short, long)]
    topic: String,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

fn build_generator(config: &Config) -> anyhow::Result<Generator> {
    let client = deckforge::GeminiClient::new(config)?;
    Ok(Generator::new(
        Box::new(client),
        config.get_generator_config(None),
    ))
}

fn load_deck(path: &Path) -> anyhow::Result<Presentation> {
    deckforge::utils::validate_file_exists(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read deck file {:?}", path))?;
    let presentation = Presentation::from_json(&text)?;
    Ok(presentation)
}

fn run_generate(args: &GenerateArgs, config: &Config) -> anyhow::Result<()> {
    let generator = build_generator(config)?;
    let mut controller = ScreenController::new(generator);

    controller.submit(&args.topic)?;
    println!("Generating presentation on {:?}...", args.topic.trim());
    controller.wait()?;

    let (topic, presentation) = match controller.screen() {
        Screen::Preview {
            topic,
            presentation,
        } => (topic.clone(), presentation.clone()),
        Screen::Error { message } => anyhow::bail!("{}", message),
        other => anyhow::bail!("Generation ended on the {} screen", other.name()),
    };

    if let Some(json_path) = &args.save_json {
        deckforge::utils::ensure_parent_directory_exists(json_path)?;
        fs::write(json_path, presentation.to_json_pretty()?)
            .with_context(|| format!("Failed to write {:?}", json_path))?;
        println!("Deck saved: {:?}", json_path);
    }

    let pptx_config = config.get_pptx_config(Some(topic.clone()), args.aspect_ratio.clone(), None);
    let resolver = PicsumResolver::new(&pptx_config.image_base_url);
    let path = deckforge::export_to_file(
        &presentation,
        &topic,
        &args.output_dir,
        &pptx_config,
        &resolver,
    )?;
    println!(
        "PPTX generated successfully with {} slides: {:?}",
        presentation.len(),
        path
    );
    Ok(())
}

fn run_export(args: &ExportArgs, config: &Config) -> anyhow::Result<()> {
    let presentation = load_deck(&args.input)?;
    let topic = args.topic.trim();
    if topic.is_empty() {
        return Err(deckforge::DeckError::EmptyTopic.into());
    }

    let embed_images = if args.no_embed_images { Some(false) } else { None };
    let pptx_config =
        config.get_pptx_config(Some(topic.to_string()), args.aspect_ratio.clone(), embed_images);
    let resolver = PicsumResolver::new(&pptx_config.image_base_url);
    let path = deckforge::export_to_file(
        &presentation,
        topic,
        &args.output_dir,
        &pptx_config,
        &resolver,
    )?;
    println!(
        "PPTX generated successfully with {} slides: {:?}",
        presentation.len(),
        path
    );
    Ok(())
}

fn run_serve(args: &ServeArgs, config: &Config) -> anyhow::Result<()> {
    let generator = build_generator(config)?;
    let controller = ScreenController::new(generator);
    let app = deckforge::App::new(controller, config.get_pptx_config(None, None, None));
    deckforge::serve(app, args.port.unwrap_or(config.port))?;
    Ok(())
}

fn run_preview(args: &PreviewArgs, config: &Config) -> anyhow::Result<()> {
    let presentation = load_deck(&args.input)?;
    // Generation stays available when a key is configured
    let generator = build_generator(config).ok();
    let controller = ScreenController::with_presentation(&args.topic, presentation, generator)?;
    let app = deckforge::App::new(controller, config.get_pptx_config(None, None, None));
    deckforge::serve(app, args.port.unwrap_or(config.port))?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match &cli.command {
        Some(Commands::Generate(args)) => run_generate(args, &config),
        Some(Commands::Export(args)) => run_export(args, &config),
        Some(Commands::Serve(args)) => run_serve(args, &config),
        Some(Commands::Preview(args)) => run_preview(args, &config),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
