use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_personalize::{ComposerOptions, Composer, Language};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfp", about = "Personalised PDF composer", version)]
struct Cli {
    /// JSON options file (defaults are used when omitted)
    #[arg(short, long, global = true, env = "PDFP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the personalised document for a client
    Compose {
        /// Client name drawn on the first page
        #[arg(short, long)]
        name: String,

        /// Document language
        #[arg(short, long, default_value = "english", value_enum)]
        language: LanguageArg,

        /// Output PDF file (defaults to <name>_HGS.pdf in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// First-page template PDF
        #[arg(long)]
        template: Option<PathBuf>,

        /// Directory holding the font files
        #[arg(long)]
        font_dir: Option<PathBuf>,

        /// Tail document URL, overriding the configured one for the language
        #[arg(long)]
        tail_url: Option<String>,

        /// Per-attempt fetch timeout in milliseconds (overrides PDF_FETCH_TIMEOUT_MS)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Total fetch attempts (overrides PDF_FETCH_RETRIES)
        #[arg(long)]
        retries: Option<u32>,

        /// Base fetch backoff in milliseconds (overrides PDF_FETCH_BACKOFF_MS)
        #[arg(long)]
        backoff_ms: Option<u64>,
    },

    /// Render the fitted name overlay to a PNG
    RenderName {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "english", value_enum)]
        language: LanguageArg,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        font_dir: Option<PathBuf>,
    },

    /// Write the default options as JSON
    InitConfig {
        #[arg(short, long, default_value = "pdfp.json")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    English,
    Arabic,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::English => Self::English,
            LanguageArg::Arabic => Self::Arabic,
        }
    }
}

async fn load_options(config: Option<&PathBuf>) -> Result<ComposerOptions> {
    let options = match config {
        Some(path) => ComposerOptions::load(path)
            .await
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ComposerOptions::default(),
    };
    Ok(options.with_env_overrides()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compose {
            name,
            language,
            output,
            template,
            font_dir,
            tail_url,
            timeout_ms,
            retries,
            backoff_ms,
        } => {
            let language = Language::from(language);
            let mut options = load_options(cli.config.as_ref()).await?;
            if let Some(template) = template {
                options.template_path = template;
            }
            if let Some(font_dir) = font_dir {
                options.font_dir = font_dir;
            }
            if let Some(url) = tail_url {
                match language {
                    Language::English => options.tails.english_url = url,
                    Language::Arabic => options.tails.arabic_url = url,
                }
            }
            if let Some(timeout_ms) = timeout_ms {
                options.fetch.timeout_ms = timeout_ms;
            }
            if let Some(retries) = retries {
                options.fetch.retries = retries;
            }
            if let Some(backoff_ms) = backoff_ms {
                options.fetch.backoff_ms = backoff_ms;
            }

            let composer = Composer::from_options(options).await?;
            let (path, composed) = match output {
                Some(path) => {
                    let composed = composer.compose(&name, language).await?;
                    pdf_personalize::save_pdf(&composed.bytes, &path).await?;
                    (path, composed)
                }
                None => composer.compose_to_dir(&name, language, ".").await?,
            };

            println!("Composed document:");
            println!("  Pages: {} (1 + {} tail)", composed.page_count, composed.tail_page_count);
            println!(
                "  Page size: {} x {} pt",
                composed.page_size.0, composed.page_size.1
            );
            println!(
                "  Name: {}px at ({}, {}){}",
                composed.name.font_size,
                composed.name.x,
                composed.name.y,
                if composed.name_floor_reached {
                    ", minimum size reached"
                } else {
                    ""
                }
            );
            println!("Saved → {}", path.display());
        }

        Commands::RenderName {
            name,
            language,
            output,
            font_dir,
        } => {
            let mut options = load_options(cli.config.as_ref()).await?;
            if let Some(font_dir) = font_dir {
                options.font_dir = font_dir;
            }

            let composer = Composer::from_options(options).await?;
            let render = composer.render_name(&name, language.into());
            tokio::fs::write(&output, &render.raster.png).await?;
            println!(
                "Rendered {}x{} at {}px → {}",
                render.raster.width,
                render.raster.height,
                render.size,
                output.display()
            );
        }

        Commands::InitConfig { output } => {
            ComposerOptions::default().save(&output).await?;
            println!("Wrote default options → {}", output.display());
        }
    }

    Ok(())
}
