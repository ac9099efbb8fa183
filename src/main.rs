use clap::{Parser, Subcommand};
use spacetraveling::cache::ResponseCache;
use spacetraveling::config::{self, SiteConfig};
use spacetraveling::generate::{self, SiteOptions};
use spacetraveling::output;
use spacetraveling::prismic::{ClientOptions, PrismicClient};
use spacetraveling::source::ContentError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the Prismic access token.
const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Shared flags for commands that talk to the CMS.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the response cache: refetch everything from Prismic
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(about = "Static blog generator for posts kept in Prismic")]
#[command(long_about = "\
Static blog generator for posts kept in Prismic

Fetches every post of the configured Prismic repository and writes a static
site: a listing that loads more posts in place, one page per post with
reading time, edit note, previous/next links and comments, and a 404 page.

Output structure:

  dist/
  ├── index.html                   # First listing page
  ├── feed/2.html                  # Further listing pages (\"Carregar mais posts\")
  ├── post/<uid>/index.html        # One page per post
  ├── 404.html
  └── ...                          # Everything under assets/

The Prismic access token, if the repository needs one, is read from the
PRISMIC_ACCESS_TOKEN environment variable. Log verbosity follows RUST_LOG.

Run 'spacetraveling gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for the CMS response cache
    #[arg(long, default_value = ".spacetraveling-cache", global = true)]
    cache_dir: PathBuf,

    /// Read drafts from this Prismic preview ref instead of published content
    #[arg(long, global = true)]
    preview_ref: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all posts and write the static site
    Build(CacheArgs),
    /// Fetch and validate all posts without writing anything
    Check(CacheArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        Command::Build(cache_args) => {
            let site_config = config::load_config(&cli.config)?;
            let client = connect(&cli, &site_config, cache_args).await?;

            println!("==> Building {} → {}", site_config.cms.endpoint, cli.output.display());
            let assets_dir = resolve_assets_dir(&cli.config, &site_config);
            let options = SiteOptions {
                config: &site_config,
                assets_dir: Some(&assets_dir),
                preview: client.is_preview(),
            };
            let (content, written) = generate::build(&client, &options, &cli.output).await?;
            output::print_build_output(&content, &written);
            save_cache(client, &cli.cache_dir)?;

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check(cache_args) => {
            let site_config = config::load_config(&cli.config)?;
            let client = connect(&cli, &site_config, cache_args).await?;

            println!("==> Checking {}", site_config.cms.endpoint);
            let content = generate::collect(&client, site_config.cms.page_size).await?;
            output::print_check_output(&content);
            save_cache(client, &cli.cache_dir)?;

            if content.not_found.is_empty() {
                println!("==> Content is valid");
            } else {
                println!(
                    "==> {} listed post(s) cannot be rendered",
                    content.not_found.len()
                );
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build a Prismic client with the response cache for this run.
///
/// Preview builds never use the cache; `--no-cache` starts from an empty one.
async fn connect(
    cli: &Cli,
    site_config: &SiteConfig,
    cache_args: &CacheArgs,
) -> Result<PrismicClient, ContentError> {
    let max_age = site_config.cms.revalidate();
    let cache = match (&cli.preview_ref, cache_args.no_cache) {
        (Some(_), _) => None,
        (None, true) => Some(ResponseCache::empty(max_age)),
        (None, false) => Some(ResponseCache::load(&cli.cache_dir, max_age)),
    };
    let options = ClientOptions {
        endpoint: site_config.cms.endpoint.clone(),
        document_type: site_config.cms.document_type.clone(),
        access_token: std::env::var(ACCESS_TOKEN_ENV).ok(),
        preview_ref: cli.preview_ref.clone(),
    };
    PrismicClient::connect(options, cache).await
}

fn save_cache(client: PrismicClient, cache_dir: &Path) -> std::io::Result<()> {
    if let Some(mut cache) = client.into_cache() {
        let stats = *cache.stats();
        cache.save(cache_dir, chrono::Utc::now())?;
        println!("Cache: {}", stats);
    }
    Ok(())
}

/// The assets directory is relative to the config file.
fn resolve_assets_dir(config_path: &Path, site_config: &SiteConfig) -> PathBuf {
    config_path
        .parent()
        .unwrap_or(Path::new("."))
        .join(&site_config.site.assets_dir)
}
