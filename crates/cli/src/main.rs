//! gishn CLI - spectral index and credential helpers for Earth Engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ndarray::Array2;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use gishn_auth::{bootstrap, default_credentials_path, EnvToken, TOKEN_VAR};
use gishn_core::{Catalogs, DEFAULT_PLATFORM};
use gishn_imagery::{
    apply_scale_factors_l8, index_info, mask_s2_clouds, spectral_indices, ImageHandle, LazyImage,
    ParamResolver, RasterImage,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "gishn")]
#[command(author, version, about = "Spectral index helpers for Earth Engine", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding spectral_indices.json, spectral_constants.json and
    /// spectral_bands.json (bundled catalogs when omitted)
    #[arg(long, global = true, env = "GISHN_CATALOG_DIR")]
    catalog_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Earth Engine credentials
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Spectral index lookup, resolution and evaluation
    Index {
        #[command(subcommand)]
        action: IndexCommands,
    },
    /// Catalog inspection
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },
}

// ─── Auth subcommands ───────────────────────────────────────────────────

#[derive(Subcommand)]
enum AuthCommands {
    /// Write the Earth Engine credentials file from an environment variable
    Bootstrap {
        /// Variable holding a refresh token or OAuth client JSON
        #[arg(long, default_value = TOKEN_VAR)]
        var: String,
        /// Output file (default: ~/.config/earthengine/credentials)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

// ─── Index subcommands ──────────────────────────────────────────────────

#[derive(Subcommand)]
enum IndexCommands {
    /// Print catalog properties of spectral indices
    Info {
        /// Index names, e.g. NDVI EVI
        #[arg(required = true)]
        indices: Vec<String>,
        /// Properties to show (repeatable); default: formula
        #[arg(short, long = "property")]
        properties: Vec<String>,
    },
    /// Resolve index parameters against an image asset, as JSON
    Params {
        #[arg(required = true)]
        indices: Vec<String>,
        /// Image asset id
        #[arg(long, default_value = "image")]
        asset: String,
        /// Platform key in the bands catalog
        #[arg(long, default_value = DEFAULT_PLATFORM)]
        platform: String,
    },
    /// Build the expression graph computing indices on an image asset, as JSON
    Graph {
        #[arg(required = true)]
        indices: Vec<String>,
        /// Image asset id
        #[arg(long)]
        asset: String,
        #[arg(long, default_value = DEFAULT_PLATFORM)]
        platform: String,
        /// Mask Sentinel-2 clouds before computing
        #[arg(long)]
        mask_clouds: bool,
        /// Apply Landsat 8 scale factors before computing
        #[arg(long)]
        scale_l8: bool,
    },
    /// Evaluate indices locally for one pixel
    Eval {
        #[arg(required = true)]
        indices: Vec<String>,
        /// Platform band value as CODE=VALUE, e.g. B8=0.8 (repeatable)
        #[arg(short, long = "band", required = true)]
        bands: Vec<String>,
        #[arg(long, default_value = DEFAULT_PLATFORM)]
        platform: String,
    },
}

// ─── Catalog subcommands ────────────────────────────────────────────────

#[derive(Subcommand)]
enum CatalogCommands {
    /// List index names with their long names
    List,
    /// Report index parameters missing from both constants and bands
    Check,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn load_catalogs(dir: Option<&PathBuf>) -> Result<Catalogs> {
    match dir {
        Some(dir) => Catalogs::from_dir(dir)
            .with_context(|| format!("Failed to load catalogs from {}", dir.display())),
        None => {
            debug!("Using bundled catalogs");
            Catalogs::bundled().context("Failed to parse bundled catalogs")
        }
    }
}

fn parse_band_value(s: &str) -> Result<(String, f64)> {
    let (code, value) = s
        .split_once('=')
        .with_context(|| format!("Band must be 'CODE=VALUE', got: {}", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for band {}", code))?;
    Ok((code.trim().to_string(), value))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Auth ─────────────────────────────────────────────────────
        Commands::Auth { action } => match action {
            AuthCommands::Bootstrap { var, path } => {
                let path = match path {
                    Some(p) => p,
                    None => default_credentials_path()?,
                };
                let creds = bootstrap(&EnvToken::new(&var), &path)
                    .with_context(|| format!("Failed to bootstrap credentials from {}", var))?;
                if let Some(project) = &creds.quota_project_id {
                    info!("Quota project: {}", project);
                }
                println!("Credentials saved to: {}", path.display());
            }
        },

        // ── Index ────────────────────────────────────────────────────
        Commands::Index { action } => {
            let catalogs = load_catalogs(cli.catalog_dir.as_ref())?;

            match action {
                IndexCommands::Info {
                    indices,
                    properties,
                } => {
                    let props: Vec<&str> = properties.iter().map(String::as_str).collect();
                    for info in index_info(&catalogs, indices, &props)? {
                        println!("{}", info);
                    }
                }

                IndexCommands::Params {
                    indices,
                    asset,
                    platform,
                } => {
                    let img = LazyImage::load(&asset);
                    let params = ParamResolver::new(&catalogs)
                        .with_platform(platform)
                        .resolve(indices, &img)
                        .context("Failed to resolve index parameters")?;
                    print_json(&serde_json::to_value(&params)?)?;
                }

                IndexCommands::Graph {
                    indices,
                    asset,
                    platform,
                    mask_clouds,
                    scale_l8,
                } => {
                    let mut img = LazyImage::load(&asset);
                    if scale_l8 {
                        img = apply_scale_factors_l8(&img);
                    }
                    if mask_clouds {
                        img = mask_s2_clouds(&img);
                    }
                    let resolver = ParamResolver::new(&catalogs).with_platform(platform);
                    let out = spectral_indices(&resolver, img, indices)
                        .context("Failed to build index graph")?;
                    print_json(&out.to_json()?)?;
                }

                IndexCommands::Eval {
                    indices,
                    bands,
                    platform,
                } => {
                    let mut img = RasterImage::new(1, 1);
                    for spec in &bands {
                        let (code, value) = parse_band_value(spec)?;
                        img = img.with_band(&code, Array2::from_elem((1, 1), value))?;
                    }
                    let resolver = ParamResolver::new(&catalogs).with_platform(platform);
                    let out = spectral_indices(&resolver, img, &indices[..])
                        .context("Failed to evaluate indices")?;
                    for name in &indices {
                        let value = out.select(name)?[[0, 0]];
                        println!("{}: {:.6}", name, value);
                    }
                }
            }
        }

        // ── Catalog ──────────────────────────────────────────────────
        Commands::Catalog { action } => {
            let catalogs = load_catalogs(cli.catalog_dir.as_ref())?;

            match action {
                CatalogCommands::List => {
                    for (name, record) in &catalogs.indices {
                        println!("{:<10} {}", name, record.long_name.as_deref().unwrap_or(""));
                    }
                }
                CatalogCommands::Check => {
                    let dangling = catalogs.dangling_parameters();
                    if dangling.is_empty() {
                        println!(
                            "OK: {} indices, {} constants, {} bands",
                            catalogs.indices.len(),
                            catalogs.constants.len(),
                            catalogs.bands.len()
                        );
                    } else {
                        for (index, params) in &dangling {
                            println!("{}: unknown parameters {}", index, params.join(", "));
                        }
                        anyhow::bail!("{} indices reference unknown parameters", dangling.len());
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_band_value() {
        assert_eq!(parse_band_value("B8=0.8").unwrap(), ("B8".to_string(), 0.8));
        assert_eq!(parse_band_value(" B4 = 0.2 ").unwrap(), ("B4".to_string(), 0.2));
        assert!(parse_band_value("B8").is_err());
        assert!(parse_band_value("B8=abc").is_err());
    }

    #[test]
    fn test_cli_parses_eval() {
        let cli = Cli::try_parse_from([
            "gishn", "index", "eval", "NDVI", "--band", "B8=0.8", "-b", "B4=0.2",
        ])
        .unwrap();
        match cli.command {
            Commands::Index {
                action: IndexCommands::Eval { indices, bands, platform },
            } => {
                assert_eq!(indices, vec!["NDVI"]);
                assert_eq!(bands.len(), 2);
                assert_eq!(platform, DEFAULT_PLATFORM);
            }
            _ => panic!("expected index eval"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
