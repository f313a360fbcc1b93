//! menu-sync CLI
//!
//! ```text
//! menu-sync list    [--include-inactive] [--target local|remote]
//! menu-sync export  [--restaurant <slug>|all] [--output-dir <dir>] [--include-inactive]
//! menu-sync import  <file> [--target local|remote] [--policy overwrite|skip] [--dry-run]
//! menu-sync compare --source <local|remote|file:PATH> --target <...> [--restaurants <slug>...]
//! menu-sync migrate [--status] [--target local|remote]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use menu_sync::compare::{self, CompareOptions, Source};
use menu_sync::export::{self, ExportOptions};
use menu_sync::import::{self, ConflictPolicy, ImportOptions, WriteMode};
use menu_sync::{Config, SyncError, Target, db, report};
use shared::error::{AppError, EXIT_FATAL, EXIT_OK};

#[derive(Parser)]
#[command(name = "menu-sync", version, about = "Export, import and compare restaurant data")]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DbArgs {
    /// Configured database to use
    #[arg(long, value_enum, default_value_t = Target::Local)]
    target: Target,

    /// Connection URL, overriding the target's environment variable
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List restaurants available for export
    List {
        #[arg(long)]
        include_inactive: bool,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Export one restaurant, or all of them, to a JSON document
    Export {
        /// Restaurant slug, or "all"
        #[arg(short, long, default_value = "all")]
        restaurant: String,
        /// Output directory (default: BACKUP_DIR, else the current directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Output file name (default: <slug>_export_<timestamp>.json)
        #[arg(short, long)]
        filename: Option<String>,
        /// Include inactive restaurants, categories, ingredients and unavailable items
        #[arg(long)]
        include_inactive: bool,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Import an export document into a database
    Import {
        /// Export document
        file: PathBuf,
        /// What to do when a stored row differs from the document
        #[arg(long, value_enum, default_value_t = ConflictPolicy::Overwrite)]
        policy: ConflictPolicy,
        /// Apply every bundle inside its transaction, then roll back
        #[arg(long)]
        dry_run: bool,
        /// Apply schema migrations before importing
        #[arg(long)]
        migrate: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Compare two databases or export documents
    Compare {
        /// Left side: local, remote or file:PATH
        #[arg(long, default_value = "local")]
        source: String,
        /// URL for a database left side
        #[arg(long)]
        source_url: Option<String>,
        /// Right side: local, remote or file:PATH
        #[arg(long, default_value = "remote")]
        target: String,
        /// URL for a database right side
        #[arg(long)]
        target_url: Option<String>,
        /// Restrict the comparison to these slugs
        #[arg(long = "restaurants", alias = "slug", num_args = 1..)]
        restaurants: Vec<String>,
        #[arg(long)]
        include_inactive: bool,
        /// Print every field difference
        #[arg(short, long)]
        verbose: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply schema migrations
    Migrate {
        /// Show applied and pending migrations without applying anything
        #[arg(long)]
        status: bool,
        /// Print the status as JSON (with --status)
        #[arg(long, requires = "status")]
        json: bool,
        #[command(flatten)]
        db: DbArgs,
    },
}

fn main() -> ExitCode {
    // Load .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing (stderr; stdout carries reports)
    let default_filter = if cli.debug {
        "menu_sync=debug,shared=debug"
    } else {
        "menu_sync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => return fail(e),
    };
    tracing::debug!(environment = %config.environment, "Configuration loaded");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    match runtime.block_on(run(cli.command, &config)) {
        Ok(status) => ExitCode::from(status),
        Err(e) => fail(e),
    }
}

fn fail(e: SyncError) -> ExitCode {
    let error = AppError::from(e);
    error.log();
    eprintln!("error {}: {}", error.code, error.message);
    ExitCode::from(error.exit_status())
}

async fn run(command: Command, config: &Config) -> Result<u8, SyncError> {
    match command {
        Command::List { include_inactive, db: args } => {
            let target = config.database(args.target, args.database_url.as_deref())?;
            let pool = db::connect(&target).await?;
            let restaurants = export::list_restaurants(&pool, include_inactive).await?;
            pool.close().await;
            print!("{}", report::render_restaurants(&restaurants));
            Ok(EXIT_OK)
        }

        Command::Export {
            restaurant,
            output_dir,
            filename,
            include_inactive,
            db: args,
        } => {
            let target = config.database(args.target, args.database_url.as_deref())?;
            let options = ExportOptions { include_inactive };
            let dir = output_dir.unwrap_or_else(|| config.backup_dir.clone());
            let now = chrono::Local::now().naive_local();

            let pool = db::connect(&target).await?;
            let path = if restaurant == "all" {
                let doc = export::export_all(&pool, &options).await?;
                let name = filename.unwrap_or_else(|| export::export_file_name(None, now));
                let path = export::write_document(&dir, &name, &doc).await?;
                println!("Exported {} restaurant(s) to {}", doc.restaurants.len(), path.display());
                path
            } else {
                let doc = export::export_restaurant(&pool, &restaurant, &options).await?;
                let name =
                    filename.unwrap_or_else(|| export::export_file_name(Some(restaurant.as_str()), now));
                let path = export::write_document(&dir, &name, &doc).await?;
                println!(
                    "Exported {} ({} categories, {} items, {} ingredients) to {}",
                    restaurant,
                    doc.bundle.categories.len(),
                    doc.bundle.items.len(),
                    doc.bundle.ingredients.len(),
                    path.display()
                );
                path
            };
            pool.close().await;
            tracing::debug!(path = %path.display(), "Export complete");
            Ok(EXIT_OK)
        }

        Command::Import {
            file,
            policy,
            dry_run,
            migrate,
            json,
            db: args,
        } => {
            let target = config.database(args.target, args.database_url.as_deref())?;
            let options = ImportOptions {
                policy,
                mode: if dry_run {
                    WriteMode::DryRun
                } else {
                    WriteMode::Commit
                },
            };
            let result = import::import_file(&target, &file, &options, migrate).await?;
            if json {
                println!("{}", to_json(&result)?);
            } else {
                print!("{}", report::render_import(&result));
            }
            Ok(result.exit_status())
        }

        Command::Compare {
            source,
            source_url,
            target,
            target_url,
            restaurants,
            include_inactive,
            verbose,
            json,
        } => {
            let left = parse_source(config, &source, source_url.as_deref())?;
            let right = parse_source(config, &target, target_url.as_deref())?;
            let options = CompareOptions {
                slugs: restaurants,
                include_inactive,
            };
            let result = compare::compare(&left, &right, &options).await?;
            if json {
                println!("{}", to_json(&result)?);
            } else {
                print!("{}", report::render_comparison(&result, verbose));
            }
            Ok(result.exit_status())
        }

        Command::Migrate {
            status,
            json,
            db: args,
        } => {
            let target = config.database(args.target, args.database_url.as_deref())?;
            let pool = db::connect(&target).await?;
            if status {
                let statuses = db::migration_status(&pool).await?;
                pool.close().await;
                if json {
                    println!("{}", to_json(&statuses)?);
                } else {
                    print!("{}", report::render_migrations(&target.label, &statuses));
                }
            } else {
                db::migrate(&pool).await?;
                pool.close().await;
                println!("Migrations applied to {}", target.label);
            }
            Ok(EXIT_OK)
        }
    }
}

/// `local`, `remote` or `file:PATH`
fn parse_source(config: &Config, arg: &str, url: Option<&str>) -> Result<Source, SyncError> {
    if let Some(path) = arg.strip_prefix("file:") {
        return Ok(Source::Document(PathBuf::from(path)));
    }
    let target: Target = arg.parse()?;
    Ok(Source::Database(config.database(target, url)?))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, SyncError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| SyncError::validation(format!("failed to encode report: {e}")))
}
