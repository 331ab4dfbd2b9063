use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use snk_schemas::{Location, Snack};

mod client;

use client::DaemonClient;

#[derive(Parser)]
#[command(name = "snk")]
#[command(about = "SnackInventory CLI", long_about = None)]
struct Cli {
    /// Daemon base URL
    #[arg(
        long,
        global = true,
        env = "SNK_ADDRESS",
        default_value = "http://127.0.0.1:10000"
    )]
    address: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a snack
    #[command(name = "createsnack")]
    CreateSnack {
        #[arg(long)]
        barcode: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        brand: String,
    },

    /// List every registered snack
    #[command(name = "listsnacks")]
    ListSnacks,

    /// Replace a snack's name and brand
    #[command(name = "updatesnack")]
    UpdateSnack {
        #[arg(long)]
        barcode: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        brand: String,
    },

    /// Remove a snack and everything stocked under it
    #[command(name = "deletesnack")]
    DeleteSnack {
        #[arg(long)]
        barcode: String,
    },

    /// Register a location
    #[command(name = "createlocation")]
    CreateLocation {
        #[arg(long)]
        name: String,
    },

    /// List every registered location
    #[command(name = "listlocations")]
    ListLocations,

    /// Rename a location; its contents move with it
    #[command(name = "updatelocation")]
    UpdateLocation {
        #[arg(long)]
        name: String,
        #[arg(long)]
        new_name: String,
    },

    /// Remove a location and everything stocked there
    #[command(name = "deletelocation")]
    DeleteLocation {
        #[arg(long)]
        name: String,
    },

    /// Add one unit of a snack to a location (auto-registers both)
    #[command(name = "addsnack")]
    AddSnack {
        #[arg(long)]
        snack_barcode: String,
        #[arg(long)]
        location: String,
    },

    /// Show stocked snacks, optionally for one location
    #[command(name = "listcontents")]
    ListContents {
        #[arg(long)]
        location: Option<String>,
    },

    /// Database commands (talk to Postgres directly via SNK_DATABASE_URL)
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply embedded SQL migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let connect = || DaemonClient::new(&cli.address, Duration::from_secs(cli.timeout));

    match cli.cmd {
        Commands::CreateSnack {
            barcode,
            name,
            brand,
        } => {
            connect()?
                .create_snack(Snack {
                    barcode,
                    name,
                    brand,
                })
                .await
                .context("could not create snack")?;
            println!("Successfully created snack!");
        }

        Commands::ListSnacks => {
            let snacks = connect()?
                .list_snacks()
                .await
                .context("could not list snacks")?;
            print_json(&snacks)?;
        }

        Commands::UpdateSnack {
            barcode,
            name,
            brand,
        } => {
            connect()?
                .update_snack(Snack {
                    barcode,
                    name,
                    brand,
                })
                .await
                .context("could not update snack")?;
            println!("Successfully updated snack!");
        }

        Commands::DeleteSnack { barcode } => {
            connect()?
                .delete_snack(barcode)
                .await
                .context("could not delete snack")?;
            println!("Successfully deleted snack!");
        }

        Commands::CreateLocation { name } => {
            connect()?
                .create_location(Location { name })
                .await
                .context("could not create location")?;
            println!("Successfully created location!");
        }

        Commands::ListLocations => {
            let locations = connect()?
                .list_locations()
                .await
                .context("could not list locations")?;
            print_json(&locations)?;
        }

        Commands::UpdateLocation { name, new_name } => {
            connect()?
                .update_location(name, new_name)
                .await
                .context("could not update location")?;
            println!("Successfully updated location!");
        }

        Commands::DeleteLocation { name } => {
            connect()?
                .delete_location(name)
                .await
                .context("could not delete location")?;
            println!("Successfully deleted location!");
        }

        Commands::AddSnack {
            snack_barcode,
            location,
        } => {
            let resp = connect()?
                .add_snack(snack_barcode, location)
                .await
                .context("could not add snack to location")?;
            let flags = format!(
                "snack_created={} location_created={}",
                resp.snack_created, resp.location_created
            );
            if let Some(err) = resp.error {
                // Parent rows created before the failure stay; report them.
                eprintln!("{flags}");
                anyhow::bail!("could not add snack to location: {}: {}", err.code, err.error);
            }
            println!("Successfully added snack to location!");
            println!("{flags}");
        }

        Commands::ListContents { location } => {
            let contents = connect()?
                .list_contents(location)
                .await
                .context("could not list contents")?;
            print_json(&contents)?;
        }

        Commands::Db { cmd } => {
            let pool = snk_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = snk_db::status(&pool).await?;
                    println!("db_ok={} has_contents_table={}", s.ok, s.has_contents_table);
                }
                DbCmd::Migrate => {
                    snk_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
