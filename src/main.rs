use clap::{Parser, Subcommand};
use rent_choropleth::{build_scene, config, render, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the map, page and charts to disk (the page needs `serve` to be interactive)
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the interactive map
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { config } => {
            println!("Rendering map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let scene = build_scene(&app_config)?;
            render::write_outputs(&scene, &app_config.output.dir)?;

            println!(
                "Render complete! Open the page through `serve` to click and hover; \
                 from disk it is a still picture."
            );
        }
        Commands::Serve { config } => {
            println!("Serving map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let scene = build_scene(&app_config)?;
            server::start_server(app_config, scene).await?;
        }
    }

    Ok(())
}
