use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use derivative_generator::access::StaticRoles;
use derivative_generator::models::Config;
use derivative_generator::profile::ORIGINAL;
use derivative_generator::render::RenderService;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "derivative-generator")]
#[command(about = "Render and cache image derivatives by profile")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the URL for an image in a profile.
    Url {
        /// Source image path relative to the source root.
        path: String,
        /// Profile name.
        #[arg(default_value = ORIGINAL)]
        profile: String,
        /// Roles granted to the caller (repeatable).
        #[arg(long = "role", value_name = "ROLE")]
        roles: Vec<String>,
    },
    /// Render an image in a profile, populating the cache.
    Show {
        /// Source image path relative to the source root.
        path: String,
        /// Profile name.
        #[arg(default_value = ORIGINAL)]
        profile: String,
        /// Roles granted to the caller (repeatable).
        #[arg(long = "role", value_name = "ROLE")]
        roles: Vec<String>,
        /// Write the rendered bytes to this file.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "derivative_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match args.command {
        Command::Url {
            path,
            profile,
            roles,
        } => {
            let service = RenderService::from_config(&config, Box::new(StaticRoles::new(roles)))
                .context("Failed to initialize renderer")?;
            println!("{}", service.get_url(&path, &profile).await);
        }
        Command::Show {
            path,
            profile,
            roles,
            output,
        } => {
            let service = RenderService::from_config(&config, Box::new(StaticRoles::new(roles)))
                .context("Failed to initialize renderer")?;
            let rendered = service.show(&path, &profile).await;

            if let Some(reason) = rendered.fallback {
                warn!("Served placeholder for {} ({:?})", path, reason);
            }
            info!(
                "Rendered {} bytes of {} ({:?})",
                rendered.bytes.len(),
                rendered.content_type,
                rendered.origin
            );

            if let Some(output) = output {
                std::fs::write(&output, &rendered.bytes)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                info!("Saved to {}", output.display());
            }
        }
    }

    Ok(())
}
