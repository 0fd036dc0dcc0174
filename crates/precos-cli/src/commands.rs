use crate::args::{Cli, Commands};
use crate::handlers;
use crate::types::LogLevel;
use anyhow::Result;
use precos_runtime::{Config, DataService, FixtureService, resolve_config_path};
use std::sync::Arc;

pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    if cli.log_level >= LogLevel::Debug {
        let path = resolve_config_path(cli.config.as_deref())?;
        eprintln!("config: {}", path.display());
        eprintln!(
            "service: {}",
            match &config.data_dir {
                Some(dir) => format!("fixture dataset at {}", dir.display()),
                None => "built-in sample dataset".to_string(),
            }
        );
    }

    let service = build_service(&config)?;

    match cli.command.unwrap_or(Commands::Query) {
        Commands::Query => handlers::query::handle(service, &config),

        Commands::Products { term } => {
            handlers::products::handle(service.as_ref(), &term, cli.format)
        }

        Commands::Regions => handlers::territories::handle_regions(service.as_ref(), cli.format),

        Commands::Municipalities { region } => handlers::territories::handle_municipalities(
            service.as_ref(),
            region.as_deref(),
            cli.format,
        ),

        Commands::History {
            product,
            regions,
            municipalities,
            year,
            sort,
            desc,
            csv,
            url,
        } => handlers::history::handle(
            service.as_ref(),
            handlers::history::HistoryArgs {
                product,
                regions,
                municipalities,
                year,
                sort,
                desc,
                csv,
                url,
            },
            cli.format,
        ),
    }
}

fn build_service(config: &Config) -> Result<Arc<dyn DataService>> {
    let fixture = match &config.data_dir {
        Some(dir) => FixtureService::from_dir(dir)?,
        None => FixtureService::sample(),
    };
    Ok(Arc::new(
        fixture.with_export_base(config.export_base_url.as_str()),
    ))
}
