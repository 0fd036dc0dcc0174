use crate::types::OutputFormat;
use anyhow::Result;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use precos_runtime::DataService;
use precos_types::RegionCode;

pub fn handle_regions(service: &dyn DataService, format: OutputFormat) -> Result<()> {
    let regions = service.get_regions()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&regions)?);
        return Ok(());
    }

    print_header(&format!("{:<8} {}", "CÓDIGO", "REGIÃO"));
    for region in &regions {
        println!("{:<8} {}", region.id, region.name);
    }

    Ok(())
}

pub fn handle_municipalities(
    service: &dyn DataService,
    region: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let region_code = region.map(RegionCode::from);
    let municipalities = service.get_municipalities(region_code.as_ref())?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&municipalities)?);
        return Ok(());
    }

    if municipalities.is_empty() {
        println!("Nenhum município encontrado");
        return Ok(());
    }

    print_header(&format!("{:<10} {:<30} {}", "CÓDIGO", "MUNICÍPIO", "REGIÃO"));
    for municipality in &municipalities {
        println!(
            "{:<10} {:<30} {}",
            municipality.id,
            municipality.name,
            municipality
                .region_id
                .as_ref()
                .map(|r| r.as_str())
                .unwrap_or("-")
        );
    }

    Ok(())
}

fn print_header(header: &str) {
    if std::io::stdout().is_terminal() {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }
}
