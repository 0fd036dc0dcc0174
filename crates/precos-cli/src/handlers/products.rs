use crate::types::OutputFormat;
use anyhow::Result;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use precos_runtime::DataService;

pub fn handle(service: &dyn DataService, term: &str, format: OutputFormat) -> Result<()> {
    let products = service.search_products(term)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("Nenhum produto encontrado para \"{}\"", term);
        return Ok(());
    }

    let header = format!("{:<10} {:<40} {}", "ID", "PRODUTO", "UNIDADE");
    if std::io::stdout().is_terminal() {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }
    for product in &products {
        println!("{:<10} {:<40} {}", product.id, product.name, product.unit);
    }

    Ok(())
}
