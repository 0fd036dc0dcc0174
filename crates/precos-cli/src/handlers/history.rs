use crate::format;
use crate::types::{OutputFormat, SortField};
use anyhow::Result;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use precos_engine::{ResultsPresenter, SortDirection, SortKey, assemble};
use precos_runtime::DataService;
use precos_types::{PriceRecord, ProductId, TerritorySelection, TerritoryType};
use std::path::PathBuf;

pub struct HistoryArgs {
    pub product: String,
    pub regions: Option<Vec<String>>,
    pub municipalities: Option<Vec<String>>,
    pub year: Option<String>,
    pub sort: SortField,
    pub desc: bool,
    pub csv: Option<PathBuf>,
    pub url: bool,
}

/// One-shot price history: same assembler and presenter as the
/// interactive flow, driven by flags instead of keystrokes.
pub fn handle(service: &dyn DataService, args: HistoryArgs, format: OutputFormat) -> Result<()> {
    let product = service.get_product(&ProductId::from(args.product.as_str()))?;
    let selection = build_selection(&args);
    let query = assemble(
        Some(&product),
        &selection,
        args.year.as_deref().unwrap_or(""),
    )?;

    if args.url {
        println!("{}", service.export_url(&query));
        return Ok(());
    }

    let mut presenter = ResultsPresenter::new();
    presenter.navigate(Some(query.clone()))?;
    let records = service.get_price_history(&query)?;
    presenter.apply_records(&query, Ok(records));
    set_sort(&mut presenter, args.sort.as_key(), args.desc);
    let rows = presenter.view();

    if let Some(path) = &args.csv {
        write_csv(path, &rows)?;
        println!("{} registros gravados em {}", rows.len(), path.display());
        return Ok(());
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Produto: {} ({})", query.product_name, query.unit);
    println!(
        "Território: {}",
        format::territory_label(query.territory_type())
    );
    println!("Ano: {}", format::year_label(query.year));
    println!();

    if presenter.is_empty_result() {
        println!("Nenhum registro encontrado");
        return Ok(());
    }

    let header = format!(
        "{:<12} {:<25} {:>15}",
        "DATA", "MUNICÍPIO", "PREÇO UNITÁRIO"
    );
    if std::io::stdout().is_terminal() {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }
    for row in &rows {
        println!(
            "{:<12} {:<25} {:>15}",
            format::format_date(row.date),
            row.municipality,
            format::format_currency(row.unit_price)
        );
    }
    println!();
    println!("{} registros", rows.len());

    Ok(())
}

fn build_selection(args: &HistoryArgs) -> TerritorySelection {
    if let Some(codes) = &args.municipalities {
        TerritorySelection {
            territory_type: TerritoryType::MunicipalitySet,
            region_codes: Default::default(),
            municipality_codes: codes.iter().map(|c| c.as_str().into()).collect(),
        }
    } else if let Some(codes) = &args.regions {
        TerritorySelection {
            territory_type: TerritoryType::RegionSet,
            region_codes: codes.iter().map(|c| c.as_str().into()).collect(),
            municipality_codes: Default::default(),
        }
    } else {
        TerritorySelection::whole()
    }
}

/// Walk the presenter's toggle protocol to the requested key and
/// direction, wherever it currently stands.
fn set_sort(presenter: &mut ResultsPresenter, key: SortKey, descending: bool) {
    if presenter.sort().0 != key {
        presenter.toggle_sort(key);
    }
    let wanted = if descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    if presenter.sort().1 != wanted {
        presenter.toggle_sort(key);
    }
}

fn write_csv(path: &PathBuf, rows: &[&PriceRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "id",
        "produto",
        "unidade",
        "data",
        "municipio",
        "preco_unitario",
    ])?;
    for row in rows {
        writer.write_record([
            row.id.as_str(),
            row.product_name.as_str(),
            row.unit.as_str(),
            &format::format_date(row.date),
            row.municipality.as_str(),
            &format!("{:.2}", row.unit_price),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_sort_reaches_every_combination_from_default() {
        for key in [SortKey::Date, SortKey::Municipality, SortKey::UnitPrice] {
            for descending in [false, true] {
                let mut presenter = ResultsPresenter::new();
                set_sort(&mut presenter, key, descending);
                let wanted = if descending {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                assert_eq!(presenter.sort(), (key, wanted));
            }
        }
    }

    #[test]
    fn test_municipality_flags_win_over_nothing() {
        let args = HistoryArgs {
            product: "109001".to_string(),
            regions: None,
            municipalities: Some(vec!["3106200".to_string()]),
            year: None,
            sort: SortField::Date,
            desc: false,
            csv: None,
            url: false,
        };

        let selection = build_selection(&args);
        assert_eq!(selection.territory_type, TerritoryType::MunicipalitySet);
        assert_eq!(selection.municipality_codes.len(), 1);
    }
}
