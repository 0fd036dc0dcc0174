use chrono::NaiveDate;
use precos_types::TerritoryType;

/// pt-BR currency: dot-grouped thousands, comma decimals, two fraction
/// digits.
pub fn format_currency(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let whole = cents / 100;
    let fraction = (cents % 100).abs();
    format!("R$ {},{:02}", group_thousands(whole), fraction)
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn territory_label(territory_type: TerritoryType) -> &'static str {
    match territory_type {
        TerritoryType::Whole => "Todo o Estado",
        TerritoryType::RegionSet => "Por Região",
        TerritoryType::MunicipalitySet => "Por Município",
    }
}

pub fn year_label(year: Option<i32>) -> String {
    match year {
        Some(year) => year.to_string(),
        None => "todos os anos".to_string(),
    }
}
