use crate::format;
use crate::ui::app::{App, Focus, Screen};
use precos_engine::{ListState, Panel, ResultsState, SortDirection, SortKey};
use precos_types::TerritoryType;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
};

pub fn render(f: &mut Frame, app: &App) {
    match app.screen() {
        Screen::Entry => render_entry(f, app),
        Screen::Results => render_results(f, app),
    }
}

fn focus_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn render_entry(f: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),  // product input
        Constraint::Length(8),  // candidate panel
        Constraint::Min(8),     // territory
        Constraint::Length(3),  // year
        Constraint::Length(3),  // notice + help
    ])
    .split(f.area());

    render_product_input(f, app, chunks[0]);
    render_candidate_panel(f, app, chunks[1]);
    render_territory(f, app, chunks[2]);
    render_year(f, app, chunks[3]);
    render_footer(
        f,
        app,
        chunks[4],
        "Tab foco · Enter selecionar/consultar · Esc sair",
    );
}

fn render_product_input(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.search().selected() {
        Some(product) => format!("Produto ({})", product.unit),
        None => "Produto".to_string(),
    };
    let input = Paragraph::new(app.search().text())
        .style(focus_style(app.focus() == Focus::Product))
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(input, area);
}

fn render_candidate_panel(f: &mut Frame, app: &App, area: Rect) {
    let body: Vec<ListItem> = match app.search().panel() {
        Panel::Closed => Vec::new(),
        Panel::Loading => vec![ListItem::new("Buscando...")],
        Panel::Failed(message) => vec![ListItem::new(Line::from(vec![
            Span::styled(message.clone(), Style::default().fg(Color::Red)),
            Span::raw("  (Ctrl+R tenta novamente)"),
        ]))],
        Panel::Open(candidates) if candidates.is_empty() => {
            vec![ListItem::new("Nenhum produto encontrado")]
        }
        Panel::Open(candidates) => candidates
            .iter()
            .enumerate()
            .map(|(index, product)| {
                let line = format!("{}  [{}]", product.name, product.unit);
                let style = if index == app.panel_cursor() {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            })
            .collect(),
    };

    let panel = List::new(body).block(Block::default().title("Resultados").borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn render_territory(f: &mut Frame, app: &App, area: Rect) {
    let mode = app.territory().mode();
    let mode_line = Line::from(vec![
        mode_span("1 Todo o Estado", mode == TerritoryType::Whole),
        Span::raw("  "),
        mode_span("2 Por Região", mode == TerritoryType::RegionSet),
        Span::raw("  "),
        mode_span("3 Por Município", mode == TerritoryType::MunicipalitySet),
    ]);

    let mut items: Vec<ListItem> = vec![ListItem::new(mode_line), ListItem::new("")];

    match mode {
        TerritoryType::Whole => {}
        TerritoryType::RegionSet => {
            let selection = app.territory().snapshot();
            items.extend(list_items(
                app.territory().regions(),
                app.list_cursor(),
                |region| {
                    let marked = selection.region_codes.contains(&region.id);
                    format!("[{}] {}", if marked { "x" } else { " " }, region.name)
                },
            ));
        }
        TerritoryType::MunicipalitySet => {
            let filter = match app.territory().filter_region() {
                Some(code) => {
                    let name = app
                        .territory()
                        .regions()
                        .items()
                        .iter()
                        .find(|r| &r.id == code)
                        .map(|r| r.name.as_str())
                        .unwrap_or(code.as_str());
                    format!("Filtro (f): {}", name)
                }
                None => "Filtro (f): todas as regiões".to_string(),
            };
            items.push(ListItem::new(filter));
            let selection = app.territory().snapshot();
            items.extend(list_items(
                app.territory().municipalities(),
                app.list_cursor(),
                |municipality| {
                    let marked = selection.municipality_codes.contains(&municipality.id);
                    format!(
                        "[{}] {}",
                        if marked { "x" } else { " " },
                        municipality.name
                    )
                },
            ));
        }
    }

    let list = List::new(items).block(
        Block::default()
            .title("Território")
            .borders(Borders::ALL)
            .border_style(focus_style(app.focus() == Focus::Territory)),
    );
    f.render_widget(list, area);
}

fn mode_span(label: &str, active: bool) -> Span<'_> {
    if active {
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
    } else {
        Span::raw(label)
    }
}

fn list_items<'a, T>(
    state: &'a ListState<T>,
    cursor: usize,
    mut label: impl FnMut(&'a T) -> String,
) -> Vec<ListItem<'a>> {
    match state {
        ListState::NotLoaded => Vec::new(),
        ListState::Loading => vec![ListItem::new("Carregando...")],
        ListState::Failed(message) => vec![ListItem::new(Line::from(vec![
            Span::styled(message.clone(), Style::default().fg(Color::Red)),
            Span::raw("  (r tenta novamente)"),
        ]))],
        ListState::Loaded(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let style = if index == cursor {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                ListItem::new(label(item)).style(style)
            })
            .collect(),
    }
}

fn render_year(f: &mut Frame, app: &App, area: Rect) {
    let year = Paragraph::new(app.year_display())
        .style(focus_style(app.focus() == Focus::Year))
        .block(Block::default().title("Ano (↑/↓)").borders(Borders::ALL));
    f.render_widget(year, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect, help: &str) {
    let line = match app.notice() {
        Some(notice) => Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            help.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    };
    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn render_results(f: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(5), // query summary
        Constraint::Min(8),    // records
        Constraint::Length(3), // notice + help
    ])
    .split(f.area());

    render_summary(f, app, chunks[0]);
    render_records(f, app, chunks[1]);
    render_footer(
        f,
        app,
        chunks[2],
        "d/m/p ordenar · e CSV · u URL · r repetir · Esc voltar · q sair",
    );
}

fn render_summary(f: &mut Frame, app: &App, area: Rect) {
    let lines = match app.presenter().query() {
        Some(query) => vec![
            Line::from(format!("Produto: {} ({})", query.product_name, query.unit)),
            Line::from(format!(
                "Território: {}",
                format::territory_label(query.territory_type())
            )),
            Line::from(format!("Ano: {}", format::year_label(query.year))),
        ],
        None => vec![Line::from("Parâmetros de consulta inválidos")],
    };
    let summary =
        Paragraph::new(lines).block(Block::default().title("Consulta").borders(Borders::ALL));
    f.render_widget(summary, area);
}

fn render_records(f: &mut Frame, app: &App, area: Rect) {
    let (sort_key, sort_dir) = app.presenter().sort();
    let arrow = |key: SortKey| {
        if key != sort_key {
            ""
        } else if sort_dir == SortDirection::Ascending {
            " ↑"
        } else {
            " ↓"
        }
    };

    let title = match app.presenter().state() {
        ResultsState::Loading => "Registros (atualizando...)".to_string(),
        ResultsState::Failed(_) => "Registros (falha na consulta)".to_string(),
        _ if app.presenter().is_empty_result() => "Registros".to_string(),
        _ => format!("Registros ({})", app.presenter().view().len()),
    };

    if app.presenter().is_empty_result() {
        let empty = Paragraph::new("Nenhum registro encontrado")
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from(format!("Data{}", arrow(SortKey::Date))),
        Cell::from(format!("Município{}", arrow(SortKey::Municipality))),
        Cell::from(format!("Preço unitário{}", arrow(SortKey::UnitPrice))),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .presenter()
        .view()
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(format::format_date(record.date)),
                Cell::from(record.municipality.clone()),
                Cell::from(format::format_currency(record.unit_price)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(table, area);
}
