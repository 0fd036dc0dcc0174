use crate::format;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use precos_engine::{Panel, ProductSearch, ResultsPresenter, ResultsState, SortKey, TerritorySelector};
use precos_runtime::{AppEvent, Config, DataService, Dispatcher};
use precos_types::{RegionCode, TerritoryType};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Entry,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Product,
    Territory,
    Year,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Product => Focus::Territory,
            Focus::Territory => Focus::Year,
            Focus::Year => Focus::Product,
        }
    }
}

/// Controller of the interactive session. Owns the engine state
/// machines and the dispatcher; key presses and [`AppEvent`]s come in,
/// the renderer reads the state back out.
pub struct App {
    screen: Screen,
    focus: Focus,
    search: ProductSearch,
    territory: TerritorySelector,
    presenter: ResultsPresenter,
    years: Vec<i32>,
    year_index: Option<usize>,
    panel_cursor: usize,
    list_cursor: usize,
    notice: Option<String>,
    dispatcher: Dispatcher,
    service: Arc<dyn DataService>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, dispatcher: Dispatcher, service: Arc<dyn DataService>) -> Self {
        Self {
            screen: Screen::Entry,
            focus: Focus::Product,
            search: ProductSearch::with_debounce(config.debounce_ms),
            territory: TerritorySelector::new(),
            presenter: ResultsPresenter::new(),
            years: config.years.clone(),
            year_index: None,
            panel_cursor: 0,
            list_cursor: 0,
            notice: None,
            dispatcher,
            service,
            should_quit: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn search(&self) -> &ProductSearch {
        &self.search
    }

    pub fn territory(&self) -> &TerritorySelector {
        &self.territory
    }

    pub fn presenter(&self) -> &ResultsPresenter {
        &self.presenter
    }

    pub fn panel_cursor(&self) -> usize {
        self.panel_cursor
    }

    pub fn list_cursor(&self) -> usize {
        self.list_cursor
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn year_text(&self) -> String {
        match self.year_index {
            Some(index) => self.years[index].to_string(),
            None => String::new(),
        }
    }

    pub fn year_display(&self) -> String {
        match self.year_index {
            Some(index) => self.years[index].to_string(),
            None => format::year_label(None),
        }
    }

    /// A fetch completion or debounce elapse from the dispatcher.
    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::DebounceElapsed { generation } => {
                if let Some(request) = self.search.debounce_elapsed(generation) {
                    self.dispatcher.lookup_products(request);
                }
            }
            AppEvent::ProductsResolved { token, result } => {
                if self.search.apply_lookup(token, result) {
                    self.panel_cursor = 0;
                }
            }
            AppEvent::RegionsResolved { token, result } => {
                self.territory.apply_regions(token, result);
            }
            AppEvent::MunicipalitiesResolved { token, result } => {
                if self.territory.apply_municipalities(token, result) {
                    self.clamp_list_cursor();
                }
            }
            AppEvent::PricesResolved { query, result } => {
                if self.presenter.apply_records(&query, result)
                    && let ResultsState::Failed(message) = self.presenter.state()
                {
                    self.notice = Some(message.clone());
                }
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        self.notice = None;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Entry => self.on_entry_key(key),
            Screen::Results => self.on_results_key(key),
        }
    }

    fn on_entry_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
            }
            KeyCode::Enter => {
                if self.focus == Focus::Product
                    && matches!(self.search.panel(), Panel::Open(candidates) if !candidates.is_empty())
                {
                    self.search.select(self.panel_cursor);
                } else {
                    self.submit();
                }
            }
            _ => match self.focus {
                Focus::Product => self.on_product_key(key),
                Focus::Territory => self.on_territory_key(key),
                Focus::Year => self.on_year_key(key),
            },
        }
    }

    fn on_product_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(request) = self.search.retry() {
                    self.dispatcher.lookup_products(request);
                }
            }
            KeyCode::Char(c) => {
                let mut text = self.search.text().to_string();
                text.push(c);
                self.edit_search(text);
            }
            KeyCode::Backspace => {
                let mut text = self.search.text().to_string();
                text.pop();
                self.edit_search(text);
            }
            KeyCode::Delete => {
                self.search.clear();
            }
            KeyCode::Down => {
                if let Panel::Open(candidates) = self.search.panel()
                    && self.panel_cursor + 1 < candidates.len()
                {
                    self.panel_cursor += 1;
                }
            }
            KeyCode::Up => {
                self.panel_cursor = self.panel_cursor.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn edit_search(&mut self, text: String) {
        let outcome = self.search.edit(text);
        self.panel_cursor = 0;
        if let Some(task) = outcome.debounce {
            self.dispatcher.schedule_debounce(task);
        }
    }

    fn on_territory_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('1') => self.set_mode(TerritoryType::Whole),
            KeyCode::Char('2') => self.set_mode(TerritoryType::RegionSet),
            KeyCode::Char('3') => self.set_mode(TerritoryType::MunicipalitySet),
            KeyCode::Char(' ') => self.toggle_at_cursor(),
            KeyCode::Char('f') => {
                if self.territory.mode() == TerritoryType::MunicipalitySet {
                    self.cycle_filter();
                }
            }
            KeyCode::Char('r') => {
                if let Some(request) = self.territory.retry_regions() {
                    self.dispatcher.fetch_regions(request);
                }
                if let Some(request) = self.territory.retry_municipalities() {
                    self.dispatcher.fetch_municipalities(request);
                }
            }
            KeyCode::Down => {
                if self.list_cursor + 1 < self.active_list_len() {
                    self.list_cursor += 1;
                }
            }
            KeyCode::Up => {
                self.list_cursor = self.list_cursor.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn on_year_key(&mut self, key: KeyEvent) {
        let count = self.years.len();
        if count == 0 {
            return;
        }
        match key.code {
            KeyCode::Down => {
                self.year_index = match self.year_index {
                    None => Some(0),
                    Some(index) if index + 1 < count => Some(index + 1),
                    Some(_) => None,
                };
            }
            KeyCode::Up => {
                self.year_index = match self.year_index {
                    None => Some(count - 1),
                    Some(0) => None,
                    Some(index) => Some(index - 1),
                };
            }
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.screen = Screen::Entry;
            }
            KeyCode::Char('d') => self.presenter.toggle_sort(SortKey::Date),
            KeyCode::Char('m') => self.presenter.toggle_sort(SortKey::Municipality),
            KeyCode::Char('p') => self.presenter.toggle_sort(SortKey::UnitPrice),
            KeyCode::Char('r') => {
                if let Some(fetch) = self.presenter.retry() {
                    self.dispatcher.fetch_prices(fetch);
                }
            }
            KeyCode::Char('u') => {
                if let Some(query) = self.presenter.query() {
                    self.notice = Some(self.service.export_url(query));
                }
            }
            KeyCode::Char('e') => self.export_csv(),
            _ => {}
        }
    }

    fn set_mode(&mut self, mode: TerritoryType) {
        let commands = self.territory.set_mode(mode);
        self.list_cursor = 0;
        self.dispatcher.execute(commands);
    }

    fn active_list_len(&self) -> usize {
        match self.territory.mode() {
            TerritoryType::Whole => 0,
            TerritoryType::RegionSet => self.territory.regions().items().len(),
            TerritoryType::MunicipalitySet => self.territory.municipalities().items().len(),
        }
    }

    fn clamp_list_cursor(&mut self) {
        let len = self.active_list_len();
        if len == 0 {
            self.list_cursor = 0;
        } else if self.list_cursor >= len {
            self.list_cursor = len - 1;
        }
    }

    fn toggle_at_cursor(&mut self) {
        match self.territory.mode() {
            TerritoryType::Whole => {}
            TerritoryType::RegionSet => {
                if let Some(region) = self.territory.regions().items().get(self.list_cursor) {
                    let code = region.id.clone();
                    self.territory.toggle_region(&code);
                }
            }
            TerritoryType::MunicipalitySet => {
                if let Some(municipality) =
                    self.territory.municipalities().items().get(self.list_cursor)
                {
                    let code = municipality.id.clone();
                    self.territory.toggle_municipality(&code);
                }
            }
        }
    }

    /// Advance the municipality filter through the loaded regions and
    /// back to "all".
    fn cycle_filter(&mut self) {
        let regions: Vec<RegionCode> = self
            .territory
            .regions()
            .items()
            .iter()
            .map(|r| r.id.clone())
            .collect();
        if regions.is_empty() {
            return;
        }

        let next = match self.territory.filter_region() {
            None => Some(regions[0].clone()),
            Some(current) => match regions.iter().position(|r| r == current) {
                Some(index) if index + 1 < regions.len() => Some(regions[index + 1].clone()),
                _ => None,
            },
        };

        self.list_cursor = 0;
        if let Some(request) = self.territory.set_filter_region(next) {
            self.dispatcher.fetch_municipalities(request);
        }
    }

    fn submit(&mut self) {
        let year = self.year_text();
        match precos_engine::assemble(self.search.selected(), &self.territory.snapshot(), &year) {
            Ok(query) => match self.presenter.navigate(Some(query)) {
                Ok(Some(fetch)) => {
                    self.dispatcher.fetch_prices(fetch);
                    self.screen = Screen::Results;
                }
                Ok(None) => {
                    self.screen = Screen::Results;
                }
                Err(error) => {
                    self.notice = Some(error.to_string());
                }
            },
            Err(error) => {
                self.notice = Some(error.to_string());
            }
        }
    }

    fn export_csv(&mut self) {
        let rows = self.presenter.view();
        if self.presenter.query().is_none() {
            return;
        }

        let path = "precos_export.csv";
        let result = (|| -> Result<(), csv::Error> {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record([
                "id",
                "produto",
                "unidade",
                "data",
                "municipio",
                "preco_unitario",
            ])?;
            for row in &rows {
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
        })();

        self.notice = Some(match result {
            Ok(()) => format!("{} registros gravados em {}", rows.len(), path),
            Err(error) => format!("Falha ao gravar CSV: {}", error),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precos_runtime::FixtureService;
    use std::sync::mpsc::Receiver;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn app() -> (App, Receiver<AppEvent>) {
        let service: Arc<dyn DataService> = Arc::new(FixtureService::sample());
        let (dispatcher, rx) = Dispatcher::new(Arc::clone(&service)).unwrap();
        let config = Config {
            debounce_ms: 1,
            ..Config::default()
        };
        (App::new(&config, dispatcher, service), rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Drain dispatcher events into the app until one matches.
    fn pump_until(app: &mut App, rx: &Receiver<AppEvent>, want: fn(&AppEvent) -> bool) {
        loop {
            let event = rx.recv_timeout(WAIT).unwrap();
            let done = want(&event);
            app.on_event(event);
            if done {
                return;
            }
        }
    }

    #[test]
    fn test_typing_resolves_candidates_through_the_dispatcher() {
        let (mut app, rx) = app();

        type_text(&mut app, "caneta");
        pump_until(&mut app, &rx, |e| {
            matches!(e, AppEvent::ProductsResolved { .. })
        });

        match app.search().panel() {
            Panel::Open(candidates) => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected panel: {:?}", other),
        }
    }

    #[test]
    fn test_submit_without_product_shows_validation_notice() {
        let (mut app, _rx) = app();

        press(&mut app, KeyCode::Enter);

        assert_eq!(app.notice(), Some("Selecione um produto para continuar"));
        assert_eq!(app.screen(), Screen::Entry);
    }

    #[test]
    fn test_full_flow_reaches_results_with_records() {
        let (mut app, rx) = app();

        type_text(&mut app, "caneta");
        pump_until(&mut app, &rx, |e| {
            matches!(e, AppEvent::ProductsResolved { .. })
        });
        press(&mut app, KeyCode::Enter);
        assert!(app.search().selected().is_some());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Results);

        pump_until(&mut app, &rx, |e| {
            matches!(e, AppEvent::PricesResolved { .. })
        });
        assert_eq!(app.presenter().state(), &ResultsState::Loaded);
        assert_eq!(app.presenter().view().len(), 5);
    }

    #[test]
    fn test_region_mode_without_selection_is_rejected_on_submit() {
        let (mut app, rx) = app();

        type_text(&mut app, "papel");
        pump_until(&mut app, &rx, |e| {
            matches!(e, AppEvent::ProductsResolved { .. })
        });
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('2'));
        pump_until(&mut app, &rx, |e| {
            matches!(e, AppEvent::RegionsResolved { .. })
        });

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.notice(), Some("Selecione pelo menos uma região"));
        assert_eq!(app.screen(), Screen::Entry);

        // Picking a region fixes it.
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Results);
    }

    #[test]
    fn test_year_picker_wraps_through_all_years_and_back() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);

        assert_eq!(app.year_text(), "");
        press(&mut app, KeyCode::Down);
        assert_eq!(app.year_text(), "2018");
        press(&mut app, KeyCode::Up);
        assert_eq!(app.year_text(), "");
        press(&mut app, KeyCode::Up);
        assert_eq!(app.year_text(), "2023");
    }

    #[test]
    fn test_results_sort_keys_drive_the_presenter() {
        let (mut app, rx) = app();

        type_text(&mut app, "caneta");
        pump_until(&mut app, &rx, |e| {
            matches!(e, AppEvent::ProductsResolved { .. })
        });
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        pump_until(&mut app, &rx, |e| {
            matches!(e, AppEvent::PricesResolved { .. })
        });

        press(&mut app, KeyCode::Char('p'));
        let prices: Vec<f64> = app.presenter().view().iter().map(|r| r.unit_price).collect();
        let mut sorted = prices.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(prices, sorted);

        // Esc returns to the entry screen with everything intact.
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Entry);
        assert!(app.search().selected().is_some());
    }
}
