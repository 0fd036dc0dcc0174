use crate::token::{RequestToken, TokenSeq};
use precos_types::Product;

/// Minimum committed text length before a lookup is issued.
pub const MIN_TERM_LEN: usize = 3;

/// Default debounce window in milliseconds.
pub const DEBOUNCE_MS: u64 = 300;

/// Result panel attached to the search input.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Closed,
    Loading,
    Open(Vec<Product>),
    Failed(String),
}

/// A debounce timer the caller must schedule. When the delay elapses the
/// caller reports back via [`ProductSearch::debounce_elapsed`] with the
/// same generation; a generation that has since moved on is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTask {
    pub generation: u64,
    pub delay_ms: u64,
}

/// A product lookup the caller must execute against the data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub token: RequestToken,
    pub term: String,
}

/// What a text edit asks of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditOutcome {
    /// A previously committed product was dropped; the parent must be
    /// notified with "no selection".
    pub selection_cleared: bool,
    /// Debounce timer to schedule, when the text is long enough.
    pub debounce: Option<DebounceTask>,
}

/// Incremental product lookup: raw keystrokes in, committed [`Product`]
/// out, with debouncing and stale-response suppression in between.
#[derive(Debug)]
pub struct ProductSearch {
    text: String,
    selected: Option<Product>,
    panel: Panel,
    tokens: TokenSeq,
    live_token: Option<RequestToken>,
    generation: u64,
    debounce_ms: u64,
}

impl ProductSearch {
    pub fn new() -> Self {
        Self::with_debounce(DEBOUNCE_MS)
    }

    pub fn with_debounce(debounce_ms: u64) -> Self {
        Self {
            text: String::new(),
            selected: None,
            panel: Panel::Closed,
            tokens: TokenSeq::new(),
            live_token: None,
            generation: 0,
            debounce_ms,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selected(&self) -> Option<&Product> {
        self.selected.as_ref()
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    fn term_long_enough(&self) -> bool {
        self.text.chars().count() >= MIN_TERM_LEN
    }

    /// Apply a free-text edit. Clears any committed selection first,
    /// then either schedules a debounce (text long enough) or closes
    /// the panel (text too short). Every edit advances the generation,
    /// which voids any debounce still pending for older text.
    pub fn edit(&mut self, text: impl Into<String>) -> EditOutcome {
        let selection_cleared = self.selected.take().is_some();
        self.text = text.into();
        self.generation += 1;

        if self.term_long_enough() {
            // Keep an open result list visible until the new response
            // lands; only an empty panel shows the loading state.
            if matches!(self.panel, Panel::Closed | Panel::Failed(_)) {
                self.panel = Panel::Loading;
            }
            EditOutcome {
                selection_cleared,
                debounce: Some(DebounceTask {
                    generation: self.generation,
                    delay_ms: self.debounce_ms,
                }),
            }
        } else {
            self.panel = Panel::Closed;
            self.live_token = None;
            EditOutcome {
                selection_cleared,
                debounce: None,
            }
        }
    }

    /// The debounce timer for `generation` elapsed. Issues a lookup for
    /// the current text iff no newer edit superseded the timer.
    pub fn debounce_elapsed(&mut self, generation: u64) -> Option<LookupRequest> {
        if generation != self.generation || !self.term_long_enough() {
            return None;
        }

        let token = self.tokens.next();
        self.live_token = Some(token);
        Some(LookupRequest {
            token,
            term: self.text.clone(),
        })
    }

    /// Apply a lookup completion. Returns false when the response was
    /// stale (its token no longer matches the live request) and was
    /// discarded without touching the panel.
    pub fn apply_lookup(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Product>, String>,
    ) -> bool {
        if self.live_token != Some(token) {
            return false;
        }
        self.live_token = None;

        match result {
            Ok(products) => self.panel = Panel::Open(products),
            Err(message) => self.panel = Panel::Failed(message),
        }
        true
    }

    /// Re-issue the failed lookup for the current text.
    pub fn retry(&mut self) -> Option<LookupRequest> {
        if !matches!(self.panel, Panel::Failed(_)) || !self.term_long_enough() {
            return None;
        }

        self.panel = Panel::Loading;
        let token = self.tokens.next();
        self.live_token = Some(token);
        Some(LookupRequest {
            token,
            term: self.text.clone(),
        })
    }

    /// Commit the candidate at `index`: mirrors its name into the
    /// input, closes the panel, and returns the product the parent must
    /// be notified with.
    pub fn select(&mut self, index: usize) -> Option<Product> {
        let product = match &self.panel {
            Panel::Open(products) => products.get(index)?.clone(),
            _ => return None,
        };

        self.text = product.name.clone();
        self.selected = Some(product.clone());
        self.panel = Panel::Closed;
        self.generation += 1;
        self.live_token = None;
        Some(product)
    }

    /// Explicit clear: resets text, selection, and panel. The parent
    /// must be notified with "no selection".
    pub fn clear(&mut self) {
        self.text.clear();
        self.selected = None;
        self.panel = Panel::Closed;
        self.generation += 1;
        self.live_token = None;
    }
}

impl Default for ProductSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precos_types::ProductId;

    fn caneta() -> Product {
        Product {
            id: ProductId::from("109001"),
            name: "Caneta esferográfica".to_string(),
            unit: "UN".to_string(),
        }
    }

    #[test]
    fn test_short_text_never_schedules_lookup() {
        let mut search = ProductSearch::new();

        let outcome = search.edit("ca");
        assert_eq!(outcome.debounce, None);
        assert_eq!(search.panel(), &Panel::Closed);
    }

    #[test]
    fn test_burst_of_edits_fires_single_lookup_for_final_text() {
        let mut search = ProductSearch::new();

        let g1 = search.edit("can").debounce.unwrap();
        let g2 = search.edit("cane").debounce.unwrap();
        let g3 = search.edit("caneta").debounce.unwrap();

        // Earlier timers elapse after being superseded: no request.
        assert_eq!(search.debounce_elapsed(g1.generation), None);
        assert_eq!(search.debounce_elapsed(g2.generation), None);

        let request = search.debounce_elapsed(g3.generation).unwrap();
        assert_eq!(request.term, "caneta");
    }

    #[test]
    fn test_edit_below_threshold_closes_panel_and_voids_timer() {
        let mut search = ProductSearch::new();

        let task = search.edit("caneta").debounce.unwrap();
        search.edit("ca");

        assert_eq!(search.panel(), &Panel::Closed);
        assert_eq!(search.debounce_elapsed(task.generation), None);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut search = ProductSearch::new();

        let old = search.edit("papel").debounce.unwrap();
        let old_request = search.debounce_elapsed(old.generation).unwrap();

        let new = search.edit("caneta").debounce.unwrap();
        let new_request = search.debounce_elapsed(new.generation).unwrap();

        // The older in-flight response resolves after the newer request
        // started: it must be dropped even though it arrives first.
        assert!(!search.apply_lookup(old_request.token, Ok(vec![caneta()])));
        assert!(matches!(search.panel(), Panel::Loading | Panel::Open(_)));

        assert!(search.apply_lookup(new_request.token, Ok(vec![caneta()])));
        assert_eq!(search.panel(), &Panel::Open(vec![caneta()]));
    }

    #[test]
    fn test_select_commits_product_and_mirrors_name() {
        let mut search = ProductSearch::new();
        let task = search.edit("caneta").debounce.unwrap();
        let request = search.debounce_elapsed(task.generation).unwrap();
        search.apply_lookup(request.token, Ok(vec![caneta()]));

        let picked = search.select(0).unwrap();

        assert_eq!(picked, caneta());
        assert_eq!(search.text(), "Caneta esferográfica");
        assert_eq!(search.selected(), Some(&caneta()));
        assert_eq!(search.panel(), &Panel::Closed);
    }

    #[test]
    fn test_edit_after_selection_clears_it_first() {
        let mut search = ProductSearch::new();
        let task = search.edit("caneta").debounce.unwrap();
        let request = search.debounce_elapsed(task.generation).unwrap();
        search.apply_lookup(request.token, Ok(vec![caneta()]));
        search.select(0);

        let outcome = search.edit("Caneta esferográfica azul");

        assert!(outcome.selection_cleared);
        assert_eq!(search.selected(), None);
        assert!(outcome.debounce.is_some());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut search = ProductSearch::new();
        let task = search.edit("caneta").debounce.unwrap();
        let request = search.debounce_elapsed(task.generation).unwrap();
        search.apply_lookup(request.token, Ok(vec![caneta()]));
        search.select(0);

        search.clear();

        assert_eq!(search.text(), "");
        assert_eq!(search.selected(), None);
        assert_eq!(search.panel(), &Panel::Closed);
    }

    #[test]
    fn test_failed_lookup_offers_retry_with_fresh_token() {
        let mut search = ProductSearch::new();
        let task = search.edit("caneta").debounce.unwrap();
        let request = search.debounce_elapsed(task.generation).unwrap();

        search.apply_lookup(request.token, Err("serviço indisponível".to_string()));
        assert!(matches!(search.panel(), Panel::Failed(_)));

        let retry = search.retry().unwrap();
        assert_eq!(retry.term, "caneta");
        assert!(retry.token > request.token);

        assert!(search.apply_lookup(retry.token, Ok(vec![caneta()])));
        assert_eq!(search.panel(), &Panel::Open(vec![caneta()]));
    }
}
