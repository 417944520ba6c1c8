use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::LoaderConfig;
use crate::listing::{AggregateStats, CardViewModel, placeholder_cards};
use crate::loader::LoadOutcome;

pub const CARD_WIDTH: u16 = 30;
pub const CARD_GAP: u16 = 2;
/// Columns moved per carousel button press.
pub const SCROLL_STEP: u16 = 42;
pub const TOAST_DURATION: Duration = Duration::from_millis(2_500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Games,
    Community,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Home, Section::Games, Section::Community];

    /// Accepts `games`, `#games` or `#/games`.
    pub fn from_hash(raw: &str) -> Option<Self> {
        let name = raw.trim().trim_start_matches('#').trim_start_matches('/');
        match name.to_lowercase().as_str() {
            "" | "home" => Some(Section::Home),
            "games" => Some(Section::Games),
            "community" => Some(Section::Community),
            _ => None,
        }
    }

    pub fn hash(self) -> &'static str {
        match self {
            Section::Home => "#home",
            Section::Games => "#games",
            Section::Community => "#community",
        }
    }
}

pub fn section_label(section: Section) -> &'static str {
    match section {
        Section::Home => "Home",
        Section::Games => "Games",
        Section::Community => "Community",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Nothing,
    Placeholder,
    Live,
    Cached { at: i64 },
}

#[derive(Debug)]
pub enum ProviderCommand {
    Reload { seq: u64 },
}

#[derive(Debug)]
pub enum Delta {
    Loaded { seq: u64, outcome: LoadOutcome },
    Log(String),
}

#[derive(Debug)]
pub struct AppState {
    pub section: Section,
    pub cards: Vec<CardViewModel>,
    pub stats: Option<AggregateStats>,
    pub source: DataSource,
    pub scroll_offset: u16,
    pub viewport_width: u16,
    pub toast: Option<Toast>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub resilient: bool,
    pub static_fallback: bool,
    pub requested_seq: u64,
    pub applied_seq: u64,
    placeholders: Vec<CardViewModel>,
}

impl AppState {
    pub fn new(config: &LoaderConfig) -> Self {
        let placeholders = placeholder_cards(&config.universe_ids);
        let mut state = Self {
            section: Section::Games,
            cards: Vec::new(),
            stats: None,
            source: DataSource::Nothing,
            scroll_offset: 0,
            viewport_width: 0,
            toast: None,
            logs: VecDeque::new(),
            help_overlay: false,
            resilient: config.resilient,
            static_fallback: config.static_fallback,
            requested_seq: 0,
            applied_seq: 0,
            placeholders,
        };
        if state.static_fallback {
            state.show_placeholders();
        }
        state
    }

    pub fn loading(&self) -> bool {
        self.requested_seq > self.applied_seq
    }

    pub fn mark_requested(&mut self, seq: u64) {
        self.requested_seq = self.requested_seq.max(seq);
    }

    /// Returns true when the new section wants fresh listings.
    pub fn set_section(&mut self, section: Section) -> bool {
        let changed = self.section != section;
        self.section = section;
        if changed {
            self.push_log(format!("[INFO] Section: {}", section.hash()));
        }
        changed && section == Section::Games
    }

    pub fn content_width(&self) -> u16 {
        let n = self.cards.len() as u16;
        n.saturating_mul(CARD_WIDTH + CARD_GAP)
    }

    fn max_scroll(&self) -> u16 {
        self.content_width().saturating_sub(self.viewport_width)
    }

    pub fn scroll_left(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
    }

    pub fn scroll_right(&mut self) {
        self.scroll_offset = self
            .scroll_offset
            .saturating_add(SCROLL_STEP)
            .min(self.max_scroll());
    }

    pub fn set_viewport_width(&mut self, width: u16) {
        self.viewport_width = width;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some(Toast {
            message: message.into(),
            kind,
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub fn expire_toast(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn show_placeholders(&mut self) {
        self.cards = self.placeholders.clone();
        self.stats = None;
        self.source = DataSource::Placeholder;
    }

    fn apply_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Success(listings) => {
                self.cards = listings.cards;
                self.stats = Some(listings.stats);
                self.source = DataSource::Live;
            }
            LoadOutcome::CacheFallback {
                listings,
                cached_at,
            } => {
                self.cards = listings.cards;
                self.stats = Some(listings.stats);
                self.source = DataSource::Cached { at: cached_at };
                self.show_toast("Live stats unavailable, using cached data", ToastKind::Info);
            }
            LoadOutcome::Empty => {
                if self.static_fallback {
                    self.show_placeholders();
                } else {
                    self.cards.clear();
                    self.stats = None;
                    self.source = DataSource::Nothing;
                }
                if self.resilient {
                    self.show_toast("Live stats unavailable", ToastKind::Info);
                }
            }
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Loaded { seq, outcome } => {
            if seq < state.applied_seq {
                state.push_log(format!("[INFO] Dropped stale load #{seq}"));
                return;
            }
            state.applied_seq = seq;
            state.apply_outcome(outcome);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_routes_resolve_sections() {
        assert_eq!(Section::from_hash("#games"), Some(Section::Games));
        assert_eq!(Section::from_hash("#/Community"), Some(Section::Community));
        assert_eq!(Section::from_hash(""), Some(Section::Home));
        assert_eq!(Section::from_hash("#shop"), None);
        for section in Section::ALL {
            assert_eq!(Section::from_hash(section.hash()), Some(section));
        }
    }

    #[test]
    fn entering_games_requests_reload() {
        let mut state = AppState::new(&LoaderConfig::new(["1"]));
        assert!(!state.set_section(Section::Games));
        assert!(!state.set_section(Section::Home));
        assert!(state.set_section(Section::Games));
    }

    #[test]
    fn toast_expires() {
        let mut state = AppState::new(&LoaderConfig::new(["1"]));
        state.show_toast("hi", ToastKind::Success);
        state.expire_toast(Instant::now());
        assert!(state.toast.is_some());
        state.expire_toast(Instant::now() + TOAST_DURATION);
        assert!(state.toast.is_none());
    }
}
