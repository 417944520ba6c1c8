//! View-model to markup. Everything here is pure: the terminal UI and the
//! HTML binary both start from the same [`CardViewModel`]s.

use crate::listing::{AggregateStats, CardViewModel};
use crate::loader::LoadOutcome;

/// Shown wherever a count is unknown.
pub const PLACEHOLDER: &str = "—";

const VOID_TAGS: [&str; 2] = ["img", "br"];

pub fn fmt_count(value: Option<u64>) -> String {
    let Some(n) = value else {
        return PLACEHOLDER.to_string();
    };
    const UNITS: [(u64, char); 3] = [(1_000_000_000, 'B'), (1_000_000, 'M'), (1_000, 'K')];
    for (unit, suffix) in UNITS {
        if n >= unit {
            // Tenths rounded half-up.
            let unit = u128::from(unit);
            let tenths = (u128::from(n) * 10 + unit / 2) / unit;
            return format!("{}.{}{suffix}", tenths / 10, tenths % 10);
        }
    }
    n.to_string()
}

pub fn safe_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
    Text(String),
}

impl Node {
    pub fn el(tag: &'static str) -> Self {
        Node::Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name, value.into()));
        }
        self
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    pub fn child(mut self, node: Node) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str()),
            Node::Text(_) => None,
        }
    }

    /// Depth-first search for elements whose class list contains `class`.
    pub fn find_by_class<'a>(&'a self, class: &str, out: &mut Vec<&'a Node>) {
        if let Node::Element { children, .. } = self {
            if self
                .get_attr("class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class))
            {
                out.push(self);
            }
            for child in children {
                child.find_by_class(class, out);
            }
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(value) => value.clone(),
            Node::Element { children, .. } => children.iter().map(Node::text_content).collect(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(value) => out.push_str(&safe_text(value)),
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&safe_text(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(tag) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

pub fn render_card(card: &CardViewModel) -> Node {
    let mut thumb = Node::el("div").class("gameThumbWrap");
    if let Some(url) = &card.image_url {
        thumb = thumb.child(
            Node::el("img")
                .class("gameThumb")
                .attr("src", url.as_str())
                .attr("loading", "lazy")
                .attr("alt", ""),
        );
    }

    let body = Node::el("div")
        .class("gameBody")
        .child(
            Node::el("div")
                .class("gameName")
                .child(Node::text(card.name.as_str())),
        )
        .child(
            Node::el("div")
                .class("metaRow")
                .child(
                    Node::el("span")
                        .class("badge")
                        .child(Node::text(format!("👥 {}", fmt_count(card.playing)))),
                )
                .child(
                    Node::el("span")
                        .class("badge")
                        .child(Node::text(format!("▶ {}", fmt_count(card.visits)))),
                ),
        )
        .child(
            Node::el("a")
                .class("playBtn")
                .attr("href", card.play_url.as_str())
                .attr("target", "_blank")
                .attr("rel", "noreferrer")
                .child(Node::text("Play Now")),
        );

    Node::el("div")
        .class("gameCard")
        .attr("data-id", card.id.as_str())
        .child(thumb)
        .child(body)
}

pub fn render_cards(cards: &[CardViewModel]) -> Vec<Node> {
    cards.iter().map(render_card).collect()
}

/// `None` renders every counter as the neutral placeholder.
pub fn render_stats(stats: Option<&AggregateStats>) -> Node {
    let playing = fmt_count(stats.map(|s| s.playing));
    let visits = fmt_count(stats.map(|s| s.visits));
    let count = fmt_count(stats.map(|s| s.count as u64));
    let stat = |id: &'static str, label: &str, value: String| {
        Node::el("div")
            .class("stat")
            .child(Node::el("span").class("statLabel").child(Node::text(label)))
            .child(
                Node::el("span")
                    .class("statValue")
                    .attr("id", id)
                    .child(Node::text(value)),
            )
    };
    Node::el("div")
        .class("stats")
        .child(stat("statPlaying", "Playing", playing))
        .child(stat("statVisits", "Visits", visits))
        .child(stat("statCount", "Games", count))
}

/// `placeholders` are shown for `Empty` outcomes (static-fallback pages);
/// pass an empty slice for a blank carousel.
pub fn render_page(outcome: &LoadOutcome, placeholders: &[CardViewModel]) -> Node {
    let (cards, stats) = match outcome.listings() {
        Some(listings) => (listings.cards.as_slice(), Some(&listings.stats)),
        None => (placeholders, None),
    };

    let mut carousel = Node::el("div")
        .class("carousel")
        .attr("id", "gamesCarousel");
    if outcome.is_stale() {
        carousel = carousel.attr("data-stale", "true");
    }
    carousel = carousel.children(render_cards(cards));

    let mut page = Node::el("section")
        .class("games")
        .attr("id", "games")
        .child(render_stats(stats));
    if outcome.is_stale() {
        page = page.child(
            Node::el("div")
                .class("notice offline")
                .child(Node::text("Offline: showing cached data")),
        );
    }
    page.child(carousel)
}
