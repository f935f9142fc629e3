//! Flex card renderer

use serde::Serialize;
use serde_json::Value;

use super::icons::IconMap;
use super::template::CardTemplate;
use crate::route::{Route, ROUTE_SEPARATOR};
use crate::timetable::TimeTableEntry;

/// LINE の altText 上限 (文字数)
pub const MAX_ALT_TEXT_CHARS: usize = 400;

/// Rendered card plus its notification text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDocument {
    pub alt_text: String,
    pub contents: Value,
}

/// Build one card from the route and its time table.
///
/// Rows keep the order of `table`, with a separator between consecutive rows.
/// An empty table yields a card with an empty body. A blank `transfer_url`
/// is treated as absent and the footer is dropped.
pub fn render_card(
    route: &Route,
    table: &[TimeTableEntry],
    transfer_url: Option<&str>,
    icons: &IconMap,
    template: &CardTemplate,
) -> CardDocument {
    let mut card = template.card();
    card.set_header_start(&route.starting_point)
        .set_header_end(&route.end_point);

    for (i, entry) in table.iter().enumerate() {
        if i > 0 {
            card.append_separator(template.separator());
        }
        card.append_row(template.row(icons.icon_for(&entry.train_type), &row_text(entry)));
    }

    if let Some(url) = transfer_url.map(str::trim).filter(|url| !url.is_empty()) {
        card.set_footer_link(url);
    }

    let alt_text = format!("{}{}{}", route.starting_point, ROUTE_SEPARATOR, route.end_point);

    CardDocument {
        alt_text: truncate_chars(&alt_text, MAX_ALT_TEXT_CHARS),
        contents: card.into_value(),
    }
}

/// 文字境界で切り詰める
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// `→` for a direct train, `⇢` when a transfer is needed
fn row_text(entry: &TimeTableEntry) -> String {
    let arrow = if entry.requires_transfer() { "⇢" } else { "→" };
    format!("{} {} {}", entry.departure(), arrow, entry.arrival())
}
