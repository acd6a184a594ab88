//! Plain-text rendering of snapshots.

use std::fmt::Write;

use jikan_client::CatalogItem;

use crate::app::{Route, Snapshot};
use crate::bookmarks::Bookmark;

const SAVED_MARK: &str = "*";

/// Render the view selected by the snapshot's route
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = match snapshot.route {
        Route::Search => search(snapshot),
        Route::Detail(id) => detail_view(snapshot, id),
        Route::Bookmarks => bookmark_list(&snapshot.bookmarks),
    };

    if let Some(notice) = &snapshot.notice {
        let _ = writeln!(out, "\n{}", notice);
    }
    out
}

fn search(snapshot: &Snapshot) -> String {
    let state = &snapshot.state;
    let mut out = String::new();

    let _ = write!(out, "Search: \"{}\"", state.committed_query);
    if !state.filters.is_empty() {
        let _ = write!(out, "   Filters ({})", state.filters.active_count());
    }
    out.push('\n');

    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {}  (:dismiss)", error);
    }

    if state.loading {
        out.push_str("Loading anime...\n");
        return out;
    }

    if state.committed_query.is_empty() {
        out.push_str("Type a title to search.\n");
        return out;
    }

    if state.results.is_empty() {
        if state.error.is_none() {
            let _ = writeln!(out, "No anime found for \"{}\"", state.committed_query);
        }
        return out;
    }

    let mut shown = 0;
    for item in state.visible_results() {
        out.push_str(&result_line(item, snapshot.is_bookmarked(item.mal_id)));
        out.push('\n');
        shown += 1;
    }
    if shown == 0 {
        out.push_str("No results on this page match the active filters\n");
    }

    let _ = writeln!(out, "{}", page_line(state.current_page, state.total_pages));
    out
}

/// `Page X of Y`, with navigation hints where they apply
pub fn page_line(current: u32, total: u32) -> String {
    let mut line = format!("Page {} of {}", current, total);
    if current > 1 {
        line.push_str("  :prev");
    }
    if current < total {
        line.push_str("  :next");
    }
    line
}

/// One row of a result list
pub fn result_line(item: &CatalogItem, saved: bool) -> String {
    let mut line = format!(
        "{} [{}] {}",
        if saved { SAVED_MARK } else { " " },
        item.mal_id,
        item.title
    );
    if let Some(score) = item.score {
        let _ = write!(line, "  {:.2}", score);
    }
    if let Some(kind) = &item.kind {
        let _ = write!(line, "  {}", kind);
    }
    if let Some(episodes) = item.episodes {
        let _ = write!(line, "  {} eps", episodes);
    }
    line
}

fn detail_view(snapshot: &Snapshot, id: u32) -> String {
    let state = &snapshot.state;

    if state.loading {
        return "Loading anime details...\n".to_string();
    }
    if let Some(error) = &state.error {
        return format!("Error: {}\n(:back to return)\n", error);
    }
    match &state.selected_item {
        Some(item) if item.mal_id == id => detail(item, snapshot.is_bookmarked(id)),
        _ => "Anime not found\n(:back to return)\n".to_string(),
    }
}

/// Full record of one item
pub fn detail(item: &CatalogItem, saved: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}{} [{}]",
        if saved { "* " } else { "" },
        item.title,
        item.mal_id
    );
    if let Some(english) = item.title_english.as_deref().filter(|t| *t != item.title) {
        let _ = writeln!(out, "  {}", english);
    }
    if let Some(japanese) = &item.title_japanese {
        let _ = writeln!(out, "  {}", japanese);
    }
    out.push('\n');

    let fields = [
        ("Score", item.score.map(|s| format!("{:.2}", s))),
        ("Type", item.kind.clone()),
        ("Episodes", item.episodes.map(|e| e.to_string())),
        ("Status", item.status.clone()),
        ("Aired", item.aired_label().map(str::to_string)),
        ("Year", item.year.map(|y| y.to_string())),
        ("Rating", item.rating.clone()),
        ("Genres", join_tags(&item.genres)),
        ("Studios", join_tags(&item.studios)),
        ("Poster", item.poster_url().map(str::to_string)),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(out, "{:<9} {}", format!("{}:", label), value);
        }
    }

    if let Some(synopsis) = &item.synopsis {
        let _ = writeln!(out, "\n{}", synopsis);
    }

    let _ = writeln!(
        out,
        "\n:save {} to {}  |  :back",
        item.mal_id,
        if saved { "remove bookmark" } else { "bookmark" }
    );
    out
}

fn join_tags(tags: &[jikan_client::Tag]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    Some(tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", "))
}

/// The bookmark list, in the order items were saved
pub fn bookmark_list(bookmarks: &[Bookmark]) -> String {
    if bookmarks.is_empty() {
        return "No saved anime yet.\n".to_string();
    }

    let mut out = format!("Saved anime ({})\n", bookmarks.len());
    for bookmark in bookmarks {
        let _ = writeln!(
            out,
            "{}  saved {}",
            result_line(&bookmark.item, true),
            bookmark.saved_at.format("%Y-%m-%d")
        );
    }
    out
}
