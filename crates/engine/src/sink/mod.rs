//! Line-oriented output for decoded feeds.
//!
//! Two row shapes:
//! - [`FeedSummaryRow`]: one per decoded feed page
//! - [`UnifiedEvent`](ladok_core::UnifiedEvent): one per event, written as-is
//!
//! One backend: [`json_stream::JsonStreamSink`], newline-delimited JSON
//! over any `Write` impl.

pub mod json_stream;

use ladok_core::{EventKind, Feed};
use serde::Serialize;
use std::collections::BTreeMap;

pub use json_stream::JsonStreamSink;

/// One row per decoded feed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedSummaryRow {
    pub feed_id: u64,
    /// Entries present in the document, recognized or not.
    pub entries: u32,
    pub events: u32,
    /// Entries carrying no recognized event.
    pub skipped: u32,
    pub by_kind: BTreeMap<&'static str, u32>,
}

impl FeedSummaryRow {
    pub fn new(feed: &Feed) -> Self {
        let mut by_kind = BTreeMap::new();
        for event in &feed.events {
            let n: &mut u32 = by_kind.entry(event.kind().as_str()).or_insert(0);
            *n = n.saturating_add(1);
        }

        FeedSummaryRow {
            feed_id: feed.id,
            entries: saturating_u32(feed.entries),
            events: saturating_u32(feed.len()),
            skipped: saturating_u32(feed.skipped()),
            by_kind,
        }
    }

    pub fn count(&self, kind: EventKind) -> u32 {
        self.by_kind.get(kind.as_str()).copied().unwrap_or(0)
    }
}

/// Row counters cap at `u32::MAX` rather than wrapping.
fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_counts_saturate() {
        assert_eq!(saturating_u32(7), 7);
        assert_eq!(saturating_u32(usize::MAX), u32::MAX);
    }

    #[test]
    fn skipped_counts_unrecognized_entries() {
        let feed = Feed {
            id: 12,
            events: Vec::new(),
            entries: 3,
        };
        let row = FeedSummaryRow::new(&feed);
        assert_eq!(row.entries, 3);
        assert_eq!(row.events, 0);
        assert_eq!(row.skipped, 3);
        assert!(row.by_kind.is_empty());
    }
}
