//! NDJSON (newline-delimited JSON) stream sink.
//!
//! Each row is serialized straight into the buffered writer, no
//! intermediate `String`.
//!
//! ```ignore
//! let mut sink = JsonStreamSink::stdout();
//! sink.write_row(&FeedSummaryRow::new(&feed))?;
//! sink.write_rows(&feed.events)?;
//! sink.finish()?;
//! ```

use serde::Serialize;
use std::io::{self, BufWriter, Write};

pub struct JsonStreamSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonStreamSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonStreamSink<W> {
    /// Wraps any writer (file, `Vec<u8>`, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            rows_written: 0,
        }
    }

    pub fn write_row<T: Serialize>(&mut self, row: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_rows<T: Serialize>(&mut self, rows: &[T]) -> io::Result<()> {
        rows.iter().try_for_each(|row| self.write_row(row))
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::FeedSummaryRow;
    use ladok_core::types::{EventPayload, UserDetails};
    use ladok_core::{EventContext, EventKind, Feed, UnifiedEvent};

    fn created(entry: &str) -> UnifiedEvent {
        UnifiedEvent {
            entry_id: entry.into(),
            handelse_uid: format!("h-{entry}"),
            context: EventContext::default(),
            payload: EventPayload::UserCreated(UserDetails {
                user_uid: "u-1".into(),
                given_name: "Anna".into(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn summary_then_events_one_per_line() {
        let feed = Feed {
            id: 4015,
            events: vec![created("e1"), created("e2")],
            entries: 3,
        };
        let summary = FeedSummaryRow::new(&feed);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.count(EventKind::UserCreated), 2);

        let mut buf = Vec::new();
        let mut sink = JsonStreamSink::new(&mut buf);
        sink.write_row(&summary).unwrap();
        sink.write_rows(&feed.events).unwrap();
        assert_eq!(sink.rows_written(), 3);
        assert_eq!(sink.finish().unwrap(), 3);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["feed_id"], 4015);
        assert_eq!(lines[0]["by_kind"]["AnvandareSkapadEvent"], 2);
        assert_eq!(lines[1]["payload"]["event_type_name"], "AnvandareSkapadEvent");
        assert_eq!(lines[2]["entry_id"], "e2");
    }
}
