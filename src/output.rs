//! Display sinks for refresh results.
//!
//! [`TextSink`] prints a fixed-width board, optionally with ANSI colours;
//! [`JsonSink`] writes one JSON document per cycle for piping into other tools.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::arrivals::{Arrival, ArrivalList};
use crate::board::{self, BoardRow, Cell, HEADERS, Tone};
use crate::error::FeedError;
use crate::scheduler::DisplaySink;

const COLUMN_WIDTH: usize = 16;

/// Renders boards as plain text tables.
pub struct TextSink<W> {
    out: W,
    color: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, color: false }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_row<'a>(&mut self, cells: impl IntoIterator<Item = (&'a str, Tone)>) -> Result<()> {
        let mut line = String::new();
        for (text, tone) in cells {
            let padded = format!("{text:<width$}", width = COLUMN_WIDTH);
            line.push_str(&paint(&padded, tone, self.color));
        }
        writeln!(self.out, "{}", line.trim_end())?;
        Ok(())
    }
}

impl<W: Write> DisplaySink for TextSink<W> {
    fn render(&mut self, _cycle: usize, outcome: &Result<ArrivalList, FeedError>) -> Result<()> {
        match outcome {
            Ok(list) => {
                self.write_row(HEADERS.iter().map(|h| (*h, Tone::Normal)))?;
                for row in board::rows(list) {
                    self.write_row(row.cells().map(|c: &Cell| (c.text.as_str(), c.tone)))?;
                }
            }
            Err(e) => {
                let message = format!("No data this cycle ({e})");
                writeln!(self.out, "{}", paint(&message, Tone::Warning, self.color))?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    let code = match tone {
        Tone::Normal => return text.to_string(),
        Tone::Soon => "32",
        Tone::Urgent => "31",
        Tone::Warning => "33",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

#[derive(Serialize)]
struct CycleRecord<'a> {
    cycle: usize,
    rendered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arrivals: Option<Vec<ArrivalRecord<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorRecord>,
}

#[derive(Serialize)]
struct ArrivalRecord<'a> {
    #[serde(flatten)]
    arrival: &'a Arrival,
    display: BoardRow,
}

#[derive(Serialize)]
struct ErrorRecord {
    kind: &'static str,
    message: String,
    recoverable: bool,
}

/// Writes one JSON object per line for each refresh cycle.
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for JsonSink<W> {
    fn render(&mut self, cycle: usize, outcome: &Result<ArrivalList, FeedError>) -> Result<()> {
        let record = match outcome {
            Ok(list) => CycleRecord {
                cycle,
                rendered_at: Utc::now(),
                arrivals: Some(
                    list.iter()
                        .map(|arrival| ArrivalRecord {
                            arrival,
                            display: BoardRow::from_arrival(arrival),
                        })
                        .collect(),
                ),
                error: None,
            },
            Err(e) => CycleRecord {
                cycle,
                rendered_at: Utc::now(),
                arrivals: None,
                error: Some(ErrorRecord {
                    kind: e.kind(),
                    message: e.to_string(),
                    recoverable: e.is_recoverable(),
                }),
            },
        };

        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
