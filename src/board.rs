//! Display classification for arrival boards.
//!
//! Converts raw [`Arrival`] values into labelled, toned cells. Thresholds live
//! here rather than in extraction so the arrival data stays display-agnostic.

use serde::Serialize;

use crate::arrivals::{Arrival, ArrivalList};

/// Column titles, in row order.
pub const HEADERS: [&str; 3] = ["Arrival Time", "Delay", "Certainty"];

/// Below this many minutes the train is shown as arriving now.
pub const NOW_MINUTES: f64 = 1.0;
/// Below this many minutes there is no time left to reach the platform.
pub const URGENT_MINUTES: f64 = 3.0;
/// Below this many minutes it is time to leave.
pub const SOON_MINUTES: f64 = 7.0;

/// Visual emphasis for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Normal,
    Soon,
    Urgent,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// One board line: arrival time, delay and certainty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub arrival: Cell,
    pub delay: Cell,
    pub certainty: Cell,
}

impl BoardRow {
    pub fn from_arrival(arrival: &Arrival) -> Self {
        Self {
            arrival: arrival_cell(arrival.minutes_until),
            delay: delay_cell(arrival.delay_seconds),
            certainty: certainty_cell(arrival.uncertainty),
        }
    }

    pub fn cells(&self) -> [&Cell; 3] {
        [&self.arrival, &self.delay, &self.certainty]
    }
}

pub fn rows(list: &ArrivalList) -> Vec<BoardRow> {
    list.iter().map(BoardRow::from_arrival).collect()
}

fn arrival_cell(minutes: f64) -> Cell {
    if minutes < NOW_MINUTES {
        return Cell::new("Now", Tone::Urgent);
    }
    let tone = match minutes {
        m if m < URGENT_MINUTES => Tone::Urgent,
        m if m < SOON_MINUTES => Tone::Soon,
        _ => Tone::Normal,
    };
    Cell::new(format!("{minutes:.2}m"), tone)
}

fn delay_cell(delay_seconds: i32) -> Cell {
    if delay_seconds > 0 {
        let minutes = f64::from(delay_seconds) / 60.0;
        Cell::new(format!("Delayed {minutes:.2}m"), Tone::Warning)
    } else {
        Cell::new("On Time", Tone::Normal)
    }
}

// Absent uncertainty also arrives here as 0 and reads as "Good".
fn certainty_cell(uncertainty: u32) -> Cell {
    if uncertainty == 0 {
        Cell::new("Good", Tone::Normal)
    } else {
        Cell::new(uncertainty.to_string(), Tone::Warning)
    }
}
