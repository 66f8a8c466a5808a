pub mod arrivals;
pub mod board;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod scheduler;
pub mod snapshot;
pub mod stops;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}

pub use arrivals::{Arrival, ArrivalList, ExtractRequest, ScheduleRelationship, extract};
pub use error::{ConfigError, FeedError};
pub use snapshot::FeedSnapshot;
