//! Arrival extraction for a single stop.
//!
//! Turns a [`FeedSnapshot`] into a bounded [`ArrivalList`] of the next
//! predicted arrivals at one stop. Extraction is a pure function of the
//! snapshot, the request and the injected `now`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{ConfigError, FeedError};
use crate::gtfs_rt::FeedMessage;
use crate::gtfs_rt::trip_update::StopTimeUpdate;
use crate::gtfs_rt::trip_update::stop_time_update::ScheduleRelationship as WireRelationship;
use crate::parser::parse_feed;
use crate::snapshot::FeedSnapshot;

/// Number of arrivals kept per refresh when nothing else is configured.
pub const DEFAULT_LIMIT: usize = 2;

/// How a predicted stop event relates to the static schedule.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleRelationship {
    #[default]
    Scheduled,
    Skipped,
    NoData,
    /// The stop is served but was not in the static schedule
    /// (`UNSCHEDULED` on the wire).
    Added,
}

impl From<WireRelationship> for ScheduleRelationship {
    fn from(value: WireRelationship) -> Self {
        match value {
            WireRelationship::Scheduled => ScheduleRelationship::Scheduled,
            WireRelationship::Skipped => ScheduleRelationship::Skipped,
            WireRelationship::NoData => ScheduleRelationship::NoData,
            WireRelationship::Unscheduled => ScheduleRelationship::Added,
        }
    }
}

/// One predicted arrival, relative to the moment of extraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Arrival {
    /// Minutes from `now` until the predicted arrival. Negative once the
    /// arrival time has passed.
    pub minutes_until: f64,
    /// Seconds behind schedule; negative when early.
    pub delay_seconds: i32,
    /// Prediction uncertainty in seconds, `0` meaning certain.
    pub uncertainty: u32,
    pub schedule_relationship: ScheduleRelationship,
}

impl Arrival {
    /// Placeholder shown when no prediction matches the stop.
    pub const FALLBACK: Arrival = Arrival {
        minutes_until: 0.0,
        delay_seconds: 0,
        uncertainty: 0,
        schedule_relationship: ScheduleRelationship::Scheduled,
    };

    fn from_stop_time_update(stu: &StopTimeUpdate, now: DateTime<Utc>) -> Self {
        // Absent events and fields read as zero, same as the protobuf defaults.
        let (time, delay, uncertainty) = stu
            .arrival
            .as_ref()
            .map(|event| (event.time(), event.delay(), event.uncertainty()))
            .unwrap_or_default();

        Arrival {
            minutes_until: minutes_between(now, time),
            delay_seconds: delay,
            uncertainty: u32::try_from(uncertainty).unwrap_or(0),
            schedule_relationship: stu.schedule_relationship().into(),
        }
    }
}

/// `(epoch - now) / 60`, subtracting whole seconds in integer space first so
/// large epochs do not lose precision.
fn minutes_between(now: DateTime<Utc>, epoch: i64) -> f64 {
    let whole = epoch.saturating_sub(now.timestamp()) as f64;
    let frac = f64::from(now.timestamp_subsec_nanos()) / 1e9;
    (whole - frac) / 60.0
}

/// The next arrivals at one stop, in feed order.
///
/// Never empty: when nothing matched it holds exactly [`Arrival::FALLBACK`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArrivalList {
    arrivals: Vec<Arrival>,
}

impl ArrivalList {
    fn fallback() -> Self {
        Self {
            arrivals: vec![Arrival::FALLBACK],
        }
    }

    pub fn as_slice(&self) -> &[Arrival] {
        &self.arrivals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arrival> {
        self.arrivals.iter()
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    /// Always `false`; provided alongside [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    pub fn first(&self) -> &Arrival {
        &self.arrivals[0]
    }
}

impl<'a> IntoIterator for &'a ArrivalList {
    type Item = &'a Arrival;
    type IntoIter = std::slice::Iter<'a, Arrival>;

    fn into_iter(self) -> Self::IntoIter {
        self.arrivals.iter()
    }
}

/// Which stop to report and how many arrivals to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    target_stop: String,
    limit: usize,
}

impl ExtractRequest {
    /// Surrounding whitespace is stripped from `target_stop`; feed stop ids
    /// never carry any.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyStopId`] for a blank stop id and
    /// [`ConfigError::ZeroLimit`] when `limit` is 0.
    pub fn new(target_stop: impl Into<String>, limit: usize) -> Result<Self, ConfigError> {
        let target_stop = target_stop.into().trim().to_string();
        if target_stop.is_empty() {
            return Err(ConfigError::EmptyStopId);
        }
        if limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        Ok(Self { target_stop, limit })
    }

    pub fn target_stop(&self) -> &str {
        &self.target_stop
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Decodes `snapshot` and returns the next arrivals for the requested stop.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] if the snapshot is not a valid feed; no
/// partial list is produced in that case.
pub fn extract(
    snapshot: &FeedSnapshot,
    request: &ExtractRequest,
    now: DateTime<Utc>,
) -> Result<ArrivalList, FeedError> {
    let feed = parse_feed(snapshot.as_bytes())?;
    Ok(arrivals_from_feed(&feed, request, now))
}

/// Collects up to `request.limit()` arrivals for the target stop from an
/// already-decoded feed, in encounter order.
pub fn arrivals_from_feed(
    feed: &FeedMessage,
    request: &ExtractRequest,
    now: DateTime<Utc>,
) -> ArrivalList {
    let mut arrivals = Vec::with_capacity(request.limit.min(16));
    let mut matched = 0usize;

    let updates = feed
        .entity
        .iter()
        .filter_map(|entity| entity.trip_update.as_ref())
        .flat_map(|trip_update| trip_update.stop_time_update.iter());

    for stu in updates {
        if stu.stop_id() != request.target_stop {
            continue;
        }
        matched += 1;
        if arrivals.len() < request.limit {
            arrivals.push(Arrival::from_stop_time_update(stu, now));
        }
    }

    debug!(
        stop_id = %request.target_stop,
        entities = feed.entity.len(),
        matched,
        kept = arrivals.len(),
        "Arrivals extracted"
    );

    if arrivals.is_empty() {
        return ArrivalList::fallback();
    }
    ArrivalList { arrivals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_update::StopTimeEvent;
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate, VehiclePosition};
    use chrono::TimeZone;
    use prost::Message;

    const NOW: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).unwrap()
    }

    fn stu(stop_id: &str, time: i64, delay: i32, uncertainty: Option<i32>) -> StopTimeUpdate {
        StopTimeUpdate {
            stop_id: Some(stop_id.to_string()),
            arrival: Some(StopTimeEvent {
                time: Some(time),
                delay: Some(delay),
                uncertainty,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn trip_entity(id: &str, updates: Vec<StopTimeUpdate>) -> FeedEntity {
        FeedEntity {
            id: id.to_string(),
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    trip_id: Some(format!("{id}_L..N")),
                    route_id: Some("L".to_string()),
                    ..Default::default()
                },
                stop_time_update: updates,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn feed(entity: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "1.0".to_string(),
                timestamp: Some(NOW as u64),
                incrementality: None,
                feed_version: None,
            },
            entity,
        }
    }

    fn snapshot(feed: &FeedMessage) -> FeedSnapshot {
        FeedSnapshot::from(feed.encode_to_vec())
    }

    fn request(stop: &str, limit: usize) -> ExtractRequest {
        ExtractRequest::new(stop, limit).unwrap()
    }

    #[test]
    fn test_single_match_scenario() {
        let feed = feed(vec![trip_entity("t1", vec![stu("L12N", NOW + 180, 30, Some(0))])]);

        let list = extract(&snapshot(&feed), &request("L12N", 2), now()).unwrap();

        assert_eq!(list.len(), 1);
        let arrival = list.first();
        assert_eq!(arrival.minutes_until, 3.0);
        assert_eq!(arrival.delay_seconds, 30);
        assert_eq!(arrival.uncertainty, 0);
        assert_eq!(arrival.schedule_relationship, ScheduleRelationship::Scheduled);
    }

    #[test]
    fn test_limit_keeps_first_encountered() {
        let feed = feed(vec![
            trip_entity("t1", vec![stu("L11N", NOW + 60, 0, None), stu("L12N", NOW + 600, 1, None)]),
            trip_entity("t2", vec![stu("L12N", NOW + 120, 2, None)]),
            trip_entity("t3", vec![stu("L12N", NOW + 60, 3, None)]),
        ]);

        let list = extract(&snapshot(&feed), &request("L12N", 2), now()).unwrap();

        // feed order, not time order
        let delays: Vec<i32> = list.iter().map(|a| a.delay_seconds).collect();
        assert_eq!(delays, vec![1, 2]);
    }

    #[test]
    fn test_no_match_yields_single_fallback() {
        let feed = feed(vec![trip_entity("t1", vec![stu("L11S", NOW + 60, 45, Some(30))])]);

        for limit in [1, 2, 5] {
            let list = extract(&snapshot(&feed), &request("L12N", limit), now()).unwrap();
            assert_eq!(list.as_slice(), &[Arrival::FALLBACK]);
        }
    }

    #[test]
    fn test_empty_feed_yields_fallback() {
        let list = extract(&FeedSnapshot::default(), &request("L12N", 2), now()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(*list.first(), Arrival::FALLBACK);
    }

    #[test]
    fn test_past_arrival_is_negative_and_counted() {
        let feed = feed(vec![trip_entity(
            "t1",
            vec![stu("L12N", NOW - 90, -20, None), stu("L12N", NOW + 30, 0, None)],
        )]);

        let list = extract(&snapshot(&feed), &request("L12N", 1), now()).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list.first().minutes_until, -1.5);
        assert_eq!(list.first().delay_seconds, -20);
    }

    #[test]
    fn test_minutes_shift_with_now() {
        let feed = feed(vec![trip_entity("t1", vec![stu("L12N", NOW + 450, 0, None)])]);
        let snap = snapshot(&feed);
        let req = request("L12N", 2);

        let earlier = extract(&snap, &req, now()).unwrap();
        let later = extract(&snap, &req, now() + chrono::Duration::seconds(90)).unwrap();

        assert_eq!(earlier.first().minutes_until, 7.5);
        assert_eq!(later.first().minutes_until, 6.0);
        assert_eq!(earlier.first().minutes_until - later.first().minutes_until, 1.5);
    }

    #[test]
    fn test_sub_second_now() {
        let feed = feed(vec![trip_entity("t1", vec![stu("L12N", NOW + 60, 0, None)])]);
        let now = Utc.timestamp_opt(NOW, 500_000_000).unwrap();

        let list = extract(&snapshot(&feed), &request("L12N", 2), now).unwrap();

        assert!((list.first().minutes_until - 59.5 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let feed = feed(vec![trip_entity(
            "t1",
            vec![stu("L12N", NOW + 200, 15, Some(60)), stu("L12N", NOW + 500, 0, None)],
        )]);
        let snap = snapshot(&feed);
        let req = request("L12N", 2);

        assert_eq!(extract(&snap, &req, now()).unwrap(), extract(&snap, &req, now()).unwrap());
    }

    #[test]
    fn test_missing_uncertainty_reads_as_certain() {
        let feed = feed(vec![trip_entity(
            "t1",
            vec![stu("L12N", NOW + 60, 0, None), stu("L12N", NOW + 120, 0, Some(90))],
        )]);

        let list = extract(&snapshot(&feed), &request("L12N", 2), now()).unwrap();

        let uncertainty: Vec<u32> = list.iter().map(|a| a.uncertainty).collect();
        assert_eq!(uncertainty, vec![0, 90]);
    }

    #[test]
    fn test_missing_arrival_event_reads_as_zero() {
        let update = StopTimeUpdate {
            stop_id: Some("L12N".to_string()),
            ..Default::default()
        };
        let feed = feed(vec![trip_entity("t1", vec![update])]);

        let list = arrivals_from_feed(&feed, &request("L12N", 2), now());

        assert_eq!(list.first().minutes_until, -(NOW as f64) / 60.0);
        assert_eq!(list.first().delay_seconds, 0);
    }

    #[test]
    fn test_schedule_relationship_is_copied() {
        let mut skipped = stu("L12N", NOW + 60, 0, None);
        skipped.set_schedule_relationship(WireRelationship::Skipped);
        let mut added = stu("L12N", NOW + 120, 0, None);
        added.set_schedule_relationship(WireRelationship::Unscheduled);
        let feed = feed(vec![trip_entity("t1", vec![skipped, added])]);

        let list = arrivals_from_feed(&feed, &request("L12N", 2), now());

        let rels: Vec<_> = list.iter().map(|a| a.schedule_relationship).collect();
        assert_eq!(rels, vec![ScheduleRelationship::Skipped, ScheduleRelationship::Added]);
    }

    #[test]
    fn test_non_trip_entities_are_ignored() {
        let vehicle = FeedEntity {
            id: "v1".to_string(),
            vehicle: Some(VehiclePosition {
                stop_id: Some("L12N".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let feed = feed(vec![vehicle, trip_entity("t1", vec![stu("L12N", NOW + 240, 0, None)])]);

        let list = arrivals_from_feed(&feed, &request("L12N", 2), now());

        assert_eq!(list.len(), 1);
        assert_eq!(list.first().minutes_until, 4.0);
    }

    #[test]
    fn test_malformed_snapshot_is_decode_error() {
        let snap = FeedSnapshot::from(vec![0xFF, 0xFE, 0x00, 0x01]);
        let result = extract(&snap, &request("L12N", 2), now());
        assert!(matches!(result, Err(FeedError::Decode(_))));
    }

    #[test]
    fn test_request_validation() {
        assert_eq!(ExtractRequest::new("", 2), Err(ConfigError::EmptyStopId));
        assert_eq!(ExtractRequest::new("  ", 2), Err(ConfigError::EmptyStopId));
        assert_eq!(ExtractRequest::new("L12N", 0), Err(ConfigError::ZeroLimit));
        assert_eq!(request("L12N", 3).limit(), 3);
    }

    #[test]
    fn test_padded_stop_id_still_matches() {
        let feed = feed(vec![trip_entity("t1", vec![stu("L12N", NOW + 180, 0, None)])]);
        let req = request(" L12N \t", 2);
        assert_eq!(req.target_stop(), "L12N");

        let list = arrivals_from_feed(&feed, &req, now());

        assert_ne!(list.as_slice(), &[Arrival::FALLBACK]);
        assert_eq!(list.first().minutes_until, 3.0);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let list = ArrivalList::fallback();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "minutes_until": 0.0,
                "delay_seconds": 0,
                "uncertainty": 0,
                "schedule_relationship": "SCHEDULED"
            }])
        );
    }
}
