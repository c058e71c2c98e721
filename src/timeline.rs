use chrono::{Duration, DurationRound, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::{
    avg_range::{TimedValue, WindowAverager},
    error::{AverageError, Result},
    store::{AverageRecord, Event, DATE_FORMAT},
};

fn floor_minute(time: NaiveDateTime) -> Result<NaiveDateTime> {
    Ok(time.duration_trunc(Duration::minutes(1))?)
}

/// Minutes from `reference` to `time`, keeping the sub-minute part.
fn minute_offset(reference: NaiveDateTime, time: NaiveDateTime) -> f64 {
    let elapsed = time - reference;
    let seconds = match elapsed.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    };
    seconds / 60.0
}

/// The minute ticks spanned by an event log, and the events placed on them.
#[derive(Debug)]
pub struct Timeline {
    /// The first event's timestamp, rounded down to the minute.
    reference: NaiveDateTime,
    /// One minute past the last event's timestamp, rounded down to the minute.
    end: NaiveDateTime,
    values: Vec<TimedValue>,
}

impl Timeline {
    pub fn new(events: &[Event]) -> Result<Self> {
        let (first, last) = match (events.first(), events.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(AverageError::NoEvents),
        };
        let reference = floor_minute(first.timestamp)?;
        let end = floor_minute(last.timestamp + Duration::minutes(1))?;

        if let Some(index) = events
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            warn!(
                "Event {} is older than the one before it, averages will be wrong",
                index + 1
            );
        }

        let values = events
            .iter()
            .map(|event| TimedValue {
                offset: minute_offset(reference, event.timestamp),
                value: event.duration,
            })
            .collect();

        Ok(Timeline {
            reference,
            end,
            values,
        })
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn total_minutes(&self) -> i64 {
        (self.end - self.reference).num_minutes()
    }

    /// Ticks run from the reference to the end, both included.
    pub fn tick_count(&self) -> usize {
        usize::try_from(self.total_minutes() + 1).unwrap_or(0)
    }

    /// Average duration over the `window_minutes` leading up to every tick.
    pub fn sweep(&self, window_minutes: f64) -> Vec<AverageRecord> {
        info!(
            "Averaging {} events over {} ticks from {} to {} with a {} minute window",
            self.values.len(),
            self.tick_count(),
            self.reference(),
            self.end(),
            window_minutes
        );

        let mut averager = WindowAverager::new(&self.values);
        let mut records = Vec::with_capacity(self.tick_count());
        for minute in 0..=self.total_minutes() {
            let tick = minute as f64;
            let average = averager.window_average(tick - window_minutes, tick);
            let date = self.reference + Duration::minutes(minute);
            records.push(AverageRecord {
                date: date.format(DATE_FORMAT).to_string(),
                average_delivery_time: average,
            });
        }

        debug!(
            "Sweep finished with {} events behind the window, {} reached and {} still in it",
            averager.lower_cursor(),
            averager.upper_cursor(),
            averager.count()
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32, second: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 12, 26)
            .unwrap()
            .and_hms_micro_opt(hour, minute, second, micro)
            .unwrap()
    }

    fn event(timestamp: NaiveDateTime, duration: f64) -> Event {
        Event {
            timestamp,
            duration,
        }
    }

    fn averages(records: &[AverageRecord]) -> Vec<f64> {
        records.iter().map(|r| r.average_delivery_time).collect()
    }

    #[test]
    fn no_events_is_an_error() {
        assert!(matches!(Timeline::new(&[]), Err(AverageError::NoEvents)));
    }

    #[test]
    fn rounds_range_out_to_whole_minutes() {
        let timeline = Timeline::new(&[
            event(at(18, 11, 8, 509654), 20.0),
            event(at(18, 23, 19, 903159), 54.0),
        ])
        .unwrap();
        assert_eq!(timeline.reference(), at(18, 11, 0, 0));
        assert_eq!(timeline.end(), at(18, 24, 0, 0));
        assert_eq!(timeline.total_minutes(), 13);
        assert_eq!(timeline.tick_count(), 14);
    }

    #[test]
    fn end_rounds_up_even_on_a_minute_boundary() {
        let timeline = Timeline::new(&[event(at(10, 0, 0, 0), 1.0)]).unwrap();
        assert_eq!(timeline.reference(), at(10, 0, 0, 0));
        assert_eq!(timeline.end(), at(10, 1, 0, 0));
        assert_eq!(timeline.tick_count(), 2);
    }

    #[test]
    fn offsets_keep_seconds() {
        let reference = at(10, 0, 0, 0);
        assert_eq!(minute_offset(reference, at(10, 2, 30, 0)), 2.5);
        assert_eq!(minute_offset(reference, at(10, 0, 0, 0)), 0.0);
        assert!((minute_offset(reference, at(10, 0, 0, 600_000)) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn two_events_one_minute_window() {
        let timeline = Timeline::new(&[
            event(at(0, 0, 0, 0), 10.0),
            event(at(0, 2, 0, 0), 20.0),
        ])
        .unwrap();
        let records = timeline.sweep(1.0);

        let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(
            dates,
            vec![
                "2018-12-26 00:00:00",
                "2018-12-26 00:01:00",
                "2018-12-26 00:02:00",
                "2018-12-26 00:03:00",
            ]
        );
        assert_eq!(averages(&records), vec![10.0, 10.0, 20.0, 20.0]);
    }

    #[test]
    fn single_event_is_averaged_from_its_tick_on() {
        let timeline = Timeline::new(&[event(at(7, 30, 45, 0), 12.5)]).unwrap();
        let records = timeline.sweep(5.0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2018-12-26 07:30:00");
        assert_eq!(averages(&records), vec![0.0, 12.5]);
    }

    #[test]
    fn sample_log() {
        let timeline = Timeline::new(&[
            event(at(18, 11, 8, 509654), 20.0),
            event(at(18, 15, 19, 903159), 31.0),
            event(at(18, 23, 19, 196688), 54.0),
        ])
        .unwrap();
        let records = timeline.sweep(10.0);

        assert_eq!(records.len(), 14);
        assert_eq!(records[0].date, "2018-12-26 18:11:00");
        assert_eq!(records[13].date, "2018-12-26 18:24:00");
        assert_eq!(
            averages(&records),
            vec![0.0, 20.0, 20.0, 20.0, 20.0, 25.5, 25.5, 25.5, 25.5, 25.5, 25.5, 31.0, 31.0, 42.5]
        );
    }

    #[test]
    fn zero_window_never_averages_anything() {
        let timeline = Timeline::new(&[
            event(at(9, 0, 0, 0), 3.0),
            event(at(9, 1, 30, 0), 4.0),
            event(at(9, 3, 0, 0), 5.0),
        ])
        .unwrap();
        let records = timeline.sweep(0.0);
        assert_eq!(records.len(), 5);
        assert!(averages(&records).iter().all(|&a| a == 0.0));
    }

    #[test]
    fn wide_window_covers_everything() {
        let timeline = Timeline::new(&[
            event(at(9, 0, 10, 0), 3.0),
            event(at(9, 1, 30, 0), 6.0),
            event(at(9, 3, 0, 0), 9.0),
        ])
        .unwrap();
        let records = timeline.sweep(1_000.0);
        assert_eq!(averages(&records), vec![0.0, 3.0, 4.5, 6.0, 6.0]);
    }

    #[test]
    fn sweeping_twice_gives_the_same_result() {
        let timeline = Timeline::new(&[
            event(at(18, 11, 8, 509654), 20.0),
            event(at(18, 15, 19, 903159), 31.0),
            event(at(18, 23, 19, 196688), 54.0),
        ])
        .unwrap();
        let first = serde_json::to_vec(&timeline.sweep(3.5)).unwrap();
        let second = serde_json::to_vec(&timeline.sweep(3.5)).unwrap();
        assert_eq!(first, second);
    }
}
