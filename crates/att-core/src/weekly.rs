//! Weekly aggregation of split pairs into seven weekday buckets.

use chrono::{TimeDelta, Weekday};

use crate::pairing::Pair;
use crate::split::{BusinessHours, DaySplit, hours, seconds, split_pair};

/// Weekdays in bucket order, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Accumulated business and other time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBucket {
    pub business: TimeDelta,
    pub other: TimeDelta,
}

impl Default for DayBucket {
    fn default() -> Self {
        Self {
            business: TimeDelta::zero(),
            other: TimeDelta::zero(),
        }
    }
}

impl DayBucket {
    pub fn add_split(&mut self, split: &DaySplit) {
        self.business += split.business;
        self.other += split.other;
    }

    pub fn add_bucket(&mut self, other: &Self) {
        self.business += other.business;
        self.other += other.other;
    }

    #[must_use]
    pub fn total(&self) -> TimeDelta {
        self.business + self.other
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.business.is_zero() && self.other.is_zero()
    }

    #[must_use]
    pub fn business_seconds(&self) -> f64 {
        seconds(self.business)
    }

    #[must_use]
    pub fn other_seconds(&self) -> f64 {
        seconds(self.other)
    }

    #[must_use]
    pub fn business_hours(&self) -> f64 {
        hours(self.business)
    }

    #[must_use]
    pub fn other_hours(&self) -> f64 {
        hours(self.other)
    }
}

/// Business/other time per weekday, Monday = index 0.
///
/// Buckets hold exact durations, so adding splits in any order or merging
/// partial reports in any grouping gives identical totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklyReport {
    days: [DayBucket; 7],
}

impl WeeklyReport {
    /// Adds one pair's split to the bucket of `weekday`.
    pub fn add(&mut self, weekday: Weekday, split: &DaySplit) {
        self.days[weekday.num_days_from_monday() as usize].add_split(split);
    }

    #[must_use]
    pub fn day(&self, weekday: Weekday) -> &DayBucket {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    /// Buckets in Monday..Sunday order.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DayBucket)> {
        WEEKDAYS.iter().copied().zip(self.days.iter())
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: &Self) {
        for (mine, theirs) in self.days.iter_mut().zip(other.days.iter()) {
            mine.add_bucket(theirs);
        }
    }

    /// Sum of all seven buckets.
    #[must_use]
    pub fn total(&self) -> DayBucket {
        self.days.iter().fold(DayBucket::default(), |mut acc, day| {
            acc.add_bucket(day);
            acc
        })
    }
}

/// Weekly report built from a set of pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub weekly: WeeklyReport,
    /// Pairs the splitter rejected.
    pub invalid_pairs: usize,
}

/// Splits every pair and buckets it under its check-in weekday.
pub fn aggregate_pairs(pairs: &[Pair<'_>], business_hours: &BusinessHours) -> Aggregate {
    let mut aggregate = Aggregate::default();
    for pair in pairs {
        match split_pair(pair, business_hours) {
            Some(split) => aggregate.weekly.add(pair.weekday(), &split),
            None => {
                tracing::debug!(
                    check_in = pair.check_in.id,
                    check_out = pair.check_out.id,
                    "dropping invalid pair"
                );
                aggregate.invalid_pairs += 1;
            }
        }
    }
    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AttendanceEvent, EventKind};
    use crate::pairing::pair_events;
    use crate::split::split_interval;
    use crate::types::CardId;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        // 2025-06-02 is a Monday.
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn tap(id: i64, kind: EventKind, timestamp: NaiveDateTime) -> AttendanceEvent {
        AttendanceEvent {
            id,
            card_id: CardId::new("card-a").unwrap(),
            kind,
            timestamp,
        }
    }

    /// A week of taps with a duplicate, an orphan clock-out and an overnight shift.
    fn week_of_taps() -> Vec<AttendanceEvent> {
        vec![
            tap(1, EventKind::ClockIn, at(2, 8, 30)),
            tap(2, EventKind::ClockOut, at(2, 17, 30)),
            tap(3, EventKind::ClockIn, at(3, 9, 15)),
            tap(4, EventKind::ClockIn, at(3, 10, 0)),
            tap(5, EventKind::ClockOut, at(3, 12, 0)),
            tap(6, EventKind::ClockIn, at(4, 13, 0)),
            tap(7, EventKind::ClockOut, at(4, 19, 45)),
            tap(8, EventKind::ClockOut, at(5, 7, 0)),
            tap(9, EventKind::ClockIn, at(7, 22, 0)),
            tap(10, EventKind::ClockOut, at(8, 2, 0)),
            tap(11, EventKind::ClockIn, at(9, 6, 0)),
            tap(12, EventKind::ClockOut, at(9, 10, 0)),
        ]
    }

    #[test]
    fn pairs_land_in_check_in_weekday() {
        let events = week_of_taps();
        let outcome = pair_events(&events);
        let aggregate = aggregate_pairs(&outcome.pairs, &BusinessHours::default());
        let weekly = aggregate.weekly;

        // Monday twice: 2025-06-02 and 2025-06-09.
        let monday = weekly.day(Weekday::Mon);
        assert_eq!(monday.business, TimeDelta::hours(8) + TimeDelta::hours(1));
        assert_eq!(monday.other, TimeDelta::minutes(60) + TimeDelta::hours(3));

        let tuesday = weekly.day(Weekday::Tue);
        assert_eq!(tuesday.business, TimeDelta::hours(2));
        assert_eq!(tuesday.other, TimeDelta::zero());

        let wednesday = weekly.day(Weekday::Wed);
        assert_eq!(wednesday.business, TimeDelta::hours(4));
        assert_eq!(wednesday.other, TimeDelta::minutes(165));

        assert!(weekly.day(Weekday::Thu).is_empty());
        assert!(weekly.day(Weekday::Sat).is_empty());
        assert!(weekly.day(Weekday::Sun).is_empty());
        assert_eq!(aggregate.invalid_pairs, 0);
    }

    #[test]
    fn buckets_sum_to_flat_total() {
        let events = week_of_taps();
        let outcome = pair_events(&events);
        let hours = BusinessHours::default();
        let weekly = aggregate_pairs(&outcome.pairs, &hours).weekly;

        let mut flat = DayBucket::default();
        for pair in &outcome.pairs {
            let split = split_interval(pair.check_in.timestamp, pair.check_out.timestamp, &hours)
                .unwrap();
            flat.add_split(&split);
        }
        assert_eq!(weekly.total(), flat);
    }

    #[test]
    fn pair_order_does_not_change_buckets() {
        let events = week_of_taps();
        let outcome = pair_events(&events);
        let hours = BusinessHours::default();
        let forward = aggregate_pairs(&outcome.pairs, &hours);

        let mut reversed = outcome.pairs.clone();
        reversed.reverse();
        assert_eq!(aggregate_pairs(&reversed, &hours), forward);

        for shift in 1..outcome.pairs.len() {
            let mut rotated = outcome.pairs.clone();
            rotated.rotate_left(shift);
            assert_eq!(aggregate_pairs(&rotated, &hours), forward);
        }
    }

    #[test]
    fn shuffled_events_give_identical_report() {
        let events = week_of_taps();
        let hours = BusinessHours::default();
        let expected = aggregate_pairs(&pair_events(&events).pairs, &hours);

        let mut shuffled = events;
        shuffled.reverse();
        shuffled.swap(1, 7);
        shuffled.swap(3, 10);
        let actual = aggregate_pairs(&pair_events(&shuffled).pairs, &hours);
        assert_eq!(actual, expected);
    }

    /// Deterministic random number source for generated logs.
    fn lcg(mut seed: u64) -> impl FnMut(u64) -> u64 {
        move |bound: u64| {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (seed >> 33) % bound
        }
    }

    /// Random taps across Monday to Sunday on quarter-hour marks, with ids in time order.
    fn generated_log(next: &mut impl FnMut(u64) -> u64) -> Vec<AttendanceEvent> {
        let count = next(24) + 1;
        let mut quarters: Vec<u64> = (0..count).map(|_| next(7 * 24 * 4)).collect();
        quarters.sort_unstable();
        let base = at(2, 0, 0);
        quarters
            .iter()
            .enumerate()
            .map(|(i, quarter)| {
                let id = i64::try_from(i).unwrap() + 1;
                let timestamp = base + TimeDelta::minutes(i64::try_from(*quarter).unwrap() * 15);
                let kind = if next(2) == 0 {
                    EventKind::ClockIn
                } else {
                    EventKind::ClockOut
                };
                tap(id, kind, timestamp)
            })
            .collect()
    }

    #[test]
    fn generated_logs_decompose_consistently() {
        let mut next = lcg(0x9e37_79b9_7f4a_7c15);
        let all_hours = [
            BusinessHours::default(),
            BusinessHours::new(
                chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                chrono::NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            )
            .unwrap(),
        ];

        for round in 0..200 {
            let events = generated_log(&mut next);
            let hours = &all_hours[round % all_hours.len()];
            let outcome = pair_events(&events);
            let aggregate = aggregate_pairs(&outcome.pairs, hours);
            assert_eq!(aggregate.invalid_pairs, 0, "events: {events:?}");

            for weekday in WEEKDAYS {
                let spans: TimeDelta = outcome
                    .pairs
                    .iter()
                    .filter(|pair| pair.weekday() == weekday)
                    .map(Pair::duration)
                    .sum();
                let bucket = aggregate.weekly.day(weekday);
                assert_eq!(bucket.total(), spans, "{weekday} of events: {events:?}");
                assert!(bucket.business >= TimeDelta::zero());
                assert!(bucket.other >= TimeDelta::zero());
            }

            let flat: TimeDelta = outcome.pairs.iter().map(Pair::duration).sum();
            assert_eq!(aggregate.weekly.total().total(), flat);
        }
    }

    #[test]
    fn generated_logs_ignore_input_order() {
        let mut next = lcg(0x2545_f491_4f6c_dd1d);
        let hours = BusinessHours::default();

        for _ in 0..200 {
            let events = generated_log(&mut next);
            let expected = aggregate_pairs(&pair_events(&events).pairs, &hours);

            // Fisher-Yates with the same generator.
            let mut shuffled = events.clone();
            for i in (1..shuffled.len()).rev() {
                let j = usize::try_from(next(u64::try_from(i).unwrap() + 1)).unwrap();
                shuffled.swap(i, j);
            }
            let actual = aggregate_pairs(&pair_events(&shuffled).pairs, &hours);
            assert_eq!(actual, expected, "events: {events:?}");
        }
    }

    #[test]
    fn merge_is_associative() {
        let events = week_of_taps();
        let outcome = pair_events(&events);
        let hours = BusinessHours::default();
        assert_eq!(outcome.pairs.len(), 4);
        let parts: Vec<WeeklyReport> = [&outcome.pairs[..1], &outcome.pairs[1..3], &outcome.pairs[3..]]
            .iter()
            .map(|chunk| aggregate_pairs(chunk, &hours).weekly)
            .collect();

        let mut left = parts[0];
        left.merge(&parts[1]);
        left.merge(&parts[2]);

        let mut right_tail = parts[1];
        right_tail.merge(&parts[2]);
        let mut right = parts[0];
        right.merge(&right_tail);

        assert_eq!(left, right);
        assert_eq!(left, aggregate_pairs(&outcome.pairs, &hours).weekly);
    }

    #[test]
    fn iter_walks_monday_to_sunday() {
        let days: Vec<Weekday> = WeeklyReport::default().iter().map(|(day, _)| day).collect();
        assert_eq!(days, WEEKDAYS.to_vec());
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "whole-second values are exact")]
    fn hour_accessors_convert_exactly() {
        let mut bucket = DayBucket::default();
        bucket.add_split(&DaySplit {
            business: TimeDelta::minutes(90),
            other: TimeDelta::minutes(15),
        });
        assert_eq!(bucket.business_hours(), 1.5);
        assert_eq!(bucket.other_hours(), 0.25);
        assert_eq!(bucket.business_seconds(), 5400.0);
        assert_eq!(bucket.total(), TimeDelta::minutes(105));
    }
}
