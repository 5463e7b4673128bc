//! Pairing engine: reconciles CLOCK_OUT taps with earlier CLOCK_IN taps.
//!
//! # Algorithm Summary
//!
//! Events are walked in `(timestamp, id)` order while a stack holds the
//! CLOCK_IN taps of the current calendar day that are still open.
//!
//! 1. When the date changes, every open CLOCK_IN is abandoned (no overnight pairs).
//! 2. A CLOCK_IN is pushed onto the stack.
//! 3. A CLOCK_OUT takes the topmost CLOCK_IN that is strictly earlier than it.
//!    If none exists, the CLOCK_OUT is dropped.
//!
//! Taking the top of the stack is the same as scanning backward for the
//! nearest unused CLOCK_IN, so duplicate CLOCK_IN taps leave the older ones
//! unmatched.

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use serde::Serialize;

use crate::event::{AttendanceEvent, EventKind};

/// A reconciled CLOCK_IN/CLOCK_OUT pair.
///
/// Both events share one calendar date and `check_in` is strictly earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair<'a> {
    pub check_in: &'a AttendanceEvent,
    pub check_out: &'a AttendanceEvent,
}

impl Pair<'_> {
    /// Wall-clock span of the pair.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.check_out.timestamp - self.check_in.timestamp
    }

    /// Weekday the pair is bucketed under (that of the check-in).
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.check_in.timestamp.weekday()
    }
}

/// Counts of taps that did not contribute any time.
///
/// These are data anomalies, not errors: a report still succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairingDiagnostics {
    /// CLOCK_IN taps never closed on the same day (includes duplicate taps).
    pub unmatched_clock_in: usize,
    /// CLOCK_OUT taps with no eligible CLOCK_IN before them.
    pub unmatched_clock_out: usize,
    /// Pairs rejected by the splitter.
    pub invalid_pairs: usize,
}

impl PairingDiagnostics {
    /// Total number of taps or pairs that were dropped.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.unmatched_clock_in + self.unmatched_clock_out + self.invalid_pairs
    }

    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.dropped() == 0
    }
}

/// Result of pairing one card's events.
#[derive(Debug, Clone, Default)]
pub struct PairingOutcome<'a> {
    pub pairs: Vec<Pair<'a>>,
    pub diagnostics: PairingDiagnostics,
}

/// Pairs the events of a single card.
///
/// The input does not need to be sorted; events are ordered by timestamp and
/// then insertion id before pairing.
pub fn pair_events(events: &[AttendanceEvent]) -> PairingOutcome<'_> {
    let mut ordered: Vec<&AttendanceEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.order_key());

    let mut outcome = PairingOutcome::default();
    let mut open: Vec<&AttendanceEvent> = Vec::new();
    let mut open_day: Option<NaiveDate> = None;

    for event in ordered {
        let day = event.date();
        if open_day != Some(day) {
            outcome.diagnostics.unmatched_clock_in += open.len();
            open.clear();
            open_day = Some(day);
        }

        match event.kind {
            EventKind::ClockIn => open.push(event),
            EventKind::ClockOut => {
                // Open taps sharing this timestamp sit on top of the stack and are not eligible.
                match open
                    .iter()
                    .rposition(|check_in| check_in.timestamp < event.timestamp)
                {
                    Some(index) => {
                        let check_in = open.remove(index);
                        outcome.pairs.push(Pair {
                            check_in,
                            check_out: event,
                        });
                    }
                    None => {
                        tracing::trace!(event_id = event.id, "dropping unmatched clock-out");
                        outcome.diagnostics.unmatched_clock_out += 1;
                    }
                }
            }
        }
    }
    outcome.diagnostics.unmatched_clock_in += open.len();

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CardId;
    use chrono::NaiveDateTime;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
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

    fn clock_in(id: i64, timestamp: NaiveDateTime) -> AttendanceEvent {
        tap(id, EventKind::ClockIn, timestamp)
    }

    fn clock_out(id: i64, timestamp: NaiveDateTime) -> AttendanceEvent {
        tap(id, EventKind::ClockOut, timestamp)
    }

    fn pair_ids(outcome: &PairingOutcome<'_>) -> Vec<(i64, i64)> {
        outcome
            .pairs
            .iter()
            .map(|pair| (pair.check_in.id, pair.check_out.id))
            .collect()
    }

    #[test]
    fn simple_pair_is_formed() {
        let events = vec![clock_in(1, at(3, 9, 0)), clock_out(2, at(3, 17, 0))];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(1, 2)]);
        assert_eq!(outcome.pairs[0].duration(), TimeDelta::hours(8));
        assert!(outcome.diagnostics.is_clean());
    }

    #[test]
    fn duplicate_clock_in_pairs_most_recent() {
        let events = vec![
            clock_in(1, at(3, 8, 0)),
            clock_in(2, at(3, 9, 0)),
            clock_out(3, at(3, 12, 0)),
        ];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(2, 3)]);
        assert_eq!(outcome.diagnostics.unmatched_clock_in, 1);
    }

    #[test]
    fn cross_midnight_pair_is_rejected() {
        let events = vec![clock_in(1, at(3, 23, 0)), clock_out(2, at(4, 1, 0))];
        let outcome = pair_events(&events);
        assert!(outcome.pairs.is_empty());
        assert_eq!(
            outcome.diagnostics,
            PairingDiagnostics {
                unmatched_clock_in: 1,
                unmatched_clock_out: 1,
                invalid_pairs: 0,
            }
        );
    }

    #[test]
    fn clock_out_before_any_clock_in_is_dropped() {
        let events = vec![
            clock_out(1, at(3, 8, 0)),
            clock_in(2, at(3, 9, 0)),
            clock_out(3, at(3, 10, 0)),
        ];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(2, 3)]);
        assert_eq!(outcome.diagnostics.unmatched_clock_out, 1);
    }

    #[test]
    fn clock_in_is_never_reused() {
        let events = vec![
            clock_in(1, at(3, 9, 0)),
            clock_out(2, at(3, 10, 0)),
            clock_out(3, at(3, 11, 0)),
        ];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(1, 2)]);
        assert_eq!(outcome.diagnostics.unmatched_clock_out, 1);
    }

    #[test]
    fn second_clock_out_reaches_past_used_clock_in() {
        let events = vec![
            clock_in(1, at(3, 8, 0)),
            clock_in(2, at(3, 9, 0)),
            clock_out(3, at(3, 10, 0)),
            clock_out(4, at(3, 11, 0)),
        ];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(2, 3), (1, 4)]);
        assert!(outcome.diagnostics.is_clean());
    }

    #[test]
    fn same_timestamp_clock_in_is_not_eligible() {
        let events = vec![
            clock_in(1, at(3, 9, 0)),
            clock_in(2, at(3, 10, 0)),
            clock_out(3, at(3, 10, 0)),
        ];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(1, 3)]);
        assert_eq!(outcome.diagnostics.unmatched_clock_in, 1);
    }

    #[test]
    fn unsorted_input_is_ordered_before_pairing() {
        let events = vec![
            clock_out(3, at(3, 12, 0)),
            clock_in(2, at(3, 9, 0)),
            clock_in(1, at(3, 8, 0)),
        ];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(2, 3)]);
    }

    #[test]
    fn open_clock_in_from_previous_day_does_not_leak() {
        let events = vec![
            clock_in(1, at(3, 9, 0)),
            clock_in(2, at(4, 9, 0)),
            clock_out(3, at(4, 12, 0)),
            clock_out(4, at(4, 13, 0)),
        ];
        let outcome = pair_events(&events);
        assert_eq!(pair_ids(&outcome), vec![(2, 3)]);
        assert_eq!(outcome.diagnostics.unmatched_clock_in, 1);
        assert_eq!(outcome.diagnostics.unmatched_clock_out, 1);
        assert_eq!(outcome.diagnostics.dropped(), 2);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let outcome = pair_events(&[]);
        assert!(outcome.pairs.is_empty());
        assert!(outcome.diagnostics.is_clean());
    }

    /// Index-based backward scan with a set of used positions.
    fn reference_pairs(events: &[AttendanceEvent]) -> Vec<(i64, i64)> {
        let mut used = std::collections::HashSet::new();
        let mut pairs = Vec::new();
        for (i, event) in events.iter().enumerate() {
            if event.kind != EventKind::ClockOut {
                continue;
            }
            for j in (0..i).rev() {
                let prev = &events[j];
                if prev.kind == EventKind::ClockIn
                    && prev.timestamp < event.timestamp
                    && !used.contains(&j)
                    && prev.date() == event.date()
                {
                    pairs.push((prev.id, event.id));
                    used.insert(j);
                    break;
                }
            }
        }
        pairs
    }

    #[test]
    fn stack_matches_backward_scan_on_generated_logs() {
        // Small LCG keeps the generated logs deterministic.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: u64| {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (seed >> 33) % bound
        };

        for _ in 0..200 {
            let count = next(12) + 1;
            let mut minutes: Vec<u64> = (0..count).map(|_| next(3 * 24 * 4)).collect();
            minutes.sort_unstable();
            let base = at(2, 0, 0);
            let events: Vec<AttendanceEvent> = minutes
                .iter()
                .enumerate()
                .map(|(i, quarter)| {
                    let id = i64::try_from(i).unwrap() + 1;
                    let timestamp = base + TimeDelta::minutes(i64::try_from(*quarter).unwrap() * 15);
                    if next(2) == 0 {
                        clock_in(id, timestamp)
                    } else {
                        clock_out(id, timestamp)
                    }
                })
                .collect();

            let mut expected = reference_pairs(&events);
            let mut actual = pair_ids(&pair_events(&events));
            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(actual, expected, "events: {events:?}");
        }
    }
}
