//! Rolling analytics over a trailing window of workout days.
//!
//! Block payloads are user-entered and messy, so extraction is defensive:
//! any value that cannot be coerced to a number is skipped and the rest of
//! the batch is still summarized. Nothing in here fails on payload content.
//!
//! Extraction rules:
//! - `activity` blocks with a `steps` key contribute to the step average
//! - `strength` blocks whose lowercased `exercise` contains a tracked lift's
//!   pattern overwrite that lift's weight with every coercible set weight,
//!   so the reported value is the last set of the last matching block of
//!   the chronologically last day

use crate::block::{Block, BlockKind};
use crate::config::TrackedLifts;
use crate::store::RecordStore;
use crate::{AnalyticsSummary, Result, WorkoutDay};
use chrono::{Days, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reduce a window's records into a summary
///
/// Records may arrive in any order; they are replayed by date, then by id,
/// so "last" always means most recent.
pub fn compute_analytics(
    records: &[WorkoutDay],
    window_days: i64,
    lifts: &TrackedLifts,
) -> AnalyticsSummary {
    let mut ordered: Vec<&WorkoutDay> = records.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let patterns: Vec<(&str, String)> = lifts
        .iter()
        .map(|(key, pattern)| (key, pattern.to_lowercase()))
        .collect();

    let mut steps = Vec::new();
    let mut weights: BTreeMap<String, Option<f64>> = lifts
        .iter()
        .map(|(key, _)| (key.to_string(), None))
        .collect();

    for day in &ordered {
        for block in &day.blocks {
            match block.kind() {
                BlockKind::Activity => {
                    if let Some(value) = block.get("steps") {
                        match coerce_steps(value) {
                            Some(count) => steps.push(count),
                            None => tracing::debug!(
                                "Skipping non-numeric steps {} on day {}",
                                value,
                                day.id
                            ),
                        }
                    }
                }
                BlockKind::Strength => record_weights(block, &patterns, &mut weights),
                BlockKind::Other(_) => {}
            }
        }
    }

    let avg_steps = truncating_mean(&steps);

    tracing::debug!(
        "Summarized {} days: {} step entries, {} of {} lifts seen",
        ordered.len(),
        steps.len(),
        weights.values().filter(|w| w.is_some()).count(),
        weights.len()
    );

    AnalyticsSummary {
        window_days,
        training_days: records.len(),
        avg_steps,
        last_working_weights: weights,
    }
}

/// Inclusive date range `[today - window_days + 1, today]`
///
/// Returns `None` when the window is empty (`window_days <= 0`). Windows
/// reaching past the earliest representable date are clamped.
pub fn window_bounds(today: NaiveDate, window_days: i64) -> Option<(NaiveDate, NaiveDate)> {
    if window_days <= 0 {
        return None;
    }
    let span = Days::new((window_days - 1) as u64);
    let start = today.checked_sub_days(span).unwrap_or(NaiveDate::MIN);
    Some((start, today))
}

/// Fetch the trailing window from a store and summarize it
pub fn summarize_window<S: RecordStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    window_days: i64,
    lifts: &TrackedLifts,
) -> Result<AnalyticsSummary> {
    let records = match window_bounds(today, window_days) {
        Some((start, end)) => {
            tracing::debug!("Fetching records from {} to {}", start, end);
            store.fetch_records_in_range(start, end)?
        }
        None => {
            tracing::debug!("Empty window of {} days, nothing to fetch", window_days);
            Vec::new()
        }
    };

    Ok(compute_analytics(&records, window_days, lifts))
}

fn record_weights(
    block: &Block,
    patterns: &[(&str, String)],
    weights: &mut BTreeMap<String, Option<f64>>,
) {
    let exercise = match block.get("exercise") {
        Some(Value::String(name)) => name.to_lowercase(),
        _ => String::new(),
    };
    let sets = match block.get("sets") {
        Some(Value::Array(sets)) => sets.as_slice(),
        _ => &[],
    };

    for (key, pattern) in patterns {
        if !exercise.contains(pattern.as_str()) {
            continue;
        }
        for set in sets {
            let weight = match set.get("weight") {
                None | Some(Value::Null) => continue,
                Some(weight) => weight,
            };
            match coerce_weight(weight) {
                Some(value) => {
                    weights.insert((*key).to_string(), Some(value));
                }
                None => tracing::debug!("Skipping non-numeric weight {} for {}", weight, key),
            }
        }
    }
}

/// Integer coercion for step counts
///
/// Empty values (`null`, `""`, `false`, `[]`, `{}`) count as zero steps,
/// floats are truncated toward zero, strings must hold an integer.
fn coerce_steps(value: &Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(text) if text.is_empty() => Some(0),
        Value::String(text) => text.trim().parse().ok(),
        Value::Array(items) if items.is_empty() => Some(0),
        Value::Object(fields) if fields.is_empty() => Some(0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Float coercion for set weights. Non-finite values are rejected.
fn coerce_weight(value: &Value) -> Option<f64> {
    let weight = match value {
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    weight.filter(|w: &f64| w.is_finite())
}

fn truncating_mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let sum: i128 = values.iter().map(|&v| i128::from(v)).sum();
    Some((sum / values.len() as i128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use crate::NewWorkoutDay;
    use serde_json::json;

    const SQUAT: &str = "присед";
    const DEADLIFT: &str = "становая";
    const PRESS: &str = "жим стоя";

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn block(kind: &str, data: Value) -> Block {
        Block::new(kind, data).unwrap()
    }

    fn steps(value: Value) -> Block {
        block("activity", json!({ "steps": value }))
    }

    fn lift(exercise: &str, weights: &[Value]) -> Block {
        let sets: Vec<Value> = weights
            .iter()
            .map(|w| json!({ "weight": w, "reps": 5 }))
            .collect();
        block("strength", json!({ "exercise": exercise, "sets": sets }))
    }

    fn day(id: u64, day_of_month: u32, blocks: Vec<Block>) -> WorkoutDay {
        WorkoutDay {
            id,
            date: date(day_of_month),
            scenario_type: "mixed".into(),
            blocks,
            comment: String::new(),
        }
    }

    fn summarize(records: &[WorkoutDay]) -> AnalyticsSummary {
        compute_analytics(records, 14, &TrackedLifts::default())
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(&[]);
        assert_eq!(summary.window_days, 14);
        assert_eq!(summary.training_days, 0);
        assert_eq!(summary.avg_steps, None);
        assert_eq!(summary.last_working_weights.len(), 3);
        assert!(summary.last_working_weights.values().all(|w| w.is_none()));
    }

    #[test]
    fn test_training_days_count_empty_records() {
        let records = vec![
            day(1, 1, vec![]),
            day(2, 2, vec![block("note", json!({"text": "rest"}))]),
            day(3, 2, vec![steps(json!(100))]),
        ];
        assert_eq!(summarize(&records).training_days, 3);
    }

    #[test]
    fn test_window_days_echoed() {
        let summary = compute_analytics(&[], -3, &TrackedLifts::default());
        assert_eq!(summary.window_days, -3);
    }

    #[test]
    fn test_avg_steps_mixed_types() {
        let records = vec![
            day(1, 1, vec![steps(json!("5000"))]),
            day(2, 2, vec![steps(json!(7000))]),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.avg_steps, Some(6000));
        assert_eq!(summary.training_days, 2);
    }

    #[test]
    fn test_avg_steps_truncates() {
        let records = vec![day(
            1,
            1,
            vec![steps(json!(1000)), steps(json!(1001)), steps(json!(1001))],
        )];
        assert_eq!(summarize(&records).avg_steps, Some(1000));
    }

    #[test]
    fn test_unparseable_steps_excluded() {
        let records = vec![day(
            1,
            1,
            vec![
                steps(json!("lots")),
                steps(json!(3000)),
                steps(json!([1, 2])),
                steps(json!("4000")),
            ],
        )];
        assert_eq!(summarize(&records).avg_steps, Some(3500));
    }

    #[test]
    fn test_only_unparseable_steps_is_absent() {
        let records = vec![day(1, 1, vec![steps(json!("n/a"))])];
        assert_eq!(summarize(&records).avg_steps, None);
    }

    #[test]
    fn test_empty_steps_count_as_zero() {
        let records = vec![day(1, 1, vec![steps(Value::Null), steps(json!(4000))])];
        assert_eq!(summarize(&records).avg_steps, Some(2000));
    }

    #[test]
    fn test_fractional_steps_truncated() {
        let records = vec![day(1, 1, vec![steps(json!(5000.9))])];
        assert_eq!(summarize(&records).avg_steps, Some(5000));
    }

    #[test]
    fn test_steps_only_read_from_activity_blocks() {
        let records = vec![day(
            1,
            1,
            vec![
                block("strength", json!({"steps": 9999})),
                block("Activity", json!({"steps": 9999})),
                block("activity", json!({"distance_km": 5})),
                steps(json!(2000)),
            ],
        )];
        assert_eq!(summarize(&records).avg_steps, Some(2000));
    }

    #[test]
    fn test_last_set_of_last_block_wins() {
        let records = vec![day(
            1,
            1,
            vec![
                lift("Присед", &[json!(40), json!(60)]),
                lift("присед с паузой", &[json!(70), json!(80)]),
            ],
        )];
        let weights = summarize(&records).last_working_weights;
        assert_eq!(weights[SQUAT], Some(80.0));
        assert_eq!(weights[DEADLIFT], None);
    }

    #[test]
    fn test_recency_beats_magnitude() {
        let records = vec![
            day(1, 1, vec![lift("Становая тяга", &[json!(140)])]),
            day(2, 5, vec![lift("становая тяга", &[json!(100)])]),
        ];
        let weights = summarize(&records).last_working_weights;
        assert_eq!(weights[DEADLIFT], Some(100.0));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let records = vec![
            day(3, 9, vec![lift("Жим стоя", &[json!(45)])]),
            day(1, 2, vec![lift("Жим стоя", &[json!(40)]), steps(json!(8000))]),
            day(2, 5, vec![lift("Жим стоя", &[json!(50)])]),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let forward = summarize(&records);
        assert_eq!(forward.last_working_weights[PRESS], Some(45.0));
        assert_eq!(forward, summarize(&reversed));
    }

    #[test]
    fn test_same_date_ordered_by_id() {
        let records = vec![
            day(8, 3, vec![lift("присед", &[json!(90)])]),
            day(7, 3, vec![lift("присед", &[json!(95)])]),
        ];
        let weights = summarize(&records).last_working_weights;
        assert_eq!(weights[SQUAT], Some(90.0));
    }

    #[test]
    fn test_substring_match_is_permissive() {
        let records = vec![day(
            1,
            1,
            vec![
                lift("Становая тяга", &[json!(120)]),
                lift("СТАНОВАЯ на прямых ногах", &[json!(80)]),
            ],
        )];
        let weights = summarize(&records).last_working_weights;
        assert_eq!(weights[DEADLIFT], Some(80.0));
    }

    #[test]
    fn test_unparseable_weight_leaves_lift_absent() {
        let records = vec![day(1, 1, vec![lift("присед", &[json!("not-a-number")])])];
        let weights = summarize(&records).last_working_weights;
        assert_eq!(weights[SQUAT], None);
    }

    #[test]
    fn test_unparseable_weight_keeps_previous_value() {
        let records = vec![day(
            1,
            1,
            vec![lift("присед", &[json!(100), json!("abc"), Value::Null])],
        )];
        let weights = summarize(&records).last_working_weights;
        assert_eq!(weights[SQUAT], Some(100.0));
    }

    #[test]
    fn test_string_weights_parse() {
        let records = vec![day(1, 1, vec![lift("жим стоя", &[json!(" 42.5 ")])])];
        let weights = summarize(&records).last_working_weights;
        assert_eq!(weights[PRESS], Some(42.5));
    }

    #[test]
    fn test_malformed_strength_payloads_do_not_panic() {
        let records = vec![day(
            1,
            1,
            vec![
                block("strength", json!({})),
                block("strength", json!({"exercise": 42, "sets": [{"weight": 10}]})),
                block("strength", json!({"exercise": "присед", "sets": "5x5"})),
                block("strength", json!({"exercise": "присед", "sets": [7, "x", null]})),
                block("strength", json!({"exercise": "присед", "sets": [{"reps": 5}]})),
                block("strength", json!({"exercise": "присед", "sets": [{"weight": "NaN"}]})),
            ],
        )];
        let summary = summarize(&records);
        assert_eq!(summary.training_days, 1);
        assert!(summary.last_working_weights.values().all(|w| w.is_none()));
    }

    #[test]
    fn test_custom_tracked_lifts() {
        let lifts: TrackedLifts = [("bench", "Bench Press")].into_iter().collect();
        let records = vec![day(
            1,
            1,
            vec![lift("Paused bench press", &[json!(80), json!(85)])],
        )];
        let summary = compute_analytics(&records, 7, &lifts);

        assert_eq!(summary.last_working_weights.len(), 1);
        assert_eq!(summary.last_working_weights["bench"], Some(85.0));
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            day(1, 1, vec![steps(json!("6100")), lift("присед", &[json!(100)])]),
            day(2, 2, vec![steps(json!(7300)), lift("жим стоя", &[json!(50)])]),
        ];
        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn test_window_bounds() {
        let today = date(15);
        assert_eq!(window_bounds(today, 1), Some((today, today)));
        assert_eq!(window_bounds(today, 14), Some((date(2), today)));
        assert_eq!(window_bounds(today, 0), None);
        assert_eq!(window_bounds(today, -5), None);
        assert_eq!(
            window_bounds(today, i64::MAX),
            Some((NaiveDate::MIN, today))
        );
    }

    fn seeded_store() -> (tempfile::TempDir, JsonFileStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(temp_dir.path());
        let entries = [
            (1, json!(1000), json!(150)),
            (10, json!(3000), json!(100)),
            (14, json!("5000"), json!(110)),
            (20, json!(99999), json!(200)),
        ];
        for (day_of_month, step_count, weight) in entries {
            store
                .create_day(NewWorkoutDay {
                    date: date(day_of_month),
                    scenario_type: "mixed".into(),
                    blocks: vec![
                        block("activity", json!({ "steps": step_count })),
                        lift("Присед", &[weight]),
                    ],
                    comment: String::new(),
                })
                .unwrap();
        }
        (temp_dir, store)
    }

    #[test]
    fn test_summarize_window_scopes_records() {
        let (_dir, store) = seeded_store();
        let lifts = TrackedLifts::default();

        // June 1..=14, excludes the future-dated June 20 entry
        let summary = summarize_window(&store, date(14), 14, &lifts).unwrap();
        assert_eq!(summary.window_days, 14);
        assert_eq!(summary.training_days, 3);
        assert_eq!(summary.avg_steps, Some(3000));
        assert_eq!(summary.last_working_weights[SQUAT], Some(110.0));

        // June 10..=14
        let summary = summarize_window(&store, date(14), 5, &lifts).unwrap();
        assert_eq!(summary.training_days, 2);
        assert_eq!(summary.avg_steps, Some(4000));
    }

    #[test]
    fn test_summarize_non_positive_window_is_empty() {
        let (_dir, store) = seeded_store();
        let lifts = TrackedLifts::default();

        for window in [0, -1, -30] {
            let summary = summarize_window(&store, date(14), window, &lifts).unwrap();
            assert_eq!(summary.window_days, window);
            assert_eq!(summary.training_days, 0);
            assert_eq!(summary.avg_steps, None);
            assert!(summary.last_working_weights.values().all(|w| w.is_none()));
        }
    }
}
