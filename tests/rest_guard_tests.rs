use chrono::NaiveDate;
use proptest::prelude::*;
use shift_roster::{
    ExtraHours, RestConflictKind, RestPeriodGuard, RestSide, RosterError, ShiftCategory,
    ShiftEntry, ShiftEntryStore, ShiftTemplate, TemplateCatalog,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Defaults plus a few custom templates with round boundaries.
fn catalog() -> TemplateCatalog {
    let mut catalog = TemplateCatalog::default();
    for (id, start, end) in [
        ("late", "12:00", "20:00"),
        ("early8", "08:00", "16:00"),
        ("early759", "07:59", "15:00"),
        ("overnight8", "20:00", "08:00"),
        ("dawn", "02:00", "10:00"),
    ] {
        catalog
            .add(ShiftTemplate::from_strings(id, id, ShiftCategory::Custom, start, end).unwrap())
            .unwrap();
    }
    catalog
}

fn store_with(entries: &[(&str, NaiveDate)]) -> ShiftEntryStore {
    ShiftEntryStore::from_entries(
        entries
            .iter()
            .map(|(template_id, date)| ShiftEntry::new(*template_id, *date)),
    )
}

fn check(
    store: &ShiftEntryStore,
    date: NaiveDate,
    template_id: &str,
    extra: ExtraHours,
) -> Option<shift_roster::RestConflict> {
    RestPeriodGuard::default()
        .check(date, template_id, extra, &catalog(), |day| store.by_date(day))
        .unwrap()
}

#[test]
fn exactly_twelve_hours_is_allowed_on_both_sides() {
    let store = store_with(&[("late", d(2025, 3, 10))]);
    assert!(check(&store, d(2025, 3, 11), "early8", ExtraHours::None).is_none());

    let store = store_with(&[("early8", d(2025, 3, 11))]);
    assert!(check(&store, d(2025, 3, 10), "late", ExtraHours::None).is_none());
}

#[test]
fn one_minute_short_is_flagged_on_both_sides() {
    let store = store_with(&[("late", d(2025, 3, 10))]);
    let conflict = check(&store, d(2025, 3, 11), "early759", ExtraHours::None).unwrap();
    assert_eq!(conflict.gap_minutes, 719);
    assert_eq!(conflict.side, RestSide::Previous);
    assert_eq!(conflict.kind, RestConflictKind::ShortRest);

    let store = store_with(&[("early759", d(2025, 3, 11))]);
    let conflict = check(&store, d(2025, 3, 10), "late", ExtraHours::None).unwrap();
    assert_eq!(conflict.gap_minutes, 719);
    assert_eq!(conflict.side, RestSide::Next);
}

#[test]
fn back_to_back_shifts_have_zero_rest() {
    let store = store_with(&[("overnight8", d(2025, 3, 10))]);
    let conflict = check(&store, d(2025, 3, 11), "early8", ExtraHours::None).unwrap();
    assert_eq!(conflict.gap_minutes, 0);
    assert_eq!(conflict.kind, RestConflictKind::ShortRest);
    assert_eq!(conflict.gap_label(), "0h 0m");

    let store = store_with(&[("early8", d(2025, 3, 11))]);
    let conflict = check(&store, d(2025, 3, 10), "overnight8", ExtraHours::None).unwrap();
    assert_eq!(conflict.gap_minutes, 0);
    assert_eq!(conflict.side, RestSide::Next);
}

#[test]
fn am_after_pm_the_day_before_is_fine() {
    let store = store_with(&[("t-am", d(2025, 3, 10))]);
    assert!(check(&store, d(2025, 3, 11), "t-pm", ExtraHours::None).is_none());
}

#[test]
fn night_followed_by_am_leaves_thirty_minutes() {
    let store = store_with(&[("t-night", d(2025, 3, 10))]);
    let conflict = check(&store, d(2025, 3, 11), "t-am", ExtraHours::None).unwrap();
    assert_eq!(conflict.gap_minutes, 30);
    assert_eq!(conflict.side, RestSide::Previous);
    assert_eq!(conflict.gap_label(), "0h 30m");
    assert_eq!(conflict.neighbor.template_id, "t-night");

    let store = store_with(&[("t-am", d(2025, 3, 11))]);
    let conflict = check(&store, d(2025, 3, 10), "t-night", ExtraHours::None).unwrap();
    assert_eq!(conflict.gap_minutes, 30);
    assert_eq!(conflict.side, RestSide::Next);
}

#[test]
fn extended_night_overlapping_the_next_morning_is_an_overlap() {
    let store = store_with(&[("t-am", d(2025, 3, 11))]);
    let conflict = check(&store, d(2025, 3, 10), "t-night", ExtraHours::After).unwrap();
    assert_eq!(conflict.gap_minutes, -210);
    assert_eq!(conflict.kind, RestConflictKind::Overlap);
    assert_eq!(conflict.gap_label(), "3h 30m");
}

#[test]
fn extra_hours_on_the_neighbor_count_too() {
    let mut store = ShiftEntryStore::new();
    store.upsert(ShiftEntry::new("late", d(2025, 3, 10)).with_extra_hours(ExtraHours::After));
    let conflict = check(&store, d(2025, 3, 11), "early8", ExtraHours::None).unwrap();
    assert_eq!(conflict.gap_minutes, 480);
}

#[test]
fn earlier_side_wins_when_both_are_short() {
    let store = store_with(&[("t-night", d(2025, 3, 10)), ("dawn", d(2025, 3, 12))]);
    let conflict = check(&store, d(2025, 3, 11), "t-am", ExtraHours::None).unwrap();
    assert_eq!(conflict.side, RestSide::Previous);
    assert_eq!(conflict.gap_minutes, 30);

    // Without the previous neighbor the next one is reported.
    let store = store_with(&[("dawn", d(2025, 3, 12))]);
    let conflict = check(&store, d(2025, 3, 11), "t-am", ExtraHours::None).unwrap();
    assert_eq!(conflict.side, RestSide::Next);
    assert_eq!(conflict.gap_minutes, 645);
}

#[test]
fn leave_is_exempt_as_candidate_and_neighbor() {
    let store = store_with(&[("t-night", d(2025, 3, 10))]);
    assert!(check(&store, d(2025, 3, 11), "t-sick", ExtraHours::None).is_none());
    assert!(check(&store, d(2025, 3, 11), "t-annual", ExtraHours::After).is_none());

    let store = store_with(&[("t-sick", d(2025, 3, 10)), ("t-annual", d(2025, 3, 12))]);
    assert!(check(&store, d(2025, 3, 11), "t-night", ExtraHours::After).is_none());
}

#[test]
fn dangling_neighbors_are_skipped() {
    let store = store_with(&[("t-deleted", d(2025, 3, 10))]);
    assert!(check(&store, d(2025, 3, 11), "t-am", ExtraHours::None).is_none());
}

#[test]
fn unknown_candidate_template_is_an_error() {
    let store = ShiftEntryStore::new();
    let err = RestPeriodGuard::default()
        .check(d(2025, 3, 11), "t-nope", ExtraHours::None, &catalog(), |day| {
            store.by_date(day)
        })
        .unwrap_err();
    assert_eq!(err, RosterError::DanglingTemplate("t-nope".into()));
}

#[test]
fn candidate_past_the_date_range_is_an_error() {
    let store = ShiftEntryStore::new();
    let err = RestPeriodGuard::default()
        .check(NaiveDate::MAX, "t-night", ExtraHours::None, &catalog(), |day| {
            store.by_date(day)
        })
        .unwrap_err();
    assert_eq!(err, RosterError::OutOfRange(NaiveDate::MAX));
}

#[test]
fn shifts_on_the_last_representable_days_do_not_panic() {
    let last = NaiveDate::MAX;
    let before_last = last.pred_opt().unwrap();

    // The night on the last day cannot be resolved and is skipped as a neighbor.
    let store = store_with(&[("t-night", last)]);
    assert!(check(&store, before_last, "t-am", ExtraHours::None).is_none());

    // A day shift on the last day has no next day to look at.
    let store = store_with(&[("t-night", before_last)]);
    let conflict = check(&store, last, "t-am", ExtraHours::None).unwrap();
    assert_eq!(conflict.side, RestSide::Previous);
    assert_eq!(conflict.gap_minutes, 30);
}

#[test]
fn custom_threshold_is_respected() {
    let store = store_with(&[("late", d(2025, 3, 10))]);
    let guard = RestPeriodGuard::new(11 * 60);
    let result = guard
        .check(d(2025, 3, 11), "early759", ExtraHours::None, &catalog(), |day| {
            store.by_date(day)
        })
        .unwrap();
    assert!(result.is_none());
    assert_eq!(guard.min_rest_minutes(), 660);
}

proptest! {
    #[test]
    fn same_day_entries_never_count_as_neighbors(offset in 0i64..365) {
        let date = d(2025, 1, 1) + chrono::Duration::days(offset);
        let store = store_with(&[("t-night", date)]);
        let far = store_with(&[("t-night", date - chrono::Duration::days(2))]);
        prop_assert!(check(&store, date, "t-am", ExtraHours::None).is_none());
        prop_assert!(check(&far, date, "t-am", ExtraHours::Before).is_none());
    }
}
