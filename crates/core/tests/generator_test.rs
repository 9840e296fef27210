use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use coachslot_core::{
    errors::BookingError,
    generator::{expand_dates, generate, generate_range, CandidateSlot},
    models::time_slot::{GenerateSlotsRequest, SessionType},
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn t(hhmm: &str) -> NaiveTime {
    NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap()
}

fn d(ymd: &str) -> NaiveDate {
    NaiveDate::parse_from_str(ymd, "%Y-%m-%d").unwrap()
}

fn now() -> NaiveDateTime {
    d("2025-07-01").and_time(t("00:00"))
}

fn starts(slots: &[CandidateSlot], session_type: SessionType) -> Vec<String> {
    slots
        .iter()
        .filter(|s| s.session_type == session_type)
        .map(|s| format!("{}-{}", s.start_time.format("%H:%M"), s.end_time.format("%H:%M")))
        .collect()
}

#[test_log::test]
fn test_generates_both_types_on_half_hour_cadence() {
    let slots = generate(
        d("2025-07-23"),
        t("07:00"),
        t("11:00"),
        &[SessionType::Normal, SessionType::Bilan],
        now(),
    )
    .unwrap();

    assert_eq!(
        starts(&slots, SessionType::Normal),
        vec![
            "07:00-07:55",
            "07:30-08:25",
            "08:00-08:55",
            "08:30-09:25",
            "09:00-09:55",
            "09:30-10:25",
            "10:00-10:55",
        ]
    );
    assert_eq!(
        starts(&slots, SessionType::Bilan),
        vec![
            "07:00-07:25",
            "07:30-07:55",
            "08:00-08:25",
            "08:30-08:55",
            "09:00-09:25",
            "09:30-09:55",
            "10:00-10:25",
            "10:30-10:55",
        ]
    );
    assert!(slots.iter().all(|s| s.date == d("2025-07-23")));
    assert!(slots.iter().filter(|s| s.is_free()).all(|s| s.session_type == SessionType::Bilan));
}

#[test]
fn test_generation_is_deterministic_and_deduplicates_types() {
    let a = generate(
        d("2025-07-23"),
        t("09:00"),
        t("10:00"),
        &[SessionType::Bilan, SessionType::Bilan],
        now(),
    )
    .unwrap();
    let b = generate(d("2025-07-23"), t("09:00"), t("10:00"), &[SessionType::Bilan], now()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

#[rstest]
#[case(t("09:00"), t("09:20"), &[SessionType::Bilan])]
#[case(t("09:00"), t("09:50"), &[SessionType::Normal])]
fn test_short_window_yields_nothing(
    #[case] start: NaiveTime,
    #[case] end: NaiveTime,
    #[case] types: &[SessionType],
) {
    let slots = generate(d("2025-07-23"), start, end, types, now()).unwrap();
    assert!(slots.is_empty());
}

#[rstest]
#[case::inverted(d("2025-07-23"), t("11:00"), t("07:00"))]
#[case::empty(d("2025-07-23"), t("09:00"), t("09:00"))]
#[case::past_date(d("2025-06-30"), t("07:00"), t("11:00"))]
fn test_rejects_invalid_windows(
    #[case] date: NaiveDate,
    #[case] start: NaiveTime,
    #[case] end: NaiveTime,
) {
    let err = generate(date, start, end, &[SessionType::Normal], now()).unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[test]
fn test_rejects_window_already_started_today() {
    let now = d("2025-07-23").and_time(t("08:00"));
    assert!(generate(d("2025-07-23"), t("07:00"), t("11:00"), &[SessionType::Normal], now).is_err());
    assert!(generate(d("2025-07-23"), t("08:00"), t("11:00"), &[SessionType::Normal], now).is_ok());
}

fn range_request() -> GenerateSlotsRequest {
    GenerateSlotsRequest {
        start_date: d("2025-07-21"),
        end_date: Some(d("2025-07-27")),
        start_time: t("09:00"),
        end_time: t("10:00"),
        session_types: vec![SessionType::Normal],
        repeat_weeks: None,
        days_of_week: vec![Weekday::Mon, Weekday::Wed],
    }
}

#[test]
fn test_expand_dates_filters_weekdays() {
    let dates = expand_dates(&range_request()).unwrap();
    assert_eq!(dates, vec![d("2025-07-21"), d("2025-07-23")]);
}

#[test]
fn test_expand_dates_repeats_weekly() {
    let request = GenerateSlotsRequest {
        repeat_weeks: Some(2),
        ..range_request()
    };
    let dates = expand_dates(&request).unwrap();
    assert_eq!(
        dates,
        vec![
            d("2025-07-21"),
            d("2025-07-23"),
            d("2025-07-28"),
            d("2025-07-30"),
            d("2025-08-04"),
            d("2025-08-06"),
        ]
    );
}

#[test]
fn test_expand_dates_defaults_to_single_day() {
    let request = GenerateSlotsRequest {
        end_date: None,
        days_of_week: vec![],
        ..range_request()
    };
    assert_eq!(expand_dates(&request).unwrap(), vec![d("2025-07-21")]);
}

#[test]
fn test_expand_dates_rejects_bad_ranges() {
    let inverted = GenerateSlotsRequest {
        end_date: Some(d("2025-07-01")),
        ..range_request()
    };
    assert!(expand_dates(&inverted).is_err());

    let huge = GenerateSlotsRequest {
        end_date: Some(d("2027-07-01")),
        days_of_week: vec![],
        ..range_request()
    };
    assert!(expand_dates(&huge).is_err());
}

#[test]
fn test_generate_range() {
    let slots = generate_range(&range_request(), now()).unwrap();
    // 09:00-09:55 is the only normal slot that fits a one-hour window
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].date, d("2025-07-21"));
    assert_eq!(slots[1].date, d("2025-07-23"));
    assert!(slots.iter().all(|s| s.start_time == t("09:00")));
}
