use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use coachslot_core::{
    errors::BookingError,
    models::{
        points::{Adjustment, PointBalance, PointType, PointsPatch},
        reservation::{
            Booker, CreateReservationRequest, GuestDetails, RequestState, ReservationType,
        },
        time_slot::{SessionType, SlotStatus},
    },
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_test::{assert_tokens, Token};

fn at(date: &str, time: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
}

fn request(session_type: &str) -> CreateReservationRequest {
    CreateReservationRequest {
        coach_id: 24,
        date: NaiveDate::from_ymd_opt(2025, 7, 23).unwrap(),
        time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        session_type: session_type.to_string(),
        reservation_type: None,
        user_id: Some(5),
        guest: None,
    }
}

#[test]
fn test_session_type_tokens() {
    assert_tokens(
        &SessionType::Bilan,
        &[Token::UnitVariant {
            name: "SessionType",
            variant: "bilan",
        }],
    );
    assert_tokens(
        &SlotStatus::Unavailable,
        &[Token::UnitVariant {
            name: "SlotStatus",
            variant: "unavailable",
        }],
    );
}

#[test]
fn test_adjustment_tokens() {
    assert_tokens(
        &Adjustment::Remove(3),
        &[
            Token::NewtypeVariant {
                name: "Adjustment",
                variant: "remove",
            },
            Token::I32(3),
        ],
    );
}

#[rstest]
#[case(SessionType::Normal, 55, false)]
#[case(SessionType::Bilan, 25, true)]
fn test_session_type_durations(
    #[case] session_type: SessionType,
    #[case] minutes: i32,
    #[case] free: bool,
) {
    assert_eq!(session_type.duration_minutes(), minutes);
    assert_eq!(session_type.is_free(), free);
    assert_eq!(session_type.as_str().parse::<SessionType>().unwrap(), session_type);
}

#[test]
fn test_slot_status_machine() {
    assert!(SlotStatus::Available.is_bookable());
    assert!(!SlotStatus::Overlapping.is_bookable());
    assert!(SlotStatus::Overlapping.is_blocking());
    assert!(!SlotStatus::Booked.is_deletable());

    assert!(SlotStatus::Available.can_transition_to(SlotStatus::Booked));
    assert!(SlotStatus::Available.can_transition_to(SlotStatus::Unavailable));
    assert!(SlotStatus::Booked.can_transition_to(SlotStatus::Available));
    assert!(!SlotStatus::Booked.can_transition_to(SlotStatus::Unavailable));
    assert!(!SlotStatus::Unavailable.can_transition_to(SlotStatus::Booked));
}

#[rstest]
#[case(PointType::Solo, 1, PointBalance::new(2, 4))]
#[case(PointType::Team, 4, PointBalance::new(3, 0))]
fn test_debit_keeps_total_in_sync(
    #[case] point_type: PointType,
    #[case] amount: i32,
    #[case] expected: PointBalance,
) {
    let balance = PointBalance::new(3, 4).debit(point_type, amount).unwrap();
    assert_eq!(balance, expected);
    assert!(balance.is_consistent());
}

#[test]
fn test_debit_fails_closed() {
    let err = PointBalance::new(0, 5).debit(PointType::Solo, 1).unwrap_err();
    match err {
        BookingError::InsufficientPoints {
            point_type,
            balance,
            required,
        } => {
            assert_eq!(point_type, PointType::Solo);
            assert_eq!(balance, 0);
            assert_eq!(required, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_credit() {
    let balance = PointBalance::new(0, 0).credit(PointType::Team, 1).unwrap();
    assert_eq!(balance, PointBalance::new(0, 1));
    assert!(PointBalance::new(i32::MAX, 0).credit(PointType::Solo, 1).is_err());
}

#[rstest]
#[case(Adjustment::Add(2), 5)]
#[case(Adjustment::Remove(2), 1)]
#[case(Adjustment::Remove(10), 0)]
#[case(Adjustment::Set(0), 0)]
#[case(Adjustment::Set(-4), 0)]
fn test_adjustments_clamp_at_zero(#[case] adjustment: Adjustment, #[case] expected: i32) {
    assert_eq!(adjustment.apply(3), expected);
}

#[test]
fn test_points_patch() {
    let patch = PointsPatch {
        solo: Some(Adjustment::Remove(5)),
        team: Some(Adjustment::Add(2)),
    };
    assert!(patch.validate().is_ok());
    assert_eq!(PointBalance::new(3, 1).apply(&patch).unwrap(), PointBalance::new(0, 3));

    assert!(PointsPatch::default().validate().is_err());
    assert!(
        PointsPatch {
            solo: Some(Adjustment::Add(-1)),
            team: None
        }
        .validate()
        .is_err()
    );
}

#[rstest]
#[case::add_to_solo(Some(Adjustment::Add(i32::MAX)), None)]
#[case::set_team(None, Some(Adjustment::Set(i32::MAX)))]
#[case::both(Some(Adjustment::Set(i32::MAX)), Some(Adjustment::Add(1)))]
fn test_patch_overflowing_total_is_rejected(
    #[case] solo: Option<Adjustment>,
    #[case] team: Option<Adjustment>,
) {
    let patch = PointsPatch { solo, team };
    assert!(patch.validate().is_ok());

    let err = PointBalance::new(5, 1).apply(&patch).unwrap_err();

    assert!(matches!(err, BookingError::Validation(_)));
}

#[test]
fn test_patch_up_to_the_limit_is_kept() {
    let patch = PointsPatch {
        solo: Some(Adjustment::Set(i32::MAX - 1)),
        team: None,
    };

    let balance = PointBalance::new(5, 1).apply(&patch).unwrap();

    assert_eq!(balance.points, i32::MAX);
    assert!(balance.is_consistent());
}

#[test]
fn test_validate_member_booking() {
    let booking = request("normal").validate(at("2025-07-22", "12:00")).unwrap();
    assert_eq!(booking.booker, Booker::Member(5));
    assert_eq!(booking.reservation_type, ReservationType::Individual);
    assert_eq!(booking.cost(), Some((PointType::Solo, 1)));

    let mut group = request("normal");
    group.reservation_type = Some("group".to_string());
    let booking = group.validate(at("2025-07-22", "12:00")).unwrap();
    assert_eq!(booking.cost(), Some((PointType::Team, 1)));

    let booking = request("bilan").validate(at("2025-07-22", "12:00")).unwrap();
    assert_eq!(booking.cost(), None);
}

#[rstest]
#[case::bad_session_type(request("premium"), "2025-07-22")]
#[case::in_the_past(request("normal"), "2025-07-24")]
#[case::no_booker(CreateReservationRequest { user_id: None, ..request("bilan") }, "2025-07-22")]
#[case::guest_paid_session(
    CreateReservationRequest {
        user_id: None,
        guest: Some(GuestDetails {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        }),
        ..request("normal")
    },
    "2025-07-22"
)]
fn test_validate_rejects(#[case] request: CreateReservationRequest, #[case] today: &str) {
    let err = request.validate(at(today, "09:00")).unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)), "got {err}");
    assert_eq!(RequestState::from_error(&err), RequestState::Rejected);
}

#[test]
fn test_validate_guest_bilan() {
    let request = CreateReservationRequest {
        user_id: None,
        guest: Some(GuestDetails {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("+33 6 00 00 00 00".to_string()),
        }),
        ..request("bilan")
    };
    let booking = request.validate(at("2025-07-22", "09:00")).unwrap();
    assert!(matches!(booking.booker, Booker::Guest(_)));
    assert_eq!(booking.booker.user_id(), None);
}
