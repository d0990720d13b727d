//! Integration tests for the booking lifecycle service using in-memory
//! SurrealDB.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tutorhub_booking::{
    AvailabilityService, BookingConfig, BookingNotification, BookingService,
    CreateBookingRequest, FixedExchangeRate, Notifier, NotifyError, RescheduleRequest,
};
use tutorhub_core::error::TutorError;
use tutorhub_core::models::Actor;
use tutorhub_core::models::availability::{Availability, AvailabilityWindow, day_of_week};
use tutorhub_core::models::booking::{
    BookingFilter, BookingStatus, BookingTransition, SessionEffect,
};
use tutorhub_core::models::booking_history::{CreateBookingHistory, HistoryAction};
use tutorhub_core::models::subject::CreateSubject;
use tutorhub_core::models::teacher::{CreateTeacherProfile, Currency, UpdateTeacherProfile};
use tutorhub_core::models::teaching_session::{TeachingSessionStatus, UpdateTeachingSession};
use tutorhub_core::repository::{
    BookingRepository, Pagination, Repositories, SubjectRepository, TeacherProfileRepository,
};
use tutorhub_db::SurrealRepositories;
use uuid::Uuid;

/// Records the kind of every notification it is asked to deliver.
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingNotifier {
    fn kinds(&self) -> Vec<&'static str> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.kind());
        Ok(())
    }
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn notify(&self, _: &BookingNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp unreachable".into()))
    }
}

struct Fixture {
    db: Surreal<Db>,
    repos: SurrealRepositories<Db>,
    teacher: Actor,
    student: Actor,
    guardian: Actor,
    subject_id: Uuid,
    monday: Availability,
    wednesday: Availability,
}

/// Spin up in-memory DB, run migrations, create a priced teacher with
/// Monday 18:00–19:00 and Wednesday 10:00–12:00 windows.
async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tutorhub_db::run_migrations(&db).await.unwrap();

    let repos = SurrealRepositories::new(db.clone());
    let teacher = Actor::new(Uuid::new_v4());

    repos
        .profiles()
        .create(CreateTeacherProfile {
            teacher_id: teacher.id,
            hourly_rate_ngn: Some(5000.0),
            hourly_rate_usd: None,
            preferred_currency: Currency::Ngn,
            time_zone: "Africa/Lagos".into(),
            subjects: vec!["Mathematics".into()],
            specializations: vec!["algebra".into()],
        })
        .await
        .unwrap();

    let subject = repos
        .subjects()
        .create(CreateSubject {
            name: "Mathematics".into(),
        })
        .await
        .unwrap();

    let windows = AvailabilityService::new(repos.clone())
        .replace_weekly(
            teacher.id,
            vec![
                AvailabilityWindow {
                    day_of_week: 1,
                    start_time: hm(18, 0),
                    end_time: hm(19, 0),
                },
                AvailabilityWindow {
                    day_of_week: 3,
                    start_time: hm(10, 0),
                    end_time: hm(12, 0),
                },
            ],
        )
        .await
        .unwrap();

    Fixture {
        db,
        repos,
        teacher,
        student: Actor::new(Uuid::new_v4()),
        guardian: Actor {
            id: Uuid::new_v4(),
            ip_address: Some("203.0.113.7".into()),
            user_agent: Some("tutorhub-tests".into()),
        },
        subject_id: subject.id,
        monday: windows[0].clone(),
        wednesday: windows[1].clone(),
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// First date after today falling on `day` (0 = Sunday).
fn next_weekday(day: u8) -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(1);
    while day_of_week(date) != day {
        date += Duration::days(1);
    }
    date
}

fn service(
    fx: &Fixture,
) -> (
    BookingService<SurrealRepositories<Db>, FixedExchangeRate, RecordingNotifier>,
    RecordingNotifier,
) {
    service_with(fx, BookingConfig::default())
}

fn service_with(
    fx: &Fixture,
    config: BookingConfig,
) -> (
    BookingService<SurrealRepositories<Db>, FixedExchangeRate, RecordingNotifier>,
    RecordingNotifier,
) {
    let notifier = RecordingNotifier::default();
    let service = BookingService::new(
        fx.repos.clone(),
        FixedExchangeRate::new(config.ngn_per_usd),
        notifier.clone(),
        config,
    );
    (service, notifier)
}

fn monday_request(fx: &Fixture) -> CreateBookingRequest {
    CreateBookingRequest {
        student_id: fx.student.id,
        teacher_id: fx.teacher.id,
        subject_id: fx.subject_id,
        dates: vec![next_weekday(1)],
        availability_ids: vec![fx.monday.id],
        notes: Some("Algebra revision before exams".into()),
    }
}

async fn session_rows(fx: &Fixture, booking_id: Uuid) -> usize {
    let mut result = fx
        .db
        .query("SELECT * FROM teaching_session WHERE booking_id = $id")
        .bind(("id", booking_id.to_string()))
        .await
        .unwrap();
    let rows: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    rows.len()
}

// -----------------------------------------------------------------------
// Creation
// -----------------------------------------------------------------------

#[tokio::test]
async fn monday_window_books_one_pending_hour() {
    let fx = setup().await;
    let (service, notifier) = service(&fx);

    let bookings = service.create(monday_request(&fx), &fx.guardian).await.unwrap();

    assert_eq!(bookings.len(), 1);
    let booking = &bookings[0];
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.booking_date, next_weekday(1));
    assert_eq!(booking.start_time, hm(18, 0));
    assert_eq!(booking.end_time, hm(19, 0));
    assert_eq!(booking.duration_minutes, 60);
    assert_eq!(booking.created_by_id, fx.guardian.id);
    assert_eq!(booking.student_id, fx.student.id);
    assert_eq!(booking.version, 1);

    assert_eq!(booking.rate.hourly_rate_ngn, 5000.0);
    assert_eq!(booking.rate.hourly_rate_usd, 3.33);
    assert_eq!(booking.rate.exchange_rate_used, 1500.0);
    assert_eq!(booking.rate.rate_currency, Currency::Ngn);
    assert_eq!(booking.locked_price(), 5000.0);

    let history = service.history(booking.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, HistoryAction::Created);
    assert_eq!(history[0].performed_by_id, fx.guardian.id);
    assert_eq!(history[0].ip_address.as_deref(), Some("203.0.113.7"));

    assert!(service.session(booking.id).await.unwrap().is_none());
    assert_eq!(notifier.kinds(), vec!["booking_requested"]);
}

#[tokio::test]
async fn several_dates_book_one_slot_each() {
    let fx = setup().await;
    let (service, _) = service(&fx);

    let mut request = monday_request(&fx);
    request.dates = vec![next_weekday(1), next_weekday(3)];
    request.availability_ids = vec![fx.monday.id, fx.wednesday.id];

    let bookings = service.create(request, &fx.guardian).await.unwrap();
    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[1].duration_minutes, 120);
    // One rate lock per request.
    assert_eq!(bookings[0].rate, bookings[1].rate);
}

#[tokio::test]
async fn holiday_mode_rejects_before_any_booking_exists() {
    let fx = setup().await;
    let (service, notifier) = service(&fx);
    AvailabilityService::new(fx.repos.clone())
        .set_holiday_mode(fx.teacher.id, true)
        .await
        .unwrap();

    let err = service
        .create(monday_request(&fx), &fx.guardian)
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::TeacherUnavailable));

    let listed = service
        .list_for_teacher(fx.teacher.id, BookingFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 0);
    assert!(notifier.kinds().is_empty());
}

#[tokio::test]
async fn empty_selection_fails_fast() {
    let fx = setup().await;
    let (service, _) = service(&fx);

    let mut request = monday_request(&fx);
    request.dates.clear();
    let err = service.create(request, &fx.guardian).await.unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));

    let mut request = monday_request(&fx);
    request.availability_ids.clear();
    let err = service.create(request, &fx.guardian).await.unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));
}

#[tokio::test]
async fn date_on_another_weekday_is_rejected() {
    let fx = setup().await;
    let (service, _) = service(&fx);

    let mut request = monday_request(&fx);
    request.dates = vec![next_weekday(2)];
    let err = service.create(request, &fx.guardian).await.unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));
}

#[tokio::test]
async fn foreign_availability_is_rejected() {
    let fx = setup().await;
    let (service, _) = service(&fx);

    let other_teacher = Uuid::new_v4();
    let foreign = AvailabilityService::new(fx.repos.clone())
        .replace_weekly(
            other_teacher,
            vec![AvailabilityWindow {
                day_of_week: 1,
                start_time: hm(8, 0),
                end_time: hm(9, 0),
            }],
        )
        .await
        .unwrap();

    let mut request = monday_request(&fx);
    request.availability_ids = vec![foreign[0].id];
    let err = service.create(request, &fx.guardian).await.unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));
}

#[tokio::test]
async fn unknown_subject_is_not_found() {
    let fx = setup().await;
    let (service, _) = service(&fx);

    let mut request = monday_request(&fx);
    request.subject_id = Uuid::new_v4();
    let err = service.create(request, &fx.guardian).await.unwrap_err();
    assert!(matches!(err, TutorError::NotFound { .. }));
}

#[tokio::test]
async fn unpriced_teacher_needs_the_switch() {
    let fx = setup().await;
    let teacher = Uuid::new_v4();
    let windows = AvailabilityService::new(fx.repos.clone())
        .replace_weekly(
            teacher,
            vec![AvailabilityWindow {
                day_of_week: 1,
                start_time: hm(18, 0),
                end_time: hm(19, 0),
            }],
        )
        .await
        .unwrap();
    let request = CreateBookingRequest {
        teacher_id: teacher,
        availability_ids: vec![windows[0].id],
        ..monday_request(&fx)
    };

    let (strict, _) = service(&fx);
    let err = strict.create(request.clone(), &fx.guardian).await.unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));

    let (lenient, _) = service_with(
        &fx,
        BookingConfig {
            allow_unpriced_bookings: true,
            ..BookingConfig::default()
        },
    );
    let bookings = lenient.create(request, &fx.guardian).await.unwrap();
    assert_eq!(bookings[0].rate.hourly_rate_ngn, 0.0);
    assert_eq!(bookings[0].rate.hourly_rate_usd, 0.0);
}

#[tokio::test]
async fn profile_without_rates_needs_the_switch() {
    let fx = setup().await;
    let teacher = Uuid::new_v4();
    fx.repos
        .profiles()
        .create(CreateTeacherProfile {
            teacher_id: teacher,
            hourly_rate_ngn: None,
            hourly_rate_usd: None,
            preferred_currency: Currency::Ngn,
            time_zone: "Africa/Lagos".into(),
            subjects: vec!["Mathematics".into()],
            specializations: vec![],
        })
        .await
        .unwrap();
    let windows = AvailabilityService::new(fx.repos.clone())
        .replace_weekly(
            teacher,
            vec![AvailabilityWindow {
                day_of_week: 1,
                start_time: hm(18, 0),
                end_time: hm(19, 0),
            }],
        )
        .await
        .unwrap();
    let request = CreateBookingRequest {
        teacher_id: teacher,
        availability_ids: vec![windows[0].id],
        ..monday_request(&fx)
    };

    let (strict, _) = service(&fx);
    let err = strict.create(request.clone(), &fx.guardian).await.unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));
    assert!(err.to_string().contains("pricing"));

    let (lenient, _) = service_with(
        &fx,
        BookingConfig {
            allow_unpriced_bookings: true,
            ..BookingConfig::default()
        },
    );
    let bookings = lenient.create(request, &fx.guardian).await.unwrap();
    assert_eq!(bookings[0].rate.hourly_rate_ngn, 0.0);
    assert_eq!(bookings[0].rate.hourly_rate_usd, 0.0);
}

#[tokio::test]
async fn locked_rate_survives_profile_change() {
    let fx = setup().await;
    let (service, _) = service(&fx);

    let before = service.create(monday_request(&fx), &fx.guardian).await.unwrap();

    fx.repos
        .profiles()
        .update(
            fx.teacher.id,
            UpdateTeacherProfile {
                hourly_rate_ngn: Some(Some(8000.0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stored = service.get(before[0].id).await.unwrap();
    assert_eq!(stored.rate.hourly_rate_ngn, 5000.0);
    assert_eq!(stored.rate.exchange_rate_used, 1500.0);
    assert_eq!(stored.rate.rate_locked_at, before[0].rate.rate_locked_at);

    let mut request = monday_request(&fx);
    request.dates = vec![next_weekday(1) + Duration::days(7)];
    let after = service.create(request, &fx.guardian).await.unwrap();
    assert_eq!(after[0].rate.hourly_rate_ngn, 8000.0);
}

// -----------------------------------------------------------------------
// Approve / reject
// -----------------------------------------------------------------------

#[tokio::test]
async fn approve_creates_exactly_one_session() {
    let fx = setup().await;
    let (service, notifier) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    let approved = service.approve(booking.id, &fx.teacher).await.unwrap();
    assert_eq!(approved.status, BookingStatus::Approved);
    assert!(approved.approved_at.is_some());
    assert_eq!(approved.version, booking.version + 1);

    let session = service.session(booking.id).await.unwrap().unwrap();
    assert_eq!(session.status, TeachingSessionStatus::Scheduled);
    assert_eq!(session.session_date, booking.booking_date);
    assert_eq!(session.teacher_id, fx.teacher.id);

    let err = service.approve(booking.id, &fx.teacher).await.unwrap_err();
    assert!(matches!(err, TutorError::Conflict { .. }));
    assert_eq!(session_rows(&fx, booking.id).await, 1);

    assert_eq!(
        notifier.kinds(),
        vec!["booking_requested", "booking_approved"]
    );
}

#[tokio::test]
async fn approving_a_non_pending_booking_leaves_it_unchanged() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    let rejected = service
        .reject(booking.id, &fx.teacher, Some("Fully booked that week".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, BookingStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("Fully booked that week")
    );
    assert!(rejected.rejected_at.is_some());

    let err = service.approve(booking.id, &fx.teacher).await.unwrap_err();
    assert!(err.to_string().contains("cannot be approved in current status"));

    let stored = service.get(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Rejected);
    assert_eq!(stored.version, rejected.version);
    assert_eq!(session_rows(&fx, booking.id).await, 0);
}

#[tokio::test]
async fn only_the_teacher_decides() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    let err = service.approve(booking.id, &fx.student).await.unwrap_err();
    assert!(matches!(err, TutorError::Forbidden { .. }));
    let err = service.reject(booking.id, &fx.guardian, None).await.unwrap_err();
    assert!(matches!(err, TutorError::Forbidden { .. }));

    assert_eq!(
        service.get(booking.id).await.unwrap().status,
        BookingStatus::Pending
    );
}

#[tokio::test]
async fn stale_version_is_not_applied() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let stale = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    service.approve(stale.id, &fx.teacher).await.unwrap();

    let outcome = fx
        .repos
        .bookings()
        .transition(
            &stale,
            BookingTransition {
                status: BookingStatus::Rejected,
                actor_id: fx.teacher.id,
                reason: None,
                session: SessionEffect::None,
                history: CreateBookingHistory::new(stale.id, HistoryAction::Rejected, &fx.teacher),
            },
        )
        .await
        .unwrap();
    assert!(outcome.is_none());

    assert_eq!(
        service.get(stale.id).await.unwrap().status,
        BookingStatus::Approved
    );
    // created + approved only.
    assert_eq!(service.history(stale.id).await.unwrap().len(), 2);
}

// -----------------------------------------------------------------------
// Reschedule
// -----------------------------------------------------------------------

#[tokio::test]
async fn invalid_reschedule_changes_nothing() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();
    let approved = service.approve(booking.id, &fx.teacher).await.unwrap();

    let today = Utc::now().date_naive();
    let past = RescheduleRequest {
        date: today,
        start_time: hm(10, 0),
        end_time: hm(11, 0),
        reason: None,
    };
    let err = service
        .reschedule(booking.id, &fx.teacher, past)
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));

    let inverted = RescheduleRequest {
        date: today + Duration::days(10),
        start_time: hm(11, 0),
        end_time: hm(11, 0),
        reason: None,
    };
    let err = service
        .reschedule(booking.id, &fx.teacher, inverted)
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));

    let stored = service.get(booking.id).await.unwrap();
    assert_eq!(stored.booking_date, approved.booking_date);
    assert_eq!(stored.version, approved.version);
    assert_eq!(service.history(booking.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn reschedule_within_one_minute_is_rejected() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    let err = service
        .reschedule(
            booking.id,
            &fx.teacher,
            RescheduleRequest {
                date: next_weekday(3),
                start_time: NaiveTime::from_hms_opt(10, 0, 10).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 50).unwrap(),
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));

    let stored = service.get(booking.id).await.unwrap();
    assert_eq!(stored.start_time, hm(18, 0));
    assert_eq!(stored.duration_minutes, 60);
    assert_eq!(stored.version, booking.version);
}

#[tokio::test]
async fn reschedule_moves_booking_and_session() {
    let fx = setup().await;
    let (service, notifier) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();
    service.approve(booking.id, &fx.teacher).await.unwrap();

    let new_date = next_weekday(3) + Duration::days(7);
    let moved = service
        .reschedule(
            booking.id,
            &fx.teacher,
            RescheduleRequest {
                date: new_date,
                start_time: hm(10, 0),
                end_time: hm(11, 30),
                reason: Some("Teacher travelling".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.status, BookingStatus::Approved);
    assert_eq!(moved.booking_date, new_date);
    assert_eq!(moved.duration_minutes, 90);
    assert_eq!(moved.rate, booking.rate);

    let session = service.session(booking.id).await.unwrap().unwrap();
    assert_eq!(session.session_date, new_date);
    assert_eq!(session.start_time, hm(10, 0));
    assert_eq!(session.end_time, hm(11, 30));

    let history = service.history(booking.id).await.unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.action, HistoryAction::Rescheduled);
    assert_eq!(last.notes.as_deref(), Some("Teacher travelling"));
    let previous = last.previous_data.as_ref().unwrap();
    assert_eq!(previous["start_time"], "18:00");
    let new = last.new_data.as_ref().unwrap();
    assert_eq!(new["booking_date"], new_date.format("%Y-%m-%d").to_string());

    assert_eq!(notifier.kinds().last(), Some(&"booking_rescheduled"));
}

#[tokio::test]
async fn terminal_booking_cannot_be_rescheduled() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();
    service.reject(booking.id, &fx.teacher, None).await.unwrap();

    let err = service
        .reschedule(
            booking.id,
            &fx.teacher,
            RescheduleRequest {
                date: next_weekday(3) + Duration::days(7),
                start_time: hm(10, 0),
                end_time: hm(11, 0),
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::Conflict { .. }));
}

// -----------------------------------------------------------------------
// Cancel / confirm / complete
// -----------------------------------------------------------------------

#[tokio::test]
async fn cancelling_pending_records_who_and_when() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    let cancelled = service
        .cancel(booking.id, &fx.student, Some("Exam moved".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by_id, Some(fx.student.id));
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Exam moved"));

    let history = service.history(booking.id).await.unwrap();
    assert_eq!(history.last().unwrap().action, HistoryAction::Cancelled);
}

#[tokio::test]
async fn cancelling_approved_cascades_to_session() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();
    service.approve(booking.id, &fx.teacher).await.unwrap();

    let cancelled = service.cancel(booking.id, &fx.teacher, None).await.unwrap();
    assert_eq!(cancelled.cancelled_by_id, Some(fx.teacher.id));

    let session = service.session(booking.id).await.unwrap().unwrap();
    assert_eq!(session.status, TeachingSessionStatus::Cancelled);
}

#[tokio::test]
async fn completed_booking_cannot_be_cancelled() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();
    service.approve(booking.id, &fx.teacher).await.unwrap();
    let completed = service.complete(booking.id, &fx.teacher).await.unwrap();

    let err = service.cancel(booking.id, &fx.student, None).await.unwrap_err();
    assert!(matches!(err, TutorError::Conflict { .. }));

    let stored = service.get(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Completed);
    assert_eq!(stored.version, completed.version);
    assert!(stored.cancelled_at.is_none());
}

#[tokio::test]
async fn strangers_cannot_cancel() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    let err = service
        .cancel(booking.id, &Actor::new(Uuid::new_v4()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::Forbidden { .. }));
}

#[tokio::test]
async fn full_lifecycle_leaves_an_audit_trail() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    service.approve(booking.id, &fx.teacher).await.unwrap();

    let err = service.confirm(booking.id, &fx.teacher).await.unwrap_err();
    assert!(matches!(err, TutorError::Forbidden { .. }));
    let confirmed = service.confirm(booking.id, &fx.guardian).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let completed = service.complete(booking.id, &fx.teacher).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert!(completed.completed_at.is_some());

    let session = service.session(booking.id).await.unwrap().unwrap();
    assert_eq!(session.status, TeachingSessionStatus::Completed);

    let actions: Vec<HistoryAction> = service
        .history(booking.id)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            HistoryAction::Created,
            HistoryAction::Approved,
            HistoryAction::Confirmed,
            HistoryAction::Completed,
        ]
    );
}

#[tokio::test]
async fn pending_booking_cannot_be_completed() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();

    let err = service.complete(booking.id, &fx.teacher).await.unwrap_err();
    assert!(matches!(err, TutorError::Conflict { .. }));
}

// -----------------------------------------------------------------------
// Sessions, lists and notifications
// -----------------------------------------------------------------------

#[tokio::test]
async fn session_details_are_split_by_role() {
    let fx = setup().await;
    let (service, _) = service(&fx);
    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();
    service.approve(booking.id, &fx.teacher).await.unwrap();

    let session = service
        .update_session(
            booking.id,
            &fx.teacher,
            UpdateTeachingSession {
                meeting_link: Some("https://meet.example.com/abc".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        session.meeting_link.as_deref(),
        Some("https://meet.example.com/abc")
    );

    let err = service
        .update_session(
            booking.id,
            &fx.teacher,
            UpdateTeachingSession {
                student_rating: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::Forbidden { .. }));

    let err = service
        .update_session(
            booking.id,
            &fx.student,
            UpdateTeachingSession {
                student_rating: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::Validation { .. }));

    let rated = service
        .update_session(
            booking.id,
            &fx.student,
            UpdateTeachingSession {
                student_rating: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rated.student_rating, Some(4));
}

#[tokio::test]
async fn lists_filter_by_status() {
    let fx = setup().await;
    let (service, _) = service(&fx);

    let mut request = monday_request(&fx);
    request.dates = vec![next_weekday(1), next_weekday(1) + Duration::days(7)];
    let bookings = service.create(request, &fx.guardian).await.unwrap();
    service.approve(bookings[0].id, &fx.teacher).await.unwrap();

    let all = service
        .list_for_student(fx.student.id, BookingFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.items[0].booking_date, next_weekday(1));

    let pending = service
        .list_for_teacher(
            fx.teacher.id,
            BookingFilter {
                status: Some(BookingStatus::Pending),
                from_date: None,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 1);
    assert_eq!(pending.items[0].id, bookings[1].id);

    let paged = service
        .list_for_teacher(
            fx.teacher.id,
            BookingFilter::default(),
            Pagination {
                offset: 1,
                limit: 1,
            },
        )
        .await
        .unwrap();
    assert_eq!(paged.total, 2);
    assert_eq!(paged.items.len(), 1);
    assert_eq!(paged.items[0].id, bookings[1].id);
}

#[tokio::test]
async fn notification_failures_do_not_fail_the_operation() {
    let fx = setup().await;
    let service = BookingService::new(
        fx.repos.clone(),
        FixedExchangeRate::new(1500.0),
        FailingNotifier,
        BookingConfig::default(),
    );

    let booking = service.create(monday_request(&fx), &fx.guardian).await.unwrap()[0].clone();
    let approved = service.approve(booking.id, &fx.teacher).await.unwrap();
    assert_eq!(approved.status, BookingStatus::Approved);
}
