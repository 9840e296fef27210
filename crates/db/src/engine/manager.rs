//! ReservationManager: create and cancel orchestration.
//!
//! Each request runs in one bounded transaction. The booked slot is read with
//! a row lock, so of two concurrent requests for the same slot the second one
//! observes it as taken and fails with `SlotUnavailable`. Both operations also
//! hold the coach/day schedule lock shared, which keeps slot generation out
//! until they commit. Notifications are handed off only after commit.

use std::sync::Arc;

use chrono::Utc;
use coachslot_core::{
    errors::{BookingError, BookingResult},
    models::{
        points::PointBalance,
        reservation::{
            Actor, BulkReservationReport, BulkReservationRequest, CancellationReceipt,
            CreateReservationRequest, Reservation, ReservationReceipt, RequestState,
            SkippedBooking, ValidatedBooking,
        },
        time_slot::TimeSlot,
    },
    notify::{deliver, DomainEvent, Notifier},
    overlap::{Interval, ReleaseScope},
    policy::CancellationPolicy,
};
use uuid::Uuid;

use crate::{
    engine::{
        ledger,
        overlap::{free_overlapping, lock_schedule, mark_overlapping},
        EngineContext,
    },
    repositories::{reservation, time_slot},
    transaction::{commit, is_unique_violation, storage_error},
};

#[derive(Clone)]
pub struct ReservationManager {
    ctx: EngineContext,
    policy: CancellationPolicy,
    notifier: Arc<dyn Notifier>,
}

impl ReservationManager {
    pub fn new(ctx: EngineContext, policy: CancellationPolicy, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ctx,
            policy,
            notifier,
        }
    }

    pub fn policy(&self) -> &CancellationPolicy {
        &self.policy
    }

    pub async fn create(
        &self,
        request: &CreateReservationRequest,
        actor: Actor,
    ) -> BookingResult<ReservationReceipt> {
        log_state(RequestState::Requested, "create", None);
        let result = self.try_create(request, actor).await;
        match &result {
            Ok(receipt) => log_state(RequestState::Committed, "create", Some(receipt.reservation_id)),
            Err(err) => log_failure("create", None, err),
        }
        result
    }

    async fn try_create(
        &self,
        request: &CreateReservationRequest,
        actor: Actor,
    ) -> BookingResult<ReservationReceipt> {
        let booking = request.validate(self.ctx.now())?;
        authorize_booking(actor, &booking)?;
        log_state(RequestState::Validated, "create", None);

        let mut tx = self.ctx.begin().await?;
        lock_schedule(&mut tx, booking.coach_id, booking.date, false).await?;

        let slot = time_slot::find_by_key(
            &mut *tx,
            booking.coach_id,
            booking.date,
            booking.time,
            booking.session_type,
            true,
        )
        .await
        .map_err(storage_error)?
        .ok_or_else(|| {
            BookingError::NotFound(format!(
                "No {} slot for coach {} on {} at {}",
                booking.session_type, booking.coach_id, booking.date, booking.time
            ))
        })?;
        let slot = TimeSlot::try_from(slot)?;

        if !slot.status.is_bookable() {
            return Err(BookingError::SlotUnavailable(format!(
                "Slot on {} at {} is {}",
                slot.date, slot.start_time, slot.status
            )));
        }

        let balance = match (booking.booker.user_id(), booking.cost()) {
            (Some(user_id), Some((point_type, amount))) => {
                Some(ledger::debit(&mut tx, user_id, point_type, amount).await?)
            }
            (Some(user_id), None) => Some(ledger::balance_for_update(&mut tx, user_id).await?),
            (None, _) => None,
        };

        let row = reservation::create_reservation(&mut *tx, &booking)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    BookingError::SlotUnavailable(format!(
                        "Slot on {} at {} was booked concurrently",
                        booking.date, booking.time
                    ))
                } else {
                    storage_error(err)
                }
            })?;
        let created = Reservation::try_from(row)?;

        let slots_blocked =
            mark_overlapping(&mut tx, slot.coach_id, slot.date, slot.interval(), created.id).await?;
        commit(tx).await?;

        tracing::info!(
            reservation_id = %created.id,
            coach_id = created.coach_id,
            date = %created.date,
            time = %created.time,
            session_type = %created.session_type,
            slots_blocked,
            "Reservation confirmed"
        );

        if let Some(user_id) = created.user_id {
            let mut events = vec![DomainEvent::ReservationConfirmed {
                reservation_id: created.id,
            }];
            if let (Some(balance), Some(_)) = (balance, booking.cost()) {
                events.push(DomainEvent::PointsUpdated { balance });
            }
            self.publish(user_id, events);
        }

        let receipt = ReservationReceipt {
            reservation_id: created.id,
            coach_id: created.coach_id,
            date: created.date,
            time: created.time,
            session_type: created.session_type,
            slots_blocked,
            remaining_points: None,
            remaining_solo_points: None,
            remaining_team_points: None,
        };
        Ok(receipt.with_balance(balance))
    }

    pub async fn cancel(
        &self,
        reservation_id: Uuid,
        actor: Actor,
    ) -> BookingResult<CancellationReceipt> {
        log_state(RequestState::Requested, "cancel", Some(reservation_id));
        let result = self.try_cancel(reservation_id, actor).await;
        match &result {
            Ok(_) => log_state(RequestState::Committed, "cancel", Some(reservation_id)),
            Err(err) => log_failure("cancel", Some(reservation_id), err),
        }
        result
    }

    async fn try_cancel(
        &self,
        reservation_id: Uuid,
        actor: Actor,
    ) -> BookingResult<CancellationReceipt> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin().await?;

        let row = reservation::get_reservation_by_id(&mut *tx, reservation_id, true)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| reservation_not_found(reservation_id))?;
        let current = Reservation::try_from(row)?;

        authorize_access(actor, &current)?;
        if !current.is_active() {
            return Err(BookingError::AlreadyCancelled(reservation_id));
        }
        self.policy
            .can_cancel(actor.role, current.starts_at(), now)
            .into_result()?;
        log_state(RequestState::Validated, "cancel", Some(reservation_id));
        lock_schedule(&mut tx, current.coach_id, current.date, false).await?;

        let interval = match time_slot::find_by_key(
            &mut *tx,
            current.coach_id,
            current.date,
            current.time,
            current.session_type,
            false,
        )
        .await
        .map_err(storage_error)?
        {
            Some(slot) => TimeSlot::try_from(slot)?.interval(),
            None => Interval::for_session(current.time, current.session_type)?,
        };

        let scope = ReleaseScope {
            now,
            include_past: actor.role.is_admin(),
        };
        let slots_freed = free_overlapping(
            &mut tx,
            current.coach_id,
            current.date,
            interval,
            current.id,
            scope,
        )
        .await?;

        let refund = self
            .policy
            .refund_for(current.session_type, current.reservation_type);
        let balance: Option<PointBalance> = match (current.user_id, refund) {
            (Some(user_id), Some(refund)) => {
                Some(ledger::credit(&mut tx, user_id, refund.point_type, refund.amount).await?)
            }
            (Some(user_id), None) => Some(ledger::balance_for_update(&mut tx, user_id).await?),
            (None, _) => None,
        };

        reservation::cancel_reservation(&mut *tx, current.id, Utc::now(), actor.role)
            .await
            .map_err(storage_error)?
            .ok_or(BookingError::AlreadyCancelled(reservation_id))?;
        commit(tx).await?;

        let refunded_point_type = current.user_id.and(refund.map(|r| r.point_type));
        tracing::info!(
            %reservation_id,
            cancelled_by = %actor.role,
            slots_freed,
            refunded = refunded_point_type.is_some(),
            "Reservation cancelled"
        );

        if let Some(user_id) = current.user_id {
            let mut events = vec![DomainEvent::ReservationCancelled {
                reservation_id,
                refunded_point_type,
            }];
            if let (Some(balance), Some(_)) = (balance, refunded_point_type) {
                events.push(DomainEvent::PointsUpdated { balance });
            }
            self.publish(user_id, events);
        }

        Ok(CancellationReceipt {
            reservation_id,
            refunded: refunded_point_type.is_some(),
            refunded_point_type,
            slots_freed,
            balance,
        })
    }

    pub async fn get(&self, reservation_id: Uuid, actor: Actor) -> BookingResult<Reservation> {
        let row = reservation::get_reservation_by_id(&self.ctx.pool, reservation_id, false)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| reservation_not_found(reservation_id))?;
        let found = Reservation::try_from(row)?;
        authorize_access(actor, &found)?;
        Ok(found)
    }

    /// Books the items one by one, each in its own transaction. Stops at the
    /// first item the client cannot pay for and reports the rest as skipped.
    pub async fn create_bulk(
        &self,
        request: &BulkReservationRequest,
        actor: Actor,
    ) -> BookingResult<BulkReservationReport> {
        if !actor.role.is_admin() {
            return Err(BookingError::Authorization(
                "Bulk reservations are reserved to administrators".to_string(),
            ));
        }
        if request.items.is_empty() {
            return Err(BookingError::Validation("No reservations to create".to_string()));
        }

        let mut report = BulkReservationReport::default();
        let mut requests = request.requests();

        while let Some(item) = requests.next() {
            match self.create(&item, actor).await {
                Ok(receipt) => report.created.push(receipt),
                Err(err @ BookingError::InsufficientPoints { .. }) => {
                    report.skipped.push(skipped(&item, &err));
                    for rest in requests.by_ref() {
                        report.skipped.push(skipped(&rest, &err));
                    }
                    report.stopped_early = true;
                }
                Err(err) => report.skipped.push(skipped(&item, &err)),
            }
        }

        tracing::info!(
            coach_id = request.coach_id,
            user_id = request.user_id,
            created = report.created.len(),
            skipped = report.skipped.len(),
            stopped_early = report.stopped_early,
            "Bulk reservation finished"
        );
        Ok(report)
    }

    fn publish(&self, user_id: i64, events: Vec<DomainEvent>) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            deliver(notifier.as_ref(), user_id, events).await;
        });
    }
}

/// Clients book for themselves or for a guest; admins for anyone.
fn authorize_booking(actor: Actor, booking: &ValidatedBooking) -> BookingResult<()> {
    match booking.booker.user_id() {
        Some(user_id) if !actor.role.is_admin() && actor.user_id != Some(user_id) => {
            Err(BookingError::Authorization(
                "Clients can only book for themselves".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

fn authorize_access(actor: Actor, reservation: &Reservation) -> BookingResult<()> {
    if actor.role.is_admin() || (actor.user_id.is_some() && actor.user_id == reservation.user_id) {
        Ok(())
    } else {
        Err(BookingError::Authorization(format!(
            "Reservation {} belongs to another user",
            reservation.id
        )))
    }
}

fn reservation_not_found(id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Reservation with ID {} not found", id))
}

fn skipped(item: &CreateReservationRequest, err: &BookingError) -> SkippedBooking {
    SkippedBooking {
        date: item.date,
        time: item.time,
        session_type: item.session_type.clone(),
        code: err.kind(),
        reason: err.to_string(),
    }
}

fn log_state(state: RequestState, operation: &str, reservation_id: Option<Uuid>) {
    tracing::debug!(operation, state = state.as_str(), ?reservation_id, "Reservation request");
}

fn log_failure(operation: &str, reservation_id: Option<Uuid>, err: &BookingError) {
    let state = RequestState::from_error(err);
    match state {
        RequestState::Failed => tracing::error!(
            operation,
            state = state.as_str(),
            ?reservation_id,
            retryable = err.is_retryable(),
            error = %err,
            "Reservation request failed"
        ),
        _ => tracing::warn!(
            operation,
            state = state.as_str(),
            ?reservation_id,
            code = err.kind().as_str(),
            error = %err,
            "Reservation request rejected"
        ),
    }
}
