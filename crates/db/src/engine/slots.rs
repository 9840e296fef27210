//! Slot lifecycle: generation, listing, availability toggling and deletion.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use coachslot_core::{
    errors::{BookingError, BookingResult},
    generator::generate_range,
    models::time_slot::{
        BulkDeleteReport, GenerateSlotsRequest, GenerateSlotsResponse, SlotStatus, SlotView,
        TimeSlot,
    },
    overlap::{blocking_reservation, display_status, ActiveReservation, Interval},
};
use uuid::Uuid;

use crate::{
    engine::{
        overlap::{active_reservations, lock_schedule},
        EngineContext,
    },
    repositories::time_slot,
    transaction::{commit, is_transient, storage_error},
};

#[derive(Clone)]
pub struct SlotService {
    ctx: EngineContext,
}

impl SlotService {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Generates and stores the slots described by `request`. Slots that
    /// already exist are skipped, so the call can be repeated over the same
    /// range. A new slot intersecting a confirmed reservation is stored as
    /// booked by it. Each affected day is locked against concurrent bookings
    /// first, in date order.
    pub async fn generate(
        &self,
        coach_id: i64,
        request: &GenerateSlotsRequest,
    ) -> BookingResult<GenerateSlotsResponse> {
        if coach_id <= 0 {
            return Err(BookingError::Validation("coach_id is required".to_string()));
        }
        let candidates = generate_range(request, self.ctx.now())?;

        let mut tx = self.ctx.begin().await?;
        let dates: BTreeSet<NaiveDate> = candidates.iter().map(|c| c.date).collect();
        for date in &dates {
            lock_schedule(&mut tx, coach_id, *date, true).await?;
        }

        let mut reservations_by_date: HashMap<NaiveDate, Vec<ActiveReservation>> = HashMap::new();
        let mut created = Vec::new();
        let mut existing = 0;

        for candidate in &candidates {
            if !reservations_by_date.contains_key(&candidate.date) {
                let active = active_reservations(&mut tx, coach_id, candidate.date, None).await?;
                reservations_by_date.insert(candidate.date, active);
            }
            let active = reservations_by_date
                .get(&candidate.date)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let interval = Interval::new(candidate.start_time, candidate.end_time)?;
            let holder = blocking_reservation(interval, active);

            match time_slot::insert_if_absent(&mut *tx, coach_id, candidate, holder)
                .await
                .map_err(storage_error)?
            {
                Some(row) => created.push(TimeSlot::try_from(row)?),
                None => existing += 1,
            }
        }
        commit(tx).await?;

        tracing::info!(
            coach_id,
            candidates = candidates.len(),
            created = created.len(),
            existing,
            "Generated slots"
        );
        Ok(GenerateSlotsResponse { created, existing })
    }

    pub async fn list(&self, coach_id: i64, date: NaiveDate) -> BookingResult<Vec<SlotView>> {
        let now = self.ctx.now();
        let listings = time_slot::list_slots_for_day(&self.ctx.pool, coach_id, date)
            .await
            .map_err(storage_error)?;

        listings
            .into_iter()
            .map(|listing| -> BookingResult<SlotView> {
                let holder = listing.holder()?;
                let slot = TimeSlot::try_from(listing.slot)?;
                Ok(SlotView {
                    display_status: display_status(&slot, holder),
                    is_past: slot.is_past(now),
                    slot,
                })
            })
            .collect()
    }

    /// Admin toggle between `available` and `unavailable`. Booked slots
    /// cannot be disabled.
    pub async fn set_availability(&self, slot_id: Uuid, available: bool) -> BookingResult<TimeSlot> {
        let (from, to) = if available {
            (SlotStatus::Unavailable, SlotStatus::Available)
        } else {
            (SlotStatus::Available, SlotStatus::Unavailable)
        };

        let mut tx = self.ctx.begin().await?;
        let updated = time_slot::set_status_if(&mut *tx, slot_id, from, to)
            .await
            .map_err(storage_error)?;

        let slot = match updated {
            Some(row) => TimeSlot::try_from(row)?,
            None => {
                let current = time_slot::get_time_slot_by_id(&mut *tx, slot_id)
                    .await
                    .map_err(storage_error)?
                    .ok_or_else(|| slot_not_found(slot_id))?;
                if current.status == to.as_str() {
                    TimeSlot::try_from(current)?
                } else {
                    return Err(BookingError::Conflict(format!(
                        "Slot {} is {} and cannot become {}",
                        slot_id, current.status, to
                    )));
                }
            }
        };
        commit(tx).await?;

        tracing::info!(%slot_id, status = %slot.status, "Changed slot availability");
        Ok(slot)
    }

    /// Deletes one slot. Only available slots can be deleted.
    pub async fn delete(&self, slot_id: Uuid) -> BookingResult<()> {
        let mut tx = self.ctx.begin().await?;
        let deleted = time_slot::delete_available(&mut *tx, &[slot_id])
            .await
            .map_err(storage_error)?;

        if deleted.is_empty() {
            let current = time_slot::get_time_slot_by_id(&mut *tx, slot_id)
                .await
                .map_err(storage_error)?
                .ok_or_else(|| slot_not_found(slot_id))?;
            return Err(BookingError::Conflict(format!(
                "Slot {} is {} and cannot be deleted",
                slot_id, current.status
            )));
        }
        commit(tx).await?;

        tracing::info!(%slot_id, "Deleted slot");
        Ok(())
    }

    /// Deletes many slots in one transaction. When that transaction cannot
    /// get its locks in time, falls back to deleting row by row and reports
    /// what could not be removed instead of failing as a whole.
    pub async fn delete_many(&self, slot_ids: &[Uuid]) -> BookingResult<BulkDeleteReport> {
        if slot_ids.is_empty() {
            return Ok(BulkDeleteReport::default());
        }

        match self.delete_all_at_once(slot_ids).await {
            Ok(report) => Ok(report),
            Err(err) if is_transient(&err) => {
                tracing::warn!(
                    count = slot_ids.len(),
                    error = %err,
                    "Bulk slot delete timed out, falling back to per-row deletion"
                );
                self.delete_row_by_row(slot_ids).await
            }
            Err(err) => Err(err),
        }
    }

    async fn delete_all_at_once(&self, slot_ids: &[Uuid]) -> BookingResult<BulkDeleteReport> {
        let mut tx = self.ctx.begin().await?;
        let deleted = time_slot::delete_available(&mut *tx, slot_ids)
            .await
            .map_err(storage_error)?;
        let remaining = time_slot::existing_ids(&mut *tx, slot_ids)
            .await
            .map_err(storage_error)?;
        commit(tx).await?;

        let mut report = BulkDeleteReport::default();
        for id in slot_ids {
            if deleted.contains(id) {
                report.deleted.push(*id);
            } else if remaining.contains(id) {
                report.not_deletable.push(*id);
            } else {
                report.missing.push(*id);
            }
        }
        Ok(report)
    }

    async fn delete_row_by_row(&self, slot_ids: &[Uuid]) -> BookingResult<BulkDeleteReport> {
        let mut report = BulkDeleteReport {
            degraded: true,
            ..Default::default()
        };

        for id in slot_ids {
            match self.delete(*id).await {
                Ok(()) => report.deleted.push(*id),
                Err(BookingError::NotFound(_)) => report.missing.push(*id),
                Err(BookingError::Conflict(_)) => report.not_deletable.push(*id),
                Err(err) if is_transient(&err) => report.failed.push(*id),
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Per-row slot deletion finished"
        );
        Ok(report)
    }
}

fn slot_not_found(slot_id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Time slot with ID {} not found", slot_id))
}
