//! Outbound notification hook.
//!
//! The reservation manager publishes [`DomainEvent`]s through an injected
//! [`Notifier`] once a transaction has committed. Delivery is best effort:
//! failures are logged and never reach the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::points::{PointBalance, PointType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    ReservationConfirmed {
        reservation_id: Uuid,
    },
    ReservationCancelled {
        reservation_id: Uuid,
        refunded_point_type: Option<PointType>,
    },
    PointsUpdated {
        balance: PointBalance,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ReservationConfirmed { .. } => "reservation_confirmed",
            DomainEvent::ReservationCancelled { .. } => "reservation_cancelled",
            DomainEvent::PointsUpdated { .. } => "points_updated",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: i64, event: DomainEvent) -> eyre::Result<()>;
}

/// Writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: i64, event: DomainEvent) -> eyre::Result<()> {
        tracing::info!(user_id, event = event.name(), payload = ?event, "Notification");
        Ok(())
    }
}

/// Delivers `events` in order, logging and swallowing individual failures.
/// Returns how many were delivered.
pub async fn deliver(notifier: &dyn Notifier, user_id: i64, events: Vec<DomainEvent>) -> usize {
    let mut delivered = 0;
    for event in events {
        let name = event.name();
        match notifier.notify(user_id, event).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(user_id, event = name, error = %e, "Notification failed"),
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn failed_notification_does_not_stop_delivery() {
        let reservation_id = Uuid::new_v4();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(
                eq(7),
                eq(DomainEvent::ReservationConfirmed { reservation_id }),
            )
            .times(1)
            .returning(|_, _| Err(eyre::eyre!("mail server down")));
        notifier
            .expect_notify()
            .with(
                eq(7),
                eq(DomainEvent::PointsUpdated {
                    balance: PointBalance::new(2, 1),
                }),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let delivered = deliver(
            &notifier,
            7,
            vec![
                DomainEvent::ReservationConfirmed { reservation_id },
                DomainEvent::PointsUpdated {
                    balance: PointBalance::new(2, 1),
                },
            ],
        )
        .await;

        assert_eq!(delivered, 1);
    }

    #[test]
    fn event_names_match_serialized_tag() {
        let event = DomainEvent::ReservationCancelled {
            reservation_id: Uuid::nil(),
            refunded_point_type: Some(PointType::Team),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["refunded_point_type"], "team");
    }
}
