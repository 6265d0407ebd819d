use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),
    OrderPickedUp(Uuid),

    // Inventory events
    StockReserved {
        ingredient_id: Uuid,
        quantity: Decimal,
    },
    StockRestocked {
        ingredient_id: Uuid,
        quantity: Decimal,
    },
    StockAdjusted {
        ingredient_id: Uuid,
        old_quantity: Decimal,
        new_quantity: Decimal,
    },
    LowStockDetected {
        ingredient_id: Uuid,
        current_quantity: Decimal,
        min_quantity: Decimal,
    },
    DishPrepared {
        dish_id: Uuid,
        quantity: i32,
    },

    // Combo events
    ComboPurchased(Uuid),
    ComboRedeemed {
        combo_set_id: Uuid,
        order_id: Uuid,
    },
    ComboRedemptionCancelled(Uuid),

    // Billing events
    BalanceDeposited {
        user_id: Uuid,
        amount: Decimal,
    },
    PaymentRecorded(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving half.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget variant used on paths where a full channel must not
    /// fail the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "event dropped");
        }
    }
}

/// Background consumer. Today events only feed the log; the channel is the
/// seam where notifications would attach.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStockDetected {
                ingredient_id,
                current_quantity,
                min_quantity,
            } => {
                warn!(
                    ingredient_id = %ingredient_id,
                    current = %current_quantity,
                    min = %min_quantity,
                    "ingredient stock below minimum"
                );
            }
            other => info!(event = ?other, "event processed"),
        }
    }
    info!("event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_full_channel() {
        let (sender, _rx) = EventSender::channel(1);
        // Fill the buffer, then drop the receiver so the next send fails.
        sender.send(Event::OrderCreated(Uuid::new_v4())).await.unwrap();
        drop(_rx);
        sender.send_or_log(Event::OrderCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (sender, mut rx) = EventSender::channel(8);
        let id = Uuid::new_v4();
        sender.send(Event::OrderCreated(id)).await.unwrap();
        match rx.recv().await {
            Some(Event::OrderCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
