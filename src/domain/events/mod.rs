//! Domain events
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Pricing(PricingEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// Messaging subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Pricing(PricingEvent::Degraded { .. }) => "storefront.pricing.degraded",
            Self::Order(OrderEvent::Placed { .. }) => "storefront.orders.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.orders.status_changed",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PricingEvent {
    /// The delegated calculator was bypassed and the local rule priced the cart.
    Degraded { reason: String, fallback_total: Money, at: DateTime<Utc> },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OrderEvent {
    Placed { order_id: Uuid, total_amount: Money },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_payload_and_subject() {
        let event = DomainEvent::Order(OrderEvent::Placed { order_id: Uuid::nil(), total_amount: Money::new(dec!(1080)) });
        assert_eq!(event.subject(), "storefront.orders.placed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "order");
        assert_eq!(json["placed"]["totalAmount"].as_f64(), Some(1080.0));
    }

    #[test]
    fn test_degraded_event_payload() {
        let event = DomainEvent::Pricing(PricingEvent::Degraded { reason: "calculator timed out".into(), fallback_total: Money::new(dec!(1080)), at: Utc::now() });
        assert_eq!(event.subject(), "storefront.pricing.degraded");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "pricing");
        assert_eq!(json["degraded"]["fallbackTotal"].as_f64(), Some(1080.0));
        assert_eq!(json["degraded"]["reason"], "calculator timed out");
    }
}
