//! Outbound delivery of reports and error notices.

pub mod sink;

pub use sink::{Delivery, DeliveryFuture, LogDelivery, WebhookDelivery, build_delivery, destination};
