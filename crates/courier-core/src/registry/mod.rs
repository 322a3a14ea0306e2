//! Connection registry: one push channel per client, one-shot delivery.

mod connections;
mod handoff;

pub use connections::{Connection, ConnectionRegistry, DeliveryOutcome};
pub use handoff::Handoff;
