//! Shared test doubles and fixtures for the Verdant platform.

mod clock;
mod failing;
pub mod fixtures;
mod gateway;
mod mailer;
mod rng;
mod store;

pub use clock::FixedClock;
pub use failing::FailingStore;
pub use gateway::RecordingGateway;
pub use mailer::{FailingMailer, RecordingMailer};
pub use rng::SequenceRng;
pub use store::{InMemoryStore, RecordedSale};
