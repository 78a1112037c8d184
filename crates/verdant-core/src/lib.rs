//! Types shared by every Verdant bounded context: profiles and corporate
//! accounts, the sustainability core values, purchase records, the domain
//! error, and the injected clock and randomness.
//!
//! Nothing here touches the database or the network.

pub mod clock;
pub mod command;
pub mod core_value;
pub mod error;
pub mod profile;
pub mod purchase;
pub mod rng;
