//! Data models for parkspot API payloads.
//!
//! - `TokenPair`, `Envelope`: authentication responses
//! - `User`, `RegisterRequest`: account registration
//! - `Spot`, `Booking`: parking and EV-charging inventory

pub mod spot;
pub mod token;
pub mod user;

pub use spot::{Booking, BookingStatus, Spot, SpotKind};
pub use token::{Envelope, TokenPair};
pub use user::{RegisterRequest, User};
