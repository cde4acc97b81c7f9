//! Wire models for the relay endpoint

pub mod contact;

pub use contact::{ContactRequest, ContactResponse};
