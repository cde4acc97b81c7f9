//! HTTP handlers for the relay service

pub mod contact;
pub mod health;
pub mod metrics;
pub mod routes;
