//! Use cases built on the ports.

pub mod chat_session;
pub mod controller;
pub mod model_catalog;
pub mod telemetry;
