//! Data models for invoices, batch progress and configuration.

pub mod config;
pub mod invoice;
pub mod processing;
