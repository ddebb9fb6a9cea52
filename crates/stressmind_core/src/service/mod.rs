//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and analytics calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from key sourcing and slot storage.

pub mod wellbeing_service;

pub use wellbeing_service::{ServiceError, ServiceResult, WellbeingService};
