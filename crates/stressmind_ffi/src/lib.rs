//! Flutter bridge crate for the StressMind core.

pub mod api;
