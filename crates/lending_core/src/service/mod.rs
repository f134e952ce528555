//! Ledger use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Emit structured `event=... module=... status=...` log lines per use case.
//! - Keep CLI callers decoupled from storage details.

pub mod catalog_service;
pub mod lending_service;
