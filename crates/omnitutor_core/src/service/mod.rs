//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate scheduler and repository calls into use-case level APIs.
//! - Keep UI layers decoupled from storage details.

pub mod level_service;
pub mod review_service;
