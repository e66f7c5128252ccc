//! Application services: use-case orchestration over ports.

pub mod mode_service;
pub mod settings_service;
