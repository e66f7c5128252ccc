//! # humivent-domain
//!
//! Pure domain model for the humivent ventilation controller.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Humidity physics (absolute humidity from temperature and relative humidity)
//! - Define **Settings** (thresholds, delays, intervals) with validation and
//!   deep-merge of partial updates
//! - Define the **relay mode** overlay (`Auto` / `Hand` / `Aus`)
//! - Define **readings** (local sensor, weather stations)
//! - Define the **regulation state machine** (`Idle` → `PendingOn` → `RelayOn`)
//! - Define **status snapshots** and **events** (the append-only log records)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod event;
pub mod humidity;
pub mod mode;
pub mod reading;
pub mod regulation;
pub mod settings;
pub mod status;
