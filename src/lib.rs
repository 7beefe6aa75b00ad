//! wo-reflow: a constraint-repair engine for manufacturing production
//! schedules.
//!
//! The core (`domain`, `calendar`, `checker`, `sequence`, `reflow`) is
//! synchronous, pure, and has no knowledge of HTTP or JSON. `dto`, `api`,
//! and `demo_data` are external collaborators built on top of it.

pub mod api;
pub mod calendar;
pub mod checker;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod reflow;
pub mod sequence;
