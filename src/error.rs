//! Error taxonomy for the reflow engine.
//!
//! `verify` never fails; it only reports. `reflow` has exactly one
//! documented failure mode (`NotFixable`). `WatchdogExceeded` is a
//! defensive guard around the cursor-advance loops in `reflow`'s calendar
//! walk and should never trigger on well-formed input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("schedule is not fixable: {0}")]
    NotFixable(String),

    #[error("time-cursor watchdog exceeded {0} iterations")]
    WatchdogExceeded(u32),
}
