// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core types, errors, and configuration shared across all crates.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod types;

pub use config::ExtractionConfig;
pub use error::{Result, ScanError};
pub use types::*;
