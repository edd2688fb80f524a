//! Shared test harness modules for the geozip CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;
use crate::ingest::*;

mod helpers;
mod unit;
