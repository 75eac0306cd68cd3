// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `tokenwatch` Store
//!
//! Configuration persistence for the `tokenwatch` application.
//!
//! Configuration lives in `~/.tokenwatch/config.yaml`. A missing file is
//! not an error; defaults apply and API keys fall back to the platform's
//! conventional environment variables.

pub mod config;
pub mod error;

pub use config::{mask_key, Config, Settings, WatchConfig};
pub use error::StoreError;
