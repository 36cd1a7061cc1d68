#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod artifact;
pub mod config;
pub mod doctor;
pub mod http;
pub mod liveness;
pub mod openai;
pub mod telegram;
pub mod util;

pub use config::{ConfigKey, EnvFile, Settings};
pub use doctor::{DoctorOptions, FixMode, Report};
