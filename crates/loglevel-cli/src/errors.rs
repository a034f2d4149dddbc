//! Error types for the CLI runtime.

use std::sync::Arc;

use thiserror::Error;

use loglevel_core::{DispatchError, InvalidRegistryId, ResolveError};

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("{argument} was not recognised as a PID")]
    InvalidPid { argument: String },
    #[error("{token} is not a logger type; use j, J or 4")]
    InvalidLoggerType { token: String },
    #[error("a logger name pattern must be provided")]
    MissingPattern,
    #[error("a level must be provided")]
    MissingLevel,
    #[error("invalid configuration: {0}")]
    RegistryConfiguration(#[from] InvalidRegistryId),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
