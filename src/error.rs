use flexi_logger::FlexiLoggerError;
use std::io;
use thiserror::Error;

use crate::activities::RegistryError;

#[derive(Error, Debug)]
pub enum MergingtonError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error), // Converts io::Error into MergingtonError automatically

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Logger error: {0}")]
    LoggerError(#[from] FlexiLoggerError),

    #[error("{0}")]
    RegistryError(#[from] RegistryError),

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}
