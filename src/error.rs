// A tiny error type so we don't rely on anyhow/thiserror.
// Every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SourceMissing(String), // The source image is absent or could not be opened
    SourceDecode(String),  // The source image is unreadable or has no pixels
    ConfigRead(String),    // Reading the zone config file failed
    ConfigParse(String),   // The zone config file is not valid TOML
    WorkerSpawn(String),   // The pixel worker thread could not start
    WindowInit(String),    // Creating the demo window failed
    WindowUpdate(String),  // Updating the demo window buffer failed
}

impl Error {
    /// True for the failures that leave a zone permanently disabled.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::SourceMissing(_) | Error::SourceDecode(_))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SourceMissing(s) => write!(f, "Source missing: {s}"),
            Error::SourceDecode(s) => write!(f, "Source unreadable: {s}"),
            Error::ConfigRead(s) => write!(f, "Config read error: {s}"),
            Error::ConfigParse(s) => write!(f, "Config parse error: {s}"),
            Error::WorkerSpawn(s) => write!(f, "Worker spawn error: {s}"),
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
        }
    }
}

impl std::error::Error for Error {}
