// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A descriptor field that is present but semantically invalid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid app {app:?}, field {field}: {reason}")]
pub struct ValidationError {
    pub app: String,
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(app: impl Into<String>, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("malformed config {source_name}: {reason}")]
    MalformedConfig { source_name: String, reason: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to read {}: {source}", path.display())]
    ReadConfig { path: PathBuf, source: io::Error },
    #[error("failed to spawn {app}: {source}")]
    Spawn { app: String, source: io::Error },
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("nix error: {0}")]
    NixError(#[from] nix::Error),
    #[error("an error occured: {0}")]
    ErrorMsg(String),
    #[error("an error occured: {0}")]
    ErrorStr(&'static str),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self(kind)
    }

    pub(crate) fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::MalformedConfig {
            source_name: source_name.to_string(),
            reason: reason.into(),
        })
    }

    pub(crate) fn read_config(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::from_kind(ErrorKind::ReadConfig {
            path: path.into(),
            source,
        })
    }

    pub(crate) fn spawn(app: &str, source: io::Error) -> Self {
        Self::from_kind(ErrorKind::Spawn {
            app: app.to_string(),
            source,
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.0, ErrorKind::MalformedConfig { .. })
    }

    /// The validation failure, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self.0 {
            ErrorKind::Validation(ref err) => Some(err),
            _ => None,
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<ErrorKind>,
{
    fn from(err: E) -> Self {
        Self::from_kind(err.into())
    }
}

impl From<&'static str> for Error {
    fn from(err: &'static str) -> Self {
        Self::from_kind(ErrorKind::ErrorStr(err))
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::from_kind(ErrorKind::ErrorMsg(err))
    }
}
