// Copyright 2026 the Tensor VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! File I/O for executables (requires the `std` feature).

use std::fmt;
use std::fs;
use std::path::Path;

use crate::executable::{ExecError, Executable};
use crate::format::{Reader, Writer};

/// A file save/load error.
#[derive(Debug)]
pub enum FileError {
    /// The underlying I/O operation failed.
    Io(std::io::Error),
    /// The file contents were not a valid executable.
    Exec(ExecError),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Exec(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for FileError {}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ExecError> for FileError {
    fn from(e: ExecError) -> Self {
        Self::Exec(e)
    }
}

impl Executable {
    /// Writes the length-prefixed executable image to `path`.
    ///
    /// `format` is advisory and currently unused.
    pub fn save_to_file(&self, path: impl AsRef<Path>, _format: &str) -> Result<(), FileError> {
        let mut w = Writer::new();
        self.save_to_binary(&mut w);
        fs::write(path, w.as_slice())?;
        Ok(())
    }

    /// Reads an executable written by [`Executable::save_to_file`].
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let bytes = fs::read(path)?;
        let mut r = Reader::new(&bytes);
        Ok(Self::load_from_binary(&mut r)?)
    }
}
