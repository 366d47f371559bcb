//! Error types shared by the projector and its output files.
//!
//! Every failure here is fatal to the image being projected but never to
//! the host program: the session closes (and where needed deletes) its
//! outputs and hands the error back to the caller.

use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Failures while creating, validating or writing a Targa file.
#[derive(Error, Debug)]
pub enum TargaError {
    /// Underlying I/O failure – propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("can't open {}", path.display())]
    CantOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Not an uncompressed, 24-bit, upper-left origin true-colour file.
    #[error("{}: can't handle this type of file", path.display())]
    WrongType { path: PathBuf },

    /// Overlay target does not match the frame dimensions.
    #[error("{}: image wrong size", path.display())]
    WrongSize { path: PathBuf },

    #[error("{}: ran out of disk space", path.display())]
    OutOfDisk { path: PathBuf },
}

/// Failures while writing a ray-trace scene file.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("can't open {}", path.display())]
    CantOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: ran out of disk space", path.display())]
    OutOfDisk { path: PathBuf },
}

/// Everything a projection session can report.
#[derive(Error, Debug)]
pub enum Line3dError {
    #[error(transparent)]
    Targa(#[from] TargaError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    /// A per-image buffer could not be reserved.
    #[error("insufficient memory for {what}")]
    Allocation { what: &'static str },

    #[error("frame width {width} exceeds the {max}-pixel limit")]
    TooWide { width: usize, max: usize },

    #[error("invalid 3D parameters: {0}")]
    Config(String),

    /// The canvas reported a key press between rows.
    #[error("3D projection cancelled")]
    Cancelled,

    /// A row arrived after the session finished or aborted.
    #[error("projection session already closed")]
    Closed,
}

impl SceneError {
    /// Classify a write failure, singling out a full disk.
    pub fn from_write(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::StorageFull {
            SceneError::OutOfDisk {
                path: path.to_path_buf(),
            }
        } else {
            SceneError::Io(err)
        }
    }
}

impl TargaError {
    /// Classify a write failure, singling out a full disk.
    pub fn from_write(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::StorageFull {
            TargaError::OutOfDisk {
                path: path.to_path_buf(),
            }
        } else {
            TargaError::Io(err)
        }
    }
}
