use thiserror::Error;

use crate::types::Point;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Degenerate geometry: lines through {first:?} and {second:?} are parallel")]
    DegenerateGeometry {
        first: [Point; 2],
        second: [Point; 2],
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
