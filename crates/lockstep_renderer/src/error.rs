use crate::backend::BackendError;
use thiserror::Error;

/// Errors that stop a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("Intersection backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Pixel ({row}, {col}) received {samples} contributions in a pass, expected 1")]
    IncompletePass { row: u32, col: u32, samples: u32 },

    #[error("Image buffer holds {pixels} pixels, expected {cols}x{rows}")]
    BufferSize { rows: u32, cols: u32, pixels: usize },

    #[error("Image output failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;
