#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid heatmap grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid surface size: {width}x{height}")]
    InvalidSurface { width: f64, height: f64 },

    #[error("Raster encoding failed: {0}")]
    Encoding(String),
}
