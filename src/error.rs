use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid candle interval `{0}`")]
    InvalidInterval(String),

    #[error("invalid extent: {0}")]
    InvalidExtent(String),

    #[error("unknown pane `{0}`")]
    UnknownPane(String),

    #[error("raster backend error: {0}")]
    Backend(String),
}
