pub type BendayResult<T> = Result<T, BendayError>;

#[derive(thiserror::Error, Debug)]
pub enum BendayError {
    #[error("missing source: {0}")]
    MissingSource(String),

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("allocation error: {0}")]
    Allocation(String),

    #[error("engine disposed: {0}")]
    Disposed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BendayError {
    pub fn missing_source(msg: impl Into<String>) -> Self {
        Self::MissingSource(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    pub fn disposed(msg: impl Into<String>) -> Self {
        Self::Disposed(msg.into())
    }
}
