use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("data shape {data:?} does not match header shape {header:?}")]
    ShapeMismatch {
        data: (usize, usize),
        header: (usize, usize),
    },
    #[error("image data must have at least one pixel along each axis")]
    EmptyData,
    #[error("invalid pixel scale ({0}, {1}) arcsec/pixel")]
    InvalidScale(f64, f64),
    #[error("invalid observation time: {0}")]
    InvalidTime(String),
    #[error("invalid header keyword: {0:?}")]
    InvalidKeyword(String),
    #[error("invalid header card: {0}")]
    InvalidCard(String),
    #[error("missing header keyword: {0}")]
    MissingKeyword(String),
    #[error("header keyword {keyword} is not of type {expected}")]
    KeywordType {
        keyword: String,
        expected: &'static str,
    },
    #[error("unsupported projection: {0} / {1}")]
    UnsupportedProjection(String, String),
    #[error("render error: {0}")]
    Render(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
