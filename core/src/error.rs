use thiserror::Error;

/// Failures while acquiring or decoding boundary data.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to fetch boundary data: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed boundary data: {0}")]
    Parse(String),
}

/// Failures while loading or saving a region document.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("region document must be a JSON object")]
    InvalidDocument,
    #[error("Region {region} {reason}")]
    Validation { region: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn validation(region: &str, reason: &str) -> Self {
        Self::Validation {
            region: region.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

/// Failures while producing a map image.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid output dimensions: {0}")]
    InvalidDimensions(String),
    #[error("map has no drawable territories")]
    EmptyMap,
    #[error("failed to rasterize map: {0}")]
    Raster(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
