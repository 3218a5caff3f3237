use std::str::FromStr;

use mime::Mime;
use url::Url;

/// Which field a resource carries, used for statistics bucketing and
/// for tagging persisted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Url,
    File,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Url => "url",
            ResourceKind::File => "file",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "file" => ResourceKind::File,
            _ => ResourceKind::Url,
        }
    }
}

/// Raw creation input as submitted by a caller. Carries at most one of
/// `url` and `file`; [`ResourceInput::validate`] turns it into a payload
/// or rejects it.
#[derive(Debug, Clone, Default)]
pub struct ResourceInput {
    pub url: Option<String>,
    pub file: Option<Vec<u8>>,
}

/// A validated resource payload. Exactly one variant is ever stored per
/// secret; files carry the content type sniffed at creation time.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePayload {
    Url(String),
    File { bytes: Vec<u8>, content_type: Mime },
}

impl ResourcePayload {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourcePayload::Url(_) => ResourceKind::Url,
            ResourcePayload::File { .. } => ResourceKind::File,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource has to contain exactly one of url or file")]
    InvalidResource,
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
}

impl ResourceInput {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            file: None,
        }
    }

    pub fn file(bytes: Vec<u8>) -> Self {
        Self {
            url: None,
            file: Some(bytes),
        }
    }

    /// Validate the input shape and produce a storable payload.
    ///
    /// URL inputs must parse as absolute URLs; the submitted string is
    /// stored verbatim so accesses return it unchanged. File inputs have
    /// their content type sniffed from the leading bytes, and the
    /// canonical extension for that type must be on the allow-list.
    pub fn validate(self, allowed_file_types: &[String]) -> Result<ResourcePayload, ResourceError> {
        match (self.url, self.file) {
            (Some(url), None) => {
                Url::parse(&url)?;
                Ok(ResourcePayload::Url(url))
            }
            (None, Some(bytes)) => {
                let detected = infer::get(&bytes).ok_or_else(|| {
                    ResourceError::UnsupportedFileType("unrecognized content".to_string())
                })?;
                if !allowed_file_types
                    .iter()
                    .any(|ext| ext == detected.extension())
                {
                    return Err(ResourceError::UnsupportedFileType(
                        detected.mime_type().to_string(),
                    ));
                }
                let content_type = Mime::from_str(detected.mime_type()).map_err(|_| {
                    ResourceError::UnsupportedFileType(detected.mime_type().to_string())
                })?;
                Ok(ResourcePayload::File {
                    bytes,
                    content_type,
                })
            }
            _ => Err(ResourceError::InvalidResource),
        }
    }
}
