use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    InvalidUrl(url::ParseError),
    UnsupportedScheme(String),
    EmptyUrl,
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidUrl(err) => write!(f, "invalid media url: {err}"),
            ModelError::UnsupportedScheme(scheme) => {
                write!(f, "unsupported media url scheme: {scheme}")
            }
            ModelError::EmptyUrl => write!(f, "media url is empty"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::InvalidUrl(err) => Some(err),
            ModelError::UnsupportedScheme(_) | ModelError::EmptyUrl => None,
        }
    }
}

impl From<url::ParseError> for ModelError {
    fn from(err: url::ParseError) -> Self {
        ModelError::InvalidUrl(err)
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Parse a media URL, rejecting blank input and non-http(s) schemes.
///
/// ```
/// use vidsync_model::{ModelError, parse_media_url};
///
/// let url = parse_media_url(" https://youtu.be/abc?t=30 ").unwrap();
/// assert_eq!(url.host_str(), Some("youtu.be"));
/// assert!(matches!(parse_media_url(""), Err(ModelError::EmptyUrl)));
/// ```
pub fn parse_media_url(raw: &str) -> Result<url::Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyUrl);
    }

    let url = url::Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ModelError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_is_rejected() {
        assert!(matches!(parse_media_url("   "), Err(ModelError::EmptyUrl)));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err = parse_media_url("file:///tmp/video.mp4").unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedScheme(ref s) if s == "file"));
    }

    #[test]
    fn https_url_parses() {
        let url = parse_media_url(" https://youtu.be/abc?t=30 ").unwrap();
        assert_eq!(url.host_str(), Some("youtu.be"));
    }
}
