use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by scenario setup and the output sinks.
///
/// Degenerate geometry and numerical blowups inside a step are recovered
/// locally and never show up here; only setup and I/O can fail.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected configuration (non-positive mass, radius or step, empty
    /// particle set, inverted boundary, malformed vectors).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Propagated I/O errors from scenario files and sinks.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Scenario file could not be parsed.
    #[error("scenario parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV sink failure.
    #[error("csv output error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidConfig("mass must be > 0".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("mass"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "scenario.yaml");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("scenario.yaml"));
    }
}
