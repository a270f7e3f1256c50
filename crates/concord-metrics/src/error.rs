//! Metrics errors

/// Result alias for metrics
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors rendering metrics
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Metric construction or registration failed
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Encoder produced non-UTF-8 output
    #[error("exposition is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
