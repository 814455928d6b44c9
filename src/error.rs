use thiserror::Error;

/// Rejected construction parameters.
///
/// Runtime input operations never fail; only building a buffer or a
/// coordinator with an unusable configuration does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A buffer was asked to hold zero elements.
    #[error("{buffer} capacity must be at least 1")]
    ZeroCapacity { buffer: &'static str },

    /// Throttling was enabled with a zero minimum interval.
    #[error("minimum poll interval must be non-zero when throttling is enabled")]
    ZeroPollInterval,

    /// The cursor would blink infinitely fast.
    #[error("cursor blink period must be non-zero")]
    ZeroBlinkPeriod,
}
