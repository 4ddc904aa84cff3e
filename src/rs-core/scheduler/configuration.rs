use thiserror::Error;

const DEFAULT_MAX_BUFFER_LENGTH: f64 = 30.;
const DEFAULT_MAX_MAX_BUFFER_LENGTH: f64 = 600.;
const DEFAULT_MAX_BUFFER_HOLE: f64 = 0.5;
const DEFAULT_MAX_FRAGMENT_LOOKUP_TOLERANCE: f64 = 0.25;
const DEFAULT_TICK_INTERVAL: f64 = 500.;
const DEFAULT_FRAGMENT_REQUEST_TIMEOUT: f64 = 20000.;

/// Inner configuration on which a `StreamController` relies.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SchedulerConfiguration {
    /// Amount of buffer, ahead of the current position, we want to build in seconds.
    /// Once we reached that point, we won't try to load new fragments.
    pub(crate) max_buffer_length: f64,

    /// Absolute maximum of `max_buffer_length`, in seconds.
    pub(crate) max_max_buffer_length: f64,

    /// Maximum gap, in seconds, between two buffered ranges for them to still be
    /// considered as contiguous.
    pub(crate) max_buffer_hole: f64,

    /// Tolerance, in seconds, used when looking for the fragment covering a given time.
    pub(crate) max_fragment_lookup_tolerance: f64,

    /// Interval, in milliseconds, at which the scheduler checks if a new fragment should be
    /// loaded.
    pub(crate) tick_interval: f64,

    /// Timeout, in milliseconds, used for fragment requests.
    ///
    /// To set to `None` to disable.
    pub(crate) fragment_request_timeout: Option<f64>,
}

impl Default for SchedulerConfiguration {
    fn default() -> Self {
        Self {
            max_buffer_length: DEFAULT_MAX_BUFFER_LENGTH,
            max_max_buffer_length: DEFAULT_MAX_MAX_BUFFER_LENGTH,
            max_buffer_hole: DEFAULT_MAX_BUFFER_HOLE,
            max_fragment_lookup_tolerance: DEFAULT_MAX_FRAGMENT_LOOKUP_TOLERANCE,
            tick_interval: DEFAULT_TICK_INTERVAL,
            fragment_request_timeout: Some(DEFAULT_FRAGMENT_REQUEST_TIMEOUT),
        }
    }
}

impl SchedulerConfiguration {
    /// Amount of buffer to build, `max_buffer_length` clamped to `max_max_buffer_length`.
    pub(crate) fn target_buffer_length(&self) -> f64 {
        self.max_buffer_length.min(self.max_max_buffer_length)
    }
}

/// Error returned when trying to set an unusable configuration value.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum ConfigurationError {
    #[error("`{name}` should be a positive number, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("`{name}` should be a strictly positive number, got {value}")]
    NotStrictlyPositive { name: &'static str, value: f64 },
}

/// Returns `value` if it can be used as a duration, which may be `0`.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_nan() || value < 0. {
        Err(ConfigurationError::NotPositive { name, value })
    } else {
        Ok(value)
    }
}

/// Returns `value` if it can be used as a non-null duration.
pub(crate) fn check_strictly_positive(
    name: &'static str,
    value: f64,
) -> Result<f64, ConfigurationError> {
    if value.is_nan() || value <= 0. {
        Err(ConfigurationError::NotStrictlyPositive { name, value })
    } else {
        Ok(value)
    }
}
