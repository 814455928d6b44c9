use std::time::Duration;

use crate::error::ConfigError;

/// Typed characters buffered before new keystrokes are dropped.
pub const DEFAULT_CHAR_CAPACITY: usize = 128;
/// Keys that may be held down at once.
pub const DEFAULT_PRESSED_CAPACITY: usize = 32;
/// Mouse events buffered before the oldest are evicted.
pub const DEFAULT_MOUSE_CAPACITY: usize = 64;
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_BLINK_PERIOD: Duration = Duration::from_millis(500);

/// CPU throttling applied to key and mouse polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub enabled: bool,
    /// A throttled poll never completes sooner than this after it started.
    pub min_interval: Duration,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            enabled: true,
            min_interval,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_interval: DEFAULT_MIN_POLL_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.min_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POLL_INTERVAL)
    }
}

/// Which mouse gestures reach the mouse buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    Off,
    /// Click, Down and Up.
    Buttons,
    /// Buttons plus Drag.
    ButtonsAndDrag,
}

impl MouseMode {
    pub fn from_flags(enabled: bool, drag: bool) -> Self {
        match (enabled, drag) {
            (false, _) => MouseMode::Off,
            (true, false) => MouseMode::Buttons,
            (true, true) => MouseMode::ButtonsAndDrag,
        }
    }
}

/// Everything needed to build an [`InputCoordinator`](crate::InputCoordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub char_capacity: usize,
    pub pressed_capacity: usize,
    pub mouse_capacity: usize,
    pub throttle: Throttle,
    pub blink_period: Duration,
    pub mouse: MouseMode,
    pub echo: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            char_capacity: DEFAULT_CHAR_CAPACITY,
            pressed_capacity: DEFAULT_PRESSED_CAPACITY,
            mouse_capacity: DEFAULT_MOUSE_CAPACITY,
            throttle: Throttle::default(),
            blink_period: DEFAULT_BLINK_PERIOD,
            mouse: MouseMode::Off,
            echo: false,
        }
    }
}

impl ConsoleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (buffer, capacity) in [
            ("character buffer", self.char_capacity),
            ("pressed-key set", self.pressed_capacity),
            ("mouse buffer", self.mouse_capacity),
        ] {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity { buffer });
            }
        }
        self.throttle.validate()?;
        if self.blink_period.is_zero() {
            return Err(ConfigError::ZeroBlinkPeriod);
        }
        Ok(())
    }
}
