//! Scheduler configuration.

use crate::error::{ConfigError, Result};
use std::time::Duration;

/// Progress sampler frequency (samples per second).
pub const SAMPLE_HZ: f64 = 60.0;

/// Interval between progress samples (~16.67ms).
pub const SAMPLE_INTERVAL: Duration = Duration::from_nanos(16_666_667);

/// Interval between overflow drain ticks.
pub const DRAIN_INTERVAL: Duration = Duration::from_millis(500);

/// Consecutive empty drain ticks tolerated before the drain loop stops.
pub const DRAIN_IDLE_LIMIT: u32 = 20;

/// Batch runtime per item used when `runtime` is configured as zero.
pub const FALLBACK_SECONDS_PER_ITEM: f64 = 1.23;

/// Configuration for a [`Danmaku`](crate::Danmaku) scheduler.
#[derive(Debug, Clone)]
pub struct DanmakuConfig {
    /// Number of horizontal lanes the stage is split into.
    pub line_count: usize,
    /// Base travel time in seconds; wider messages add to it.
    pub base_speed: f64,
    /// Seconds a whole batch takes to send (0 = derive from batch length).
    pub runtime: f64,
    /// Give each scrolling message a random foreground color.
    pub colorize: bool,
    /// Restart batches after they complete.
    pub loop_batches: bool,
    /// Pause scrolling messages while the pointer is over them.
    pub hover: bool,
    /// Multiple of a message's width it must travel before its lane frees.
    pub coefficient: f64,
    /// Extra distance a message starts beyond the right edge.
    pub margin: f64,
    /// Class applied to messages sent without their own.
    pub wrapper_class: Option<String>,
    /// Hold time for centered messages sent without an explicit duration.
    pub centered_duration: Duration,
    /// Seed for lane picks (None = seed from the OS).
    pub seed: Option<u64>,
}

impl Default for DanmakuConfig {
    fn default() -> Self {
        Self {
            line_count: 10,
            base_speed: 5.0,
            runtime: 10.0,
            colorize: false,
            loop_batches: false,
            hover: false,
            coefficient: 1.38,
            margin: 130.0,
            wrapper_class: None,
            centered_duration: Duration::from_millis(3000),
            seed: None,
        }
    }
}

impl DanmakuConfig {
    /// Set the lane count.
    #[must_use]
    pub const fn with_line_count(mut self, line_count: usize) -> Self {
        self.line_count = line_count;
        self
    }

    /// Set the base travel time in seconds.
    #[must_use]
    pub const fn with_base_speed(mut self, seconds: f64) -> Self {
        self.base_speed = seconds;
        self
    }

    /// Set the batch runtime in seconds.
    #[must_use]
    pub const fn with_runtime(mut self, seconds: f64) -> Self {
        self.runtime = seconds;
        self
    }

    /// Enable or disable random colors.
    #[must_use]
    pub const fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Enable or disable batch looping.
    #[must_use]
    pub const fn with_loop_batches(mut self, loop_batches: bool) -> Self {
        self.loop_batches = loop_batches;
        self
    }

    /// Enable or disable hover reaction.
    #[must_use]
    pub const fn with_hover(mut self, hover: bool) -> Self {
        self.hover = hover;
        self
    }

    /// Set the early lane release coefficient.
    #[must_use]
    pub const fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// Set the start margin.
    #[must_use]
    pub const fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the wrapper class.
    #[must_use]
    pub fn with_wrapper_class(mut self, class: impl Into<String>) -> Self {
        self.wrapper_class = Some(class.into());
        self
    }

    /// Set the default centered hold time.
    #[must_use]
    pub const fn with_centered_duration(mut self, duration: Duration) -> Self {
        self.centered_duration = duration;
        self
    }

    /// Seed lane picks for reproducible placement.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every option for a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.line_count == 0 {
            return Err(ConfigError::ZeroLanes);
        }
        positive("base_speed", self.base_speed)?;
        positive("coefficient", self.coefficient)?;
        non_negative("runtime", self.runtime)?;
        non_negative("margin", self.margin)?;
        if self.centered_duration.is_zero() {
            return Err(ConfigError::ZeroCenteredDuration);
        }
        if self
            .wrapper_class
            .as_deref()
            .is_some_and(|class| class.trim().is_empty())
        {
            return Err(ConfigError::BlankWrapperClass);
        }
        Ok(())
    }

    /// Seconds between batch items for a batch of `len` items.
    #[allow(clippy::cast_precision_loss)]
    pub fn batch_cadence(&self, len: usize) -> Duration {
        if len == 0 {
            return Duration::ZERO;
        }
        let total = if self.runtime > 0.0 {
            self.runtime
        } else {
            FALLBACK_SECONDS_PER_ITEM * len as f64
        };
        Duration::from_secs_f64(total / len as f64)
    }
}

fn positive(option: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { option, value })
    }
}

fn non_negative(option: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { option, value })
    }
}
