/*!
 * Configuration
 *
 * Construction-time settings for the simulated system and the scheduler.
 * Values come from (in increasing precedence) the defaults in
 * `core::limits`, an optional JSON file, and `SCHED_*` environment variables.
 */

use crate::core::errors::SchedulerError;
use crate::core::limits::*;
use crate::core::types::{SchedResult, Size};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::path::Path;
use std::time::Duration;

/// Inclusive range of simulated delays
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub min: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// A range that always yields `delay`
    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    /// Draw a delay uniformly, at millisecond granularity
    pub fn sample(&self) -> Duration {
        let (min, max) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        if min >= max {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(MIN_EXTERNAL_WAIT, MAX_EXTERNAL_WAIT)
    }
}

/// Inclusive range of simulated memory footprints (bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub min: Size,
    pub max: Size,
}

impl ByteRange {
    pub fn new(min: Size, max: Size) -> Self {
        Self { min, max }
    }

    pub fn sample(&self) -> Size {
        if self.min >= self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for ByteRange {
    fn default() -> Self {
        Self::new(MIN_MEMORY_CONSUMPTION, MAX_MEMORY_CONSUMPTION)
    }
}

/// Scheduler configuration
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Polling interval of the admission loop
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub admission_interval: Duration,

    /// Polling interval of each dispatch loop started by `run`
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub dispatch_interval: Duration,

    /// Delay of the simulated external event a blocked process waits for
    pub external_wait: DelayRange,

    /// Footprint drawn for processes scheduled without one
    pub memory_consumption: ByteRange,

    /// Buffered notifications per observer
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            admission_interval: DEFAULT_ADMISSION_INTERVAL,
            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,
            external_wait: DelayRange::default(),
            memory_consumption: ByteRange::default(),
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl SchedulerConfig {
    #[inline]
    #[must_use]
    pub fn with_admission_interval(mut self, interval: Duration) -> Self {
        self.admission_interval = interval;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_external_wait(mut self, range: DelayRange) -> Self {
        self.external_wait = range;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_memory_consumption(mut self, range: ByteRange) -> Self {
        self.memory_consumption = range;
        self
    }

    pub fn validate(&self) -> SchedResult<()> {
        if self.admission_interval.is_zero() {
            return Err(invalid("admission_interval must be greater than zero"));
        }
        if self.dispatch_interval.is_zero() {
            return Err(invalid("dispatch_interval must be greater than zero"));
        }
        if self.external_wait.min > self.external_wait.max {
            return Err(invalid("external_wait.min is greater than external_wait.max"));
        }
        if self.memory_consumption.min > self.memory_consumption.max {
            return Err(invalid(
                "memory_consumption.min is greater than memory_consumption.max",
            ));
        }
        if self.event_capacity == 0 {
            return Err(invalid("event_capacity must be greater than zero"));
        }
        Ok(())
    }
}

/// Simulated hardware configuration
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SystemConfig {
    /// One entry per memory slot (bytes)
    pub memory_slots: Vec<Size>,

    /// One entry per processor (compute budget)
    #[serde_as(as = "Vec<DurationMilliSeconds<u64>>")]
    pub processors: Vec<Duration>,

    /// Backoff of the resource monitor while resources are exhausted
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub monitor_backoff: Duration,

    pub event_capacity: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            memory_slots: vec![DEFAULT_MEMORY_CAPACITY],
            processors: vec![DEFAULT_PROCESSOR_CAPACITY],
            monitor_backoff: DEFAULT_MONITOR_BACKOFF,
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl SystemConfig {
    #[inline]
    #[must_use]
    pub fn with_memory_slots(mut self, slots: Vec<Size>) -> Self {
        self.memory_slots = slots;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_processors(mut self, processors: Vec<Duration>) -> Self {
        self.processors = processors;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_monitor_backoff(mut self, backoff: Duration) -> Self {
        self.monitor_backoff = backoff;
        self
    }

    pub fn validate(&self) -> SchedResult<()> {
        if self.monitor_backoff.is_zero() {
            return Err(invalid("monitor_backoff must be greater than zero"));
        }
        if self.event_capacity == 0 {
            return Err(invalid("event_capacity must be greater than zero"));
        }
        Ok(())
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    pub system: SystemConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Load configuration from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> SchedResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCHED_*` environment overrides
    ///
    /// - SCHED_ADMISSION_INTERVAL_MS
    /// - SCHED_DISPATCH_INTERVAL_MS
    /// - SCHED_MONITOR_BACKOFF_MS
    /// - SCHED_MEMORY_CAPACITY (replaces the memory pool with a single slot)
    /// - SCHED_PROCESSOR_CAPACITY_MS (replaces the processor pool with a single processor)
    pub fn with_env_overrides(mut self) -> SchedResult<Self> {
        if let Some(ms) = env_u64("SCHED_ADMISSION_INTERVAL_MS")? {
            self.scheduler.admission_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("SCHED_DISPATCH_INTERVAL_MS")? {
            self.scheduler.dispatch_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("SCHED_MONITOR_BACKOFF_MS")? {
            self.system.monitor_backoff = Duration::from_millis(ms);
        }
        if let Some(bytes) = env_u64("SCHED_MEMORY_CAPACITY")? {
            self.system.memory_slots = vec![bytes as Size];
        }
        if let Some(ms) = env_u64("SCHED_PROCESSOR_CAPACITY_MS")? {
            self.system.processors = vec![Duration::from_millis(ms)];
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> SchedResult<()> {
        self.system.validate()?;
        self.scheduler.validate()
    }
}

fn env_u64(key: &str) -> SchedResult<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| invalid(format!("{key}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn invalid(msg: impl Into<String>) -> SchedulerError {
    SchedulerError::Configuration(msg.into())
}
