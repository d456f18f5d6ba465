use crate::priv_prelude::*;

/// Error returned when a configuration value is out of range.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A duration given in seconds was negative, NaN or too large to represent.
    #[error("{name} must be a finite, non-negative number of seconds, got {value}")]
    InvalidDuration {
        /// Name of the offending setting.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A probability was outside of `[0, 1]`.
    #[error("{name} must be a probability between 0 and 1, got {value}")]
    InvalidProbability {
        /// Name of the offending setting.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The longest delay a packet could receive is more than [`MAX_DELAY`](crate::MAX_DELAY).
    #[error("delay plus jitter must be at most {:?}, got {:?}", MAX_DELAY, .max_delay)]
    DelayTooLong {
        /// Delay plus jitter, saturated at `Duration::MAX`.
        max_delay: Duration,
    },
}

/// The longest a packet can be held for, delay and jitter combined.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn duration_from_secs(name: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if secs == 0.0 {
        return Ok(Duration::ZERO);
    }
    if secs < 0.0 {
        return Err(ConfigError::InvalidDuration { name, value: secs });
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDuration { name, value: secs })
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

/// Timing parameters of a [`DelayScheduler`](crate::DelayScheduler).
///
/// Every packet is held for `delay` plus a random amount drawn uniformly from `[0, jitter)`.
/// A non-zero `jitter` can cause packets to be re-ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Delay applied to every packet.
    pub delay: Duration,
    /// Width of the window the additional random delay is drawn from.
    pub jitter: Duration,
}

impl SchedulerConfig {
    /// Creates a config from a delay and a jitter window.
    pub fn new(delay: Duration, jitter: Duration) -> SchedulerConfig {
        SchedulerConfig { delay, jitter }
    }

    /// Creates a config from fractional seconds, as accepted on the command line.
    pub fn from_secs(delay: f64, jitter: f64) -> Result<SchedulerConfig, ConfigError> {
        let delay = duration_from_secs("delay", delay)?;
        let jitter = duration_from_secs("jitter", jitter)?;
        let config = SchedulerConfig { delay, jitter };
        config.validate()?;
        Ok(config)
    }

    /// The largest delay any packet can receive. Saturates at `Duration::MAX`.
    pub fn max_delay(&self) -> Duration {
        self.delay.saturating_add(self.jitter)
    }

    /// Checks packets can't be held for longer than [`MAX_DELAY`](crate::MAX_DELAY).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_delay = self.max_delay();
        if max_delay > MAX_DELAY {
            return Err(ConfigError::DelayTooLong { max_delay });
        }
        Ok(())
    }
}

/// Parameters of the burst-loss model applied to inbound datagrams.
///
/// While datagrams are passing, each one starts a loss burst with probability `loss_start`.
/// During a burst, each datagram ends it with probability `loss_stop`. Every datagram seen while
/// a burst is in progress is dropped. Setting `loss_start` to `0.0` disables loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossConfig {
    /// Probability of a passing datagram starting a loss burst.
    pub loss_start: f64,
    /// Probability of a datagram ending the current loss burst.
    pub loss_stop: f64,
}

impl LossConfig {
    /// A config which never drops anything.
    pub const NONE: LossConfig = LossConfig {
        loss_start: 0.0,
        loss_stop: 1.0,
    };

    /// Creates a loss config. See the type-level documentation for the meaning of the two
    /// probabilities.
    pub fn new(loss_start: f64, loss_stop: f64) -> Result<LossConfig, ConfigError> {
        let config = LossConfig { loss_start, loss_stop };
        config.validate()?;
        Ok(config)
    }

    /// Checks both probabilities are within `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("loss_start", self.loss_start)?;
        check_probability("loss_stop", self.loss_stop)?;
        Ok(())
    }

    /// Returns `true` if this config can never drop a datagram.
    pub fn is_lossless(&self) -> bool {
        self.loss_start == 0.0
    }

    /// The long-run proportion of datagrams that get dropped.
    pub fn expected_loss_rate(&self) -> f64 {
        if self.is_lossless() {
            return 0.0;
        }
        self.loss_start / (self.loss_start + self.loss_stop)
    }
}

impl Default for LossConfig {
    fn default() -> LossConfig {
        LossConfig::NONE
    }
}

/// Everything needed to run a [`Proxy`](crate::Proxy).
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Address to receive datagrams on.
    pub listen_addr: SocketAddr,
    /// Address every datagram is relayed to.
    pub target_addr: SocketAddr,
    /// Delay and jitter applied to relayed datagrams.
    pub scheduler: SchedulerConfig,
    /// Loss applied to datagrams before they are scheduled.
    pub loss: LossConfig,
}

impl ProxyConfig {
    /// Creates a config which relays from `listen_addr` to `target_addr` without any impairment.
    pub fn new(listen_addr: SocketAddr, target_addr: SocketAddr) -> ProxyConfig {
        ProxyConfig {
            listen_addr,
            target_addr,
            scheduler: SchedulerConfig::default(),
            loss: LossConfig::NONE,
        }
    }

    /// Sets the fixed delay.
    pub fn delay(mut self, delay: Duration) -> ProxyConfig {
        self.scheduler.delay = delay;
        self
    }

    /// Sets the jitter window.
    pub fn jitter(mut self, jitter: Duration) -> ProxyConfig {
        self.scheduler.jitter = jitter;
        self
    }

    /// Sets the loss model.
    pub fn loss(mut self, loss: LossConfig) -> ProxyConfig {
        self.loss = loss;
        self
    }

    /// Checks the config for values which can't be run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;
        self.loss.validate()
    }
}
