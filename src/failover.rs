//! Failover transport URIs and the reconnect schedule they describe.
//!
//! A failover URI names a set of brokers plus a retry policy:
//!
//! ```text
//! failover:(tcp://primary:61613,tcp://backup:61613)?randomize=false&maxReconnectDelay=8000
//! ```
//!
//! [`FailoverTransport`] turns the parsed URI into a stateful schedule: each
//! call to [`FailoverTransport::next_broker`] yields the endpoint to try
//! next together with the delay to wait first, until the attempt budget is
//! exhausted. The caller reports outcomes via
//! [`FailoverTransport::note_success`] and
//! [`FailoverTransport::note_failure`]; a success resets the backoff and
//! the budget.

use std::str::FromStr;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::FailoverError;

/// A single broker endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broker {
    pub host: String,
    pub port: u16,
}

/// Reconnect policy options, with ActiveMQ-compatible names and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FailoverOptions {
    /// Delay before the first retry, in ms.
    pub initial_reconnect_delay: u64,
    /// Ceiling for the backoff delay, in ms.
    pub max_reconnect_delay: u64,
    pub use_exponential_back_off: bool,
    pub back_off_multiplier: f64,
    /// -1 retries forever; 0 tries each broker once; N allows N retry
    /// passes over the broker list after the first.
    pub max_reconnect_attempts: i64,
    /// When non-zero, replaces `max_reconnect_attempts` until the first
    /// successful connection.
    pub startup_max_reconnect_attempts: i64,
    /// Random extra delay in ms added to each backoff, to avoid stampedes.
    pub reconnect_delay_jitter: u64,
    /// Shuffle the broker list once per pass.
    pub randomize: bool,
    /// Keep the first declared broker at the front of every pass.
    pub priority_backup: bool,
}

impl Default for FailoverOptions {
    fn default() -> Self {
        Self {
            initial_reconnect_delay: 10,
            max_reconnect_delay: 30_000,
            use_exponential_back_off: true,
            back_off_multiplier: 2.0,
            max_reconnect_attempts: -1,
            startup_max_reconnect_attempts: 0,
            reconnect_delay_jitter: 0,
            randomize: true,
            priority_backup: false,
        }
    }
}

/// A parsed failover URI: the broker list plus its options.
#[derive(Debug, Clone, PartialEq)]
pub struct FailoverUri {
    pub brokers: Vec<Broker>,
    pub options: FailoverOptions,
}

impl FromStr for FailoverUri {
    type Err = FailoverError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let rest = input.strip_prefix("failover:").unwrap_or(input);
        let (broker_part, option_part) = match rest.split_once('?') {
            Some((brokers, options)) => (brokers, Some(options)),
            None => (rest, None),
        };

        let broker_part = match broker_part.strip_prefix('(') {
            Some(inner) => inner.strip_suffix(')').ok_or_else(|| {
                FailoverError::MalformedUri("unbalanced parentheses".to_string())
            })?,
            None => broker_part,
        };
        if broker_part.is_empty() {
            return Err(FailoverError::MalformedUri("no brokers given".to_string()));
        }
        let brokers = broker_part
            .split(',')
            .map(parse_broker)
            .collect::<Result<Vec<_>, _>>()?;

        let mut options = FailoverOptions::default();
        if let Some(option_part) = option_part {
            for pair in option_part.split('&').filter(|pair| !pair.is_empty()) {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    FailoverError::MalformedUri(format!("option without value: {}", pair))
                })?;
                apply_option(&mut options, key, value)?;
            }
        }

        Ok(FailoverUri { brokers, options })
    }
}

fn parse_broker(uri: &str) -> Result<Broker, FailoverError> {
    let rest = uri
        .strip_prefix("tcp://")
        .ok_or_else(|| FailoverError::MalformedUri(format!("unsupported broker uri: {}", uri)))?;
    let (host, port) = rest
        .rsplit_once(':')
        .ok_or_else(|| FailoverError::MalformedUri(format!("missing port: {}", uri)))?;
    if host.is_empty() {
        return Err(FailoverError::MalformedUri(format!("missing host: {}", uri)));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| FailoverError::MalformedUri(format!("invalid port: {}", uri)))?;
    Ok(Broker {
        host: host.to_string(),
        port,
    })
}

fn apply_option(
    options: &mut FailoverOptions,
    key: &str,
    value: &str,
) -> Result<(), FailoverError> {
    fn parsed<T: FromStr>(key: &str, value: &str) -> Result<T, FailoverError> {
        value.parse().map_err(|_| FailoverError::BadOptionValue {
            option: key.to_string(),
            value: value.to_string(),
        })
    }

    match key {
        "initialReconnectDelay" => options.initial_reconnect_delay = parsed(key, value)?,
        "maxReconnectDelay" => options.max_reconnect_delay = parsed(key, value)?,
        "useExponentialBackOff" => options.use_exponential_back_off = parsed(key, value)?,
        "backOffMultiplier" => options.back_off_multiplier = parsed(key, value)?,
        "maxReconnectAttempts" => options.max_reconnect_attempts = parsed(key, value)?,
        "startupMaxReconnectAttempts" => {
            options.startup_max_reconnect_attempts = parsed(key, value)?
        }
        "reconnectDelayJitter" => options.reconnect_delay_jitter = parsed(key, value)?,
        "randomize" => options.randomize = parsed(key, value)?,
        "priorityBackup" => options.priority_backup = parsed(key, value)?,
        other => return Err(FailoverError::UnknownOption(other.to_string())),
    }
    Ok(())
}

/// The stateful reconnect schedule for a failover URI; see the module docs.
#[derive(Debug)]
pub struct FailoverTransport {
    uri: FailoverUri,
    /// Broker indexes for the current pass; refilled (and possibly
    /// reshuffled) when exhausted.
    order: Vec<usize>,
    position: usize,
    /// Completed passes over the broker list since the last success; -1
    /// before the first.
    passes: i64,
    /// Endpoints handed out since the last success; -1 before the first,
    /// so the very first attempt gets a zero delay.
    attempts: i64,
    reconnect_delay: f64,
    connected_once: bool,
    consecutive_failures: u32,
}

impl FailoverTransport {
    pub fn new(uri: FailoverUri) -> Self {
        let reconnect_delay = uri.options.initial_reconnect_delay as f64;
        Self {
            uri,
            order: Vec::new(),
            position: 0,
            passes: -1,
            attempts: -1,
            reconnect_delay,
            connected_once: false,
            consecutive_failures: 0,
        }
    }

    /// Parse a failover URI and build its schedule in one step.
    pub fn parse(input: &str) -> Result<Self, FailoverError> {
        input.parse::<FailoverUri>().map(Self::new)
    }

    pub fn uri(&self) -> &FailoverUri {
        &self.uri
    }

    /// The next endpoint to try and the delay to wait before trying it.
    /// `None` means the attempt budget is spent and the caller should give
    /// up (until a later `note_success` resets the schedule).
    pub fn next_broker(&mut self) -> Option<(Broker, Duration)> {
        if self.position >= self.order.len() {
            self.passes += 1;
            let budget = self.attempt_budget();
            if budget >= 0 && self.passes > budget {
                tracing::debug!(passes = self.passes, "reconnect attempts exhausted");
                return None;
            }
            self.refill_pass();
        }
        let broker = self.uri.brokers[self.order[self.position]].clone();
        self.position += 1;
        self.attempts += 1;
        let delay = if self.attempts == 0 {
            Duration::ZERO
        } else {
            self.backoff_delay()
        };
        Some((broker, delay))
    }

    /// Report a successful connection: resets backoff, attempt counters and
    /// pass ordering, and switches from the startup budget to the regular
    /// one.
    pub fn note_success(&mut self) {
        self.connected_once = true;
        self.consecutive_failures = 0;
        self.reconnect_delay = self.uri.options.initial_reconnect_delay as f64;
        self.passes = -1;
        self.attempts = -1;
        self.position = 0;
        self.order.clear();
    }

    /// Report a failed connection attempt.
    pub fn note_failure(&mut self) {
        self.consecutive_failures += 1;
        tracing::debug!(failures = self.consecutive_failures, "broker attempt failed");
    }

    /// Failed attempts since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn attempt_budget(&self) -> i64 {
        let options = &self.uri.options;
        if !self.connected_once && options.startup_max_reconnect_attempts != 0 {
            options.startup_max_reconnect_attempts
        } else {
            options.max_reconnect_attempts
        }
    }

    fn refill_pass(&mut self) {
        self.order = (0..self.uri.brokers.len()).collect();
        if self.uri.options.randomize {
            self.order.shuffle(&mut rand::thread_rng());
        }
        if self.uri.options.priority_backup {
            if let Some(first) = self.order.iter().position(|&index| index == 0) {
                self.order.remove(first);
                self.order.insert(0, 0);
            }
        }
        self.position = 0;
    }

    fn backoff_delay(&mut self) -> Duration {
        let options = &self.uri.options;
        let jitter = if options.reconnect_delay_jitter > 0 {
            rand::thread_rng().gen_range(0..=options.reconnect_delay_jitter) as f64
        } else {
            0.0
        };
        let delay = (self.reconnect_delay + jitter).min(options.max_reconnect_delay as f64);
        if options.use_exponential_back_off {
            self.reconnect_delay *= options.back_off_multiplier;
        }
        Duration::from_millis(delay.max(0.0) as u64)
    }
}
