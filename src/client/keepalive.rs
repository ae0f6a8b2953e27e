// ABOUTME: Keep-alive bookkeeping for a bound transmitter session
// ABOUTME: Decides when the session task sends enquire_link and when the link is considered dead

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for the enquire_link keep-alive of a bound session.
///
/// SMPP v3.4 expects an ESME to check an idle link with enquire_link and the
/// SMSC to answer with enquire_link_resp. Any PDU received from the SMSC
/// counts as activity and postpones the next enquire_link.
///
/// # Example
///
/// ```rust
/// use smpp_client::client::KeepAliveConfig;
/// use std::time::Duration;
///
/// // 30s interval, 10s timeout, 3 max failures
/// let config = KeepAliveConfig::default();
///
/// let config = KeepAliveConfig::new(Duration::from_secs(60))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_failures(5);
/// assert_eq!(config.max_failures, 5);
///
/// assert!(!KeepAliveConfig::disabled().enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveConfig {
    /// Idle time after which an enquire_link is sent (default: 30 seconds)
    pub interval: Duration,

    /// How long an enquire_link may stay unanswered (default: 10 seconds).
    /// Also bounds the wait for unbind_resp when the session closes.
    pub timeout: Duration,

    /// Consecutive unanswered enquire_links before the session is
    /// considered lost (default: 3)
    pub max_failures: u32,

    /// When false the session never pings the SMSC, but still answers
    /// enquire_link from the SMSC.
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            max_failures: 3,
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    /// Create a new keep-alive configuration with custom interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Snapshot of the keep-alive counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveStatus {
    /// Whether the session pings the SMSC at all
    pub running: bool,

    /// Unanswered enquire_links in a row. Reset by any enquire_link_resp.
    pub consecutive_failures: u32,

    /// Total enquire_link PDUs sent
    pub total_pings: u32,

    /// Total enquire_link_resp PDUs received
    pub total_pongs: u32,

    /// An enquire_link is currently waiting for its response
    pub awaiting_response: bool,
}

/// Tracks idle time and outstanding enquire_links for one session.
///
/// The manager never touches the network. The session task polls it on
/// every tick:
///
/// 1. `check_timeout()` turns an overdue enquire_link into a failure
/// 2. `is_connection_failed()` tells the task to give up on the session
/// 3. `should_ping()` asks for a new enquire_link, followed by `on_ping_sent()`
///
/// and reports traffic with `on_activity()` and `on_ping_success()`.
///
/// ```rust
/// use smpp_client::client::{KeepAliveConfig, KeepAliveManager};
/// use std::time::Duration;
///
/// let mut manager = KeepAliveManager::new(KeepAliveConfig::new(Duration::ZERO));
/// assert!(manager.should_ping());
///
/// manager.on_ping_sent();
/// assert!(!manager.should_ping()); // one enquire_link in flight at a time
///
/// manager.on_ping_success();
/// assert_eq!(manager.status().total_pongs, 1);
/// ```
#[derive(Debug)]
pub struct KeepAliveManager {
    config: KeepAliveConfig,

    /// Last time anything was heard from, or sent to, the SMSC
    last_activity: Instant,

    /// Send time of the enquire_link still waiting for a response
    awaiting_since: Option<Instant>,

    consecutive_failures: u32,
    total_pings: u32,
    total_pongs: u32,
}

impl KeepAliveManager {
    /// The idle clock starts now, so a fresh session is not pinged
    /// before a full interval has passed.
    pub fn new(config: KeepAliveConfig) -> Self {
        Self {
            config,
            last_activity: Instant::now(),
            awaiting_since: None,
            consecutive_failures: 0,
            total_pings: 0,
            total_pongs: 0,
        }
    }

    /// Check if an enquire_link should be sent now.
    ///
    /// False while disabled, while a previous enquire_link is outstanding,
    /// once the failure limit is reached, or before the link has been idle
    /// for a full interval.
    pub fn should_ping(&self) -> bool {
        if !self.config.enabled || self.awaiting_since.is_some() {
            return false;
        }

        if self.is_connection_failed() {
            debug!("Max failures reached, not sending more pings");
            return false;
        }

        self.last_activity.elapsed() >= self.config.interval
    }

    /// Record that an enquire_link went out.
    pub fn on_ping_sent(&mut self) {
        let now = Instant::now();
        self.last_activity = now;
        self.awaiting_since = Some(now);
        self.total_pings += 1;
        debug!("enquire_link sent (total: {})", self.total_pings);
    }

    /// Record an enquire_link_resp from the SMSC.
    pub fn on_ping_success(&mut self) {
        self.awaiting_since = None;
        self.consecutive_failures = 0;
        self.total_pongs += 1;
        self.on_activity();
        debug!("enquire_link answered (total: {})", self.total_pongs);
    }

    /// Record an enquire_link that was never answered or could not be sent.
    pub fn on_ping_failure(&mut self) {
        self.awaiting_since = None;
        self.consecutive_failures += 1;
        warn!(
            "enquire_link failed (consecutive failures: {})",
            self.consecutive_failures
        );
    }

    /// Any PDU from the SMSC restarts the idle clock.
    pub fn on_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Expires the outstanding enquire_link once it is older than the
    /// configured timeout. Returns true when a failure was recorded.
    pub fn check_timeout(&mut self) -> bool {
        match self.awaiting_since {
            Some(sent) if sent.elapsed() >= self.config.timeout => {
                self.on_ping_failure();
                true
            }
            _ => false,
        }
    }

    pub fn is_connection_failed(&self) -> bool {
        self.consecutive_failures >= self.config.max_failures
    }

    pub fn status(&self) -> KeepAliveStatus {
        KeepAliveStatus {
            running: self.config.enabled,
            consecutive_failures: self.consecutive_failures,
            total_pings: self.total_pings,
            total_pongs: self.total_pongs,
            awaiting_response: self.awaiting_since.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_alive_config_defaults() {
        let config = KeepAliveConfig::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_failures, 3);
        assert!(config.enabled);
    }

    #[test]
    fn test_keep_alive_config_builder() {
        let config = KeepAliveConfig::new(Duration::from_secs(60))
            .with_timeout(Duration::from_secs(5))
            .with_max_failures(5);

        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_failures, 5);
        assert!(config.enabled);
    }

    #[test]
    fn test_fresh_session_waits_a_full_interval() {
        let mut manager = KeepAliveManager::new(KeepAliveConfig::new(Duration::from_millis(100)));
        assert!(!manager.should_ping());

        std::thread::sleep(Duration::from_millis(150));
        assert!(manager.should_ping());

        // traffic from the SMSC postpones the ping
        manager.on_activity();
        assert!(!manager.should_ping());
    }

    #[test]
    fn test_single_outstanding_ping() {
        let mut manager = KeepAliveManager::new(KeepAliveConfig::new(Duration::ZERO));
        assert!(manager.should_ping());

        manager.on_ping_sent();
        assert!(!manager.should_ping());
        assert!(manager.status().awaiting_response);

        manager.on_ping_success();
        assert!(manager.should_ping());
    }

    #[test]
    fn test_unanswered_ping_times_out() {
        let config = KeepAliveConfig::new(Duration::ZERO)
            .with_timeout(Duration::from_millis(20))
            .with_max_failures(2);
        let mut manager = KeepAliveManager::new(config);

        manager.on_ping_sent();
        assert!(!manager.check_timeout());

        std::thread::sleep(Duration::from_millis(30));
        assert!(manager.check_timeout());
        assert_eq!(manager.status().consecutive_failures, 1);
        assert!(!manager.is_connection_failed());

        // nothing outstanding any more
        assert!(!manager.check_timeout());

        manager.on_ping_sent();
        std::thread::sleep(Duration::from_millis(30));
        assert!(manager.check_timeout());
        assert!(manager.is_connection_failed());
        assert!(!manager.should_ping());
    }

    #[test]
    fn test_keep_alive_disabled() {
        let manager = KeepAliveManager::new(KeepAliveConfig {
            interval: Duration::ZERO,
            ..KeepAliveConfig::disabled()
        });

        assert!(!manager.status().running);
        assert!(!manager.should_ping());
    }

    #[test]
    fn test_keep_alive_statistics() {
        let mut manager = KeepAliveManager::new(KeepAliveConfig::default());

        let status = manager.status();
        assert_eq!(status.total_pings, 0);
        assert_eq!(status.total_pongs, 0);
        assert_eq!(status.consecutive_failures, 0);

        manager.on_ping_sent();
        manager.on_ping_failure();
        assert_eq!(manager.status().consecutive_failures, 1);

        manager.on_ping_sent();
        manager.on_ping_success();
        let status = manager.status();
        assert_eq!(status.total_pings, 2);
        assert_eq!(status.total_pongs, 1);
        assert_eq!(status.consecutive_failures, 0);
    }
}
