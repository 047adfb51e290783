//! Condition polling.
//!
//! A [`Poller`] evaluates a predicate at `t = 0, interval, 2 × interval, ...`
//! and stops at the first true result, at a fatal error, or before an
//! evaluation would land past the timeout.
//!
//! Waits come in two tiers:
//!
//! - probes ([`Session::wait_until`] and friends) return `bool`; a timeout is
//!   logged at `warn` with the last swallowed error and reported as `false`
//! - [`Session::wait_for`] returns the [`WaitResult`] or a
//!   [`LocusError::Timeout`] carrying the same cause
//!
//! Transient errors (element not found, stale, driver failures) count as a
//! false evaluation. Anything else aborts the wait immediately.

use std::fmt;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::config::LocusConfig;
use crate::driver::{Driver, DriverError, ElementHandle};
use crate::node::LocatorNode;
use crate::result::{LocusError, LocusResult};
use crate::session::{driver_error, Session};

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from_config(&LocusConfig::default())
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default timeout and poll interval of `config`
    #[must_use]
    pub const fn from_config(config: &LocusConfig) -> Self {
        Self {
            timeout_ms: config.timeouts.default_ms,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration (never zero)
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Whether the wait was successful
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
    /// Number of predicate evaluations
    pub evaluations: u32,
    /// Last transient error swallowed while polling
    pub last_error: Option<String>,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            waited_for: waited_for.into(),
            evaluations: 0,
            last_error: None,
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub fn timeout(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(elapsed, waited_for)
        }
    }

    fn with_stats(mut self, evaluations: u32, last_error: Option<String>) -> Self {
        self.evaluations = evaluations;
        self.last_error = last_error;
        self
    }
}

// =============================================================================
// POLLER
// =============================================================================

/// Bounded-time predicate loop
#[derive(Debug, Clone, Copy)]
pub struct Poller<'c> {
    clock: &'c dyn Clock,
    options: WaitOptions,
}

impl<'c> Poller<'c> {
    /// Poller sleeping on `clock`
    #[must_use]
    pub const fn new(clock: &'c dyn Clock, options: WaitOptions) -> Self {
        Self { clock, options }
    }

    /// Options in use
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Evaluate `predicate` until it holds or time runs out.
    ///
    /// Returns a [`WaitResult`] for both success and timeout; only a fatal
    /// predicate error is an `Err`.
    pub fn poll<F>(&self, waited_for: &str, mut predicate: F) -> LocusResult<WaitResult>
    where
        F: FnMut() -> LocusResult<bool>,
    {
        let start = self.clock.now();
        let timeout = self.options.timeout();
        let interval = self.options.poll_interval();
        let mut evaluations = 0;
        let mut last_error = None;

        loop {
            evaluations += 1;
            match predicate() {
                Ok(true) => {
                    let elapsed = self.clock.now().saturating_sub(start);
                    return Ok(WaitResult::success(elapsed, waited_for)
                        .with_stats(evaluations, last_error));
                }
                Ok(false) => {}
                Err(err) if err.is_transient() => last_error = Some(err.to_string()),
                Err(err) => return Err(err),
            }

            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed + interval > timeout {
                return Ok(WaitResult::timeout(elapsed, waited_for)
                    .with_stats(evaluations, last_error));
            }
            self.clock.sleep(interval);
        }
    }

    /// Probe form of [`Self::poll`]: `true` on success, `false` otherwise.
    ///
    /// Timeouts are logged at `warn`, fatal errors at `error`.
    pub fn until<F>(&self, waited_for: &str, predicate: F) -> bool
    where
        F: FnMut() -> LocusResult<bool>,
    {
        match self.poll(waited_for, predicate) {
            Ok(result) if result.success => true,
            Ok(result) => {
                warn!(
                    timeout_ms = self.options.timeout_ms,
                    evaluations = result.evaluations,
                    last_error = result.last_error.as_deref().unwrap_or("none"),
                    "Timed out waiting for {}",
                    waited_for
                );
                false
            }
            Err(err) => {
                error!(error = %err, "Wait for {} aborted", waited_for);
                false
            }
        }
    }

    /// Error form of [`Self::poll`]: a timeout becomes [`LocusError::Timeout`]
    pub fn until_ok<F>(&self, waited_for: &str, predicate: F) -> LocusResult<WaitResult>
    where
        F: FnMut() -> LocusResult<bool>,
    {
        let result = self.poll(waited_for, predicate)?;
        if result.success {
            Ok(result)
        } else {
            Err(LocusError::Timeout {
                ms: self.options.timeout_ms,
                waited_for: result.waited_for,
                cause: result.last_error,
            })
        }
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Predicate over the elements a node currently matches
#[derive(Debug, Clone)]
pub enum Condition {
    /// At least one match
    Present,
    /// No match
    Absent,
    /// First match is displayed
    Visible,
    /// No match, or first match hidden or detached
    Invisible,
    /// Every match hidden or detached
    AllInvisible,
    /// First match displayed and enabled
    Clickable,
    /// First match enabled
    Enabled,
    /// First match present and disabled
    Disabled,
    /// First match selected
    Selected,
    /// First match has `name` equal to `value`
    AttributeEquals {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
    /// First match present with `name` absent or different from `value`
    AttributeNotEquals {
        /// Attribute name
        name: String,
        /// Rejected value
        value: String,
    },
    /// First match's text contains the string
    TextContains(String),
    /// No match, or first match's text lacks the string
    TextNotContains(String),
    /// First match's text matches the pattern
    TextMatches(Regex),
    /// More than `n` matches
    CountAbove(usize),
    /// Fewer than `n` matches
    CountBelow(usize),
}

impl Condition {
    /// Attribute equality
    #[must_use]
    pub fn attribute_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttributeEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute inequality
    #[must_use]
    pub fn attribute_not_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttributeNotEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Text pattern; an invalid pattern is a configuration error
    pub fn text_matches(pattern: &str) -> LocusResult<Self> {
        Regex::new(pattern)
            .map(Self::TextMatches)
            .map_err(|e| LocusError::Config {
                message: format!("invalid text pattern {pattern:?}: {e}"),
            })
    }

    /// Human-readable description for `node`
    #[must_use]
    pub fn describe(&self, node: &LocatorNode) -> String {
        format!("'{node}' {self}")
    }

    /// Evaluate once against `node`'s current matches
    pub fn evaluate<D: Driver>(&self, session: &Session<D>, node: &LocatorNode) -> LocusResult<bool> {
        let targets = session.locate_targets(node)?;
        let first = targets.first();
        let driver = session.driver();
        let locator = node.to_string();
        let lift = |e: DriverError| driver_error(e, &locator);

        match self {
            Self::Present => Ok(!targets.is_empty()),
            Self::Absent => Ok(targets.is_empty()),
            Self::Visible => match first {
                Some(h) => driver.is_displayed(h).map_err(lift),
                None => Ok(false),
            },
            Self::Invisible => match first {
                Some(h) => hidden_or_detached(driver, h).map_err(lift),
                None => Ok(true),
            },
            Self::AllInvisible => {
                for h in &targets {
                    if !hidden_or_detached(driver, h).map_err(lift)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Clickable => match first {
                Some(h) => Ok(driver.is_displayed(h).map_err(lift)?
                    && driver.is_enabled(h).map_err(lift)?),
                None => Ok(false),
            },
            Self::Enabled => match first {
                Some(h) => driver.is_enabled(h).map_err(lift),
                None => Ok(false),
            },
            Self::Disabled => match first {
                Some(h) => Ok(!driver.is_enabled(h).map_err(lift)?),
                None => Ok(false),
            },
            Self::Selected => match first {
                Some(h) => driver.is_selected(h).map_err(lift),
                None => Ok(false),
            },
            Self::AttributeEquals { name, value } => match first {
                Some(h) => Ok(driver.read_attribute(h, name).map_err(lift)?.as_deref()
                    == Some(value.as_str())),
                None => Ok(false),
            },
            Self::AttributeNotEquals { name, value } => match first {
                Some(h) => Ok(driver.read_attribute(h, name).map_err(lift)?.as_deref()
                    != Some(value.as_str())),
                None => Ok(false),
            },
            Self::TextContains(text) => match first {
                Some(h) => Ok(driver.read_text(h).map_err(lift)?.contains(text.as_str())),
                None => Ok(false),
            },
            Self::TextNotContains(text) => match first {
                Some(h) => Ok(!driver.read_text(h).map_err(lift)?.contains(text.as_str())),
                None => Ok(true),
            },
            Self::TextMatches(pattern) => match first {
                Some(h) => Ok(pattern.is_match(&driver.read_text(h).map_err(lift)?)),
                None => Ok(false),
            },
            Self::CountAbove(n) => Ok(targets.len() > *n),
            Self::CountBelow(n) => Ok(targets.len() < *n),
        }
    }
}

fn hidden_or_detached<D: Driver>(driver: &D, handle: &ElementHandle) -> Result<bool, DriverError> {
    match driver.is_displayed(handle) {
        Ok(displayed) => Ok(!displayed),
        Err(DriverError::StaleElementReference(_)) => Ok(true),
        Err(err) => Err(err),
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "to be present"),
            Self::Absent => write!(f, "to disappear"),
            Self::Visible => write!(f, "to be visible"),
            Self::Invisible => write!(f, "to be invisible"),
            Self::AllInvisible => write!(f, "to be all invisible"),
            Self::Clickable => write!(f, "to be clickable"),
            Self::Enabled => write!(f, "to be enabled"),
            Self::Disabled => write!(f, "to be disabled"),
            Self::Selected => write!(f, "to be selected"),
            Self::AttributeEquals { name, value } => {
                write!(f, "to have attribute {name} = {value:?}")
            }
            Self::AttributeNotEquals { name, value } => {
                write!(f, "to not have attribute {name} = {value:?}")
            }
            Self::TextContains(text) => write!(f, "to contain text {text:?}"),
            Self::TextNotContains(text) => write!(f, "to not contain text {text:?}"),
            Self::TextMatches(pattern) => write!(f, "to match /{pattern}/"),
            Self::CountAbove(n) => write!(f, "to match more than {n} element(s)"),
            Self::CountBelow(n) => write!(f, "to match fewer than {n} element(s)"),
        }
    }
}

// =============================================================================
// SESSION WAITS
// =============================================================================

impl<D: Driver> Session<D> {
    /// Poller with `timeout` and the configured poll interval
    #[must_use]
    pub fn poller(&self, timeout: Duration) -> Poller<'_> {
        let options =
            WaitOptions::from_config(self.config()).with_timeout(timeout.as_millis() as u64);
        Poller::new(self.clock(), options)
    }

    /// Probe: wait until `condition` holds for `node`
    pub fn wait_until(&self, node: &LocatorNode, condition: &Condition, timeout: Duration) -> bool {
        let waited_for = condition.describe(node);
        debug!("Wait for {}", waited_for);
        self.poller(timeout)
            .until(&waited_for, || condition.evaluate(self, node))
    }

    /// Wait until `condition` holds, failing with [`LocusError::Timeout`]
    pub fn wait_for(
        &self,
        node: &LocatorNode,
        condition: &Condition,
        timeout: Duration,
    ) -> LocusResult<WaitResult> {
        let waited_for = condition.describe(node);
        debug!("Wait for {}", waited_for);
        self.poller(timeout)
            .until_ok(&waited_for, || condition.evaluate(self, node))
    }

    /// Probe: resolve `node` once, then wait for that handle to detach
    pub fn wait_for_staleness(&self, node: &LocatorNode, timeout: Duration) -> bool {
        let waited_for = format!("'{node}' to become stale");
        debug!("Wait for {}", waited_for);
        let handle = match self.resolve_one(node) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(error = %err, "Cannot wait for {}", waited_for);
                return false;
            }
        };
        let locator = node.to_string();
        self.poller(timeout).until(&waited_for, || {
            self.driver()
                .is_stale(&handle)
                .map_err(|e| driver_error(e, &locator))
        })
    }

    /// Probe: snapshot the text of `node`, then wait for it to be visible
    /// with a different, non-empty text
    pub fn wait_for_text_change(&self, node: &LocatorNode, timeout: Duration) -> bool {
        let waited_for = format!("'{node}' to change its text");
        debug!("Wait for {}", waited_for);
        let before = match self.call(node, |d, h| d.read_text(h)) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "Cannot wait for {}", waited_for);
                return false;
            }
        };
        self.poller(timeout).until(&waited_for, || {
            self.call(node, |d, h| {
                if !d.is_displayed(h)? {
                    return Ok(false);
                }
                let now = d.read_text(h)?;
                Ok(!now.trim().is_empty() && now != before)
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::{MockDriver, MockElement, Mutation};
    use std::cell::Cell;
    use std::sync::Arc;

    fn fixture() -> (MockDriver, FakeClock) {
        let clock = FakeClock::new();
        let driver = MockDriver::new().with_clock(Arc::new(clock.clone()));
        (driver, clock)
    }

    fn session(driver: MockDriver, clock: &FakeClock) -> Session<MockDriver> {
        let config = LocusConfig::new().with_poll_interval(Duration::from_millis(100));
        Session::new(driver)
            .with_config(config)
            .with_clock(Arc::new(clock.clone()))
    }

    mod poller_tests {
        use super::*;

        fn poller(clock: &FakeClock, timeout_ms: u64) -> Poller<'_> {
            Poller::new(
                clock,
                WaitOptions::new()
                    .with_timeout(timeout_ms)
                    .with_poll_interval(100),
            )
        }

        #[test]
        fn test_first_evaluation_is_immediate() {
            let clock = FakeClock::new();
            let result = poller(&clock, 0).poll("now", || Ok(true)).unwrap();
            assert!(result.success);
            assert_eq!(result.evaluations, 1);
            assert_eq!(clock.sleep_count(), 0);
        }

        #[test]
        fn test_true_after_n_ticks_within_timeout() {
            let clock = FakeClock::new();
            let calls = Cell::new(0);
            let result = poller(&clock, 300)
                .poll("third tick", || {
                    calls.set(calls.get() + 1);
                    Ok(calls.get() > 3)
                })
                .unwrap();
            assert!(result.success);
            assert_eq!(result.elapsed, Duration::from_millis(300));
            assert_eq!(result.evaluations, 4);
        }

        #[test]
        fn test_times_out_without_evaluating_past_deadline() {
            let clock = FakeClock::new();
            let calls = Cell::new(0);
            let result = poller(&clock, 250)
                .poll("never", || {
                    calls.set(calls.get() + 1);
                    Ok(false)
                })
                .unwrap();
            assert!(!result.success);
            assert_eq!(calls.get(), 3);
            assert_eq!(clock.now_ms(), 200);
        }

        #[test]
        fn test_transient_errors_are_swallowed() {
            let clock = FakeClock::new();
            let result = poller(&clock, 200)
                .poll("missing", || {
                    Err(LocusError::ElementNotFound {
                        locator: "id=x".into(),
                    })
                })
                .unwrap();
            assert!(!result.success);
            assert!(result.last_error.unwrap().contains("id=x"));
        }

        #[test]
        fn test_fatal_error_aborts() {
            let clock = FakeClock::new();
            let calls = Cell::new(0);
            let err = poller(&clock, 1000)
                .poll("bad", || {
                    calls.set(calls.get() + 1);
                    Err(LocusError::PinnedHandleHasNoLocator)
                })
                .unwrap_err();
            assert!(matches!(err, LocusError::PinnedHandleHasNoLocator));
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_until_and_until_ok() {
            let clock = FakeClock::new();
            assert!(!poller(&clock, 100).until("never", || Ok(false)));
            let err = poller(&clock, 100)
                .until_ok("never", || Ok(false))
                .unwrap_err();
            match err {
                LocusError::Timeout { ms, waited_for, .. } => {
                    assert_eq!(ms, 100);
                    assert_eq!(waited_for, "never");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_zero_interval_still_advances() {
            let clock = FakeClock::new();
            let options = WaitOptions::new().with_timeout(5).with_poll_interval(0);
            let result = Poller::new(&clock, options).poll("never", || Ok(false)).unwrap();
            assert!(!result.success);
            assert_eq!(result.evaluations, 6);
        }
    }

    mod condition_tests {
        use super::*;

        #[test]
        fn test_presence_and_absence() {
            let (driver, clock) = fixture();
            let toast = driver.add_element(MockElement::new().with_attribute("id", "toast"));
            driver.schedule(Duration::from_millis(300), Mutation::Detach(toast));
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=toast").unwrap();

            assert!(session.wait_until(&node, &Condition::Present, Duration::from_secs(1)));
            assert!(session.wait_until(&node, &Condition::Absent, Duration::from_secs(1)));
            assert_eq!(clock.now_ms(), 300);
        }

        #[test]
        fn test_visibility_appears_late() {
            let (driver, clock) = fixture();
            let panel = driver.add_element(MockElement::new().with_attribute("id", "p").hidden());
            driver.schedule(Duration::from_millis(1500), Mutation::SetDisplayed(panel, true));
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=p").unwrap();

            assert!(!session.wait_until(&node, &Condition::Visible, Duration::from_secs(1)));
            assert!(session.wait_until(&node, &Condition::Visible, Duration::from_secs(1)));
        }

        #[test]
        fn test_invisible_when_missing() {
            let (driver, clock) = fixture();
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=spinner").unwrap();
            assert!(session.wait_until(&node, &Condition::Invisible, Duration::ZERO));
            assert!(session.wait_until(&node, &Condition::AllInvisible, Duration::ZERO));
            assert!(!session.wait_until(&node, &Condition::Visible, Duration::ZERO));
        }

        #[test]
        fn test_clickable_and_enabled() {
            let (driver, clock) = fixture();
            let button = driver.add_element(
                MockElement::new()
                    .with_attribute("name", "submit")
                    .disabled(),
            );
            driver.schedule(Duration::from_millis(200), Mutation::SetEnabled(button, true));
            let session = session(driver, &clock);
            let node = LocatorNode::new("name=submit").unwrap();

            assert!(session.wait_until(&node, &Condition::Disabled, Duration::ZERO));
            assert!(session.wait_until(&node, &Condition::Clickable, Duration::from_secs(1)));
            assert!(session.wait_until(&node, &Condition::Enabled, Duration::ZERO));
        }

        #[test]
        fn test_attribute_and_text() {
            let (driver, clock) = fixture();
            let status = driver.add_element(
                MockElement::new()
                    .with_attribute("id", "status")
                    .with_attribute("data-state", "loading")
                    .with_text("Loading..."),
            );
            driver.schedule(
                Duration::from_millis(400),
                Mutation::SetAttribute(status.clone(), "data-state".into(), "done".into()),
            );
            driver.schedule(
                Duration::from_millis(400),
                Mutation::SetText(status, "Loaded 42 rows".into()),
            );
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=status").unwrap();
            let timeout = Duration::from_secs(1);

            assert!(session.wait_until(
                &node,
                &Condition::attribute_not_equals("data-state", "done"),
                Duration::ZERO
            ));
            assert!(session.wait_until(
                &node,
                &Condition::attribute_equals("data-state", "done"),
                timeout
            ));
            assert!(session.wait_until(&node, &Condition::TextContains("Loaded".into()), timeout));
            assert!(session.wait_until(
                &node,
                &Condition::TextNotContains("Loading".into()),
                timeout
            ));
            let pattern = Condition::text_matches(r"^Loaded \d+ rows$").unwrap();
            assert!(session.wait_until(&node, &pattern, timeout));
        }

        #[test]
        fn test_counts() {
            let (driver, clock) = fixture();
            let rows: Vec<_> = (0..3).map(|_| driver.add_element(MockElement::new())).collect();
            driver.when("//tr").returns(&rows);
            let session = session(driver, &clock);
            let node = LocatorNode::new("//tr").unwrap();

            assert!(session.wait_until(&node, &Condition::CountAbove(2), Duration::ZERO));
            assert!(!session.wait_until(&node, &Condition::CountAbove(3), Duration::ZERO));
            assert!(session.wait_until(&node, &Condition::CountBelow(4), Duration::ZERO));
        }

        #[test]
        fn test_selected() {
            let (driver, clock) = fixture();
            let _ = driver.add_element(MockElement::new().with_attribute("id", "agree").selected());
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=agree").unwrap();
            assert!(session.wait_until(&node, &Condition::Selected, Duration::ZERO));
        }

        #[test]
        fn test_invalid_pattern_is_config_error() {
            assert!(matches!(
                Condition::text_matches("("),
                Err(LocusError::Config { .. })
            ));
        }

        #[test]
        fn test_description() {
            let node = LocatorNode::new("css=.save").unwrap();
            assert_eq!(
                Condition::Clickable.describe(&node),
                "'css=.save' to be clickable"
            );
        }
    }

    mod session_wait_tests {
        use super::*;

        #[test]
        fn test_wait_for_reports_timeout_cause() {
            let (driver, clock) = fixture();
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=ghost").unwrap().child("id=inner").unwrap();
            let err = session
                .wait_for(&node, &Condition::Visible, Duration::from_millis(300))
                .unwrap_err();
            assert!(matches!(err, LocusError::Timeout { ms: 300, .. }));
        }

        #[test]
        fn test_mixed_chain_waits_use_scoped_resolution() {
            let (driver, clock) = fixture();
            let panel = driver.add_element(MockElement::new());
            let _label = driver.add_child(&panel, MockElement::new().with_attribute("id", "l"));
            driver.when("css=.panel").returns(&[panel]);
            let session = session(driver, &clock);

            let node = LocatorNode::new("css=.panel").unwrap().child("id=l").unwrap();
            assert!(session.wait_until(&node, &Condition::Visible, Duration::ZERO));
        }

        #[test]
        fn test_wait_for_staleness() {
            let (driver, clock) = fixture();
            let row = driver.add_element(MockElement::new().with_attribute("id", "row"));
            driver.schedule(Duration::from_millis(500), Mutation::Detach(row));
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=row").unwrap();

            assert!(!session.wait_for_staleness(&node, Duration::from_millis(200)));
            assert!(session.wait_for_staleness(&node, Duration::from_secs(1)));
        }

        #[test]
        fn test_wait_for_staleness_without_element() {
            let (driver, clock) = fixture();
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=none").unwrap();
            assert!(!session.wait_for_staleness(&node, Duration::from_secs(1)));
        }

        #[test]
        fn test_wait_for_text_change() {
            let (driver, clock) = fixture();
            let total = driver.add_element(
                MockElement::new()
                    .with_attribute("id", "total")
                    .with_text("0"),
            );
            driver.schedule(Duration::from_millis(200), Mutation::SetText(total.clone(), String::new()));
            driver.schedule(Duration::from_millis(600), Mutation::SetText(total, "12".into()));
            let session = session(driver, &clock);
            let node = LocatorNode::new("id=total").unwrap();

            assert!(session.wait_for_text_change(&node, Duration::from_secs(1)));
            assert_eq!(clock.now_ms(), 600);
        }
    }
}
