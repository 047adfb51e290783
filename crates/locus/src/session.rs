//! Element handle resolution bound to an explicit session.
//!
//! A [`Session`] owns one driver, its configuration and the clock every
//! sleep goes through. Handles are resolved on demand and never cached:
//! each call walks the node's parent chain from the root, scoping each
//! lookup to the handle found one level up.
//!
//! # Staleness
//!
//! A handle can detach between the moment it is found and the moment it is
//! used. Any operation run through [`Session::retry_if_stale`] is retried
//! from a fresh root-to-leaf resolution when that happens, up to the
//! configured [`StaleRetryPolicy`].

use std::sync::Arc;

use tracing::{debug, error};

use crate::clock::{Clock, SystemClock};
use crate::config::{LocusConfig, StaleRetryPolicy};
use crate::driver::{Driver, DriverError, DriverResult, ElementHandle};
use crate::locator::{ParsedLocator, Strategy};
use crate::node::LocatorNode;
use crate::result::{LocusError, LocusResult};

/// Default child query for [`Session::children`]
pub const DEFAULT_CHILD_XPATH: &str = "./*";

/// Convert a driver failure into an engine error naming `locator`
#[must_use]
pub fn driver_error(err: DriverError, locator: &str) -> LocusError {
    match err {
        DriverError::NoSuchElement => LocusError::ElementNotFound {
            locator: locator.to_string(),
        },
        DriverError::StaleElementReference(_) => LocusError::StaleElement {
            locator: locator.to_string(),
        },
        DriverError::Command(message) => LocusError::Driver { message },
    }
}

/// Driver + configuration + clock for one browser session
#[derive(Debug)]
pub struct Session<D: Driver> {
    driver: D,
    config: LocusConfig,
    clock: Arc<dyn Clock>,
}

impl<D: Driver> Session<D> {
    /// Session with default configuration and the system clock
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            config: LocusConfig::default(),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: LocusConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &LocusConfig {
        &self.config
    }

    /// Clock used for polling and backoff
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // =========================================================================
    // SINGLE ELEMENT
    // =========================================================================

    /// First element matching `node`, with the configured stale-retry policy
    pub fn resolve_one(&self, node: &LocatorNode) -> LocusResult<ElementHandle> {
        self.resolve_one_with(node, &self.config.stale_retry)
    }

    /// First element matching `node`, with an explicit stale-retry policy
    pub fn resolve_one_with(
        &self,
        node: &LocatorNode,
        policy: &StaleRetryPolicy,
    ) -> LocusResult<ElementHandle> {
        self.retry_if_stale(node, policy, |handle| Ok(handle.clone()))
    }

    /// Resolve `node` and run `op` on the handle.
    ///
    /// A [`LocusError::StaleElement`] from either step restarts the whole
    /// cycle after the policy's backoff. Once the attempts are spent the
    /// result is [`LocusError::StaleElementRetriesExhausted`]. A chain with a
    /// pinned node cannot be re-resolved, so its staleness is final on the
    /// first attempt.
    pub fn retry_if_stale<T, F>(
        &self,
        node: &LocatorNode,
        policy: &StaleRetryPolicy,
        mut op: F,
    ) -> LocusResult<T>
    where
        F: FnMut(&ElementHandle) -> LocusResult<T>,
    {
        self.with_stale_retry(node, policy, retry_limit(node, policy), || {
            let handle = self.resolve_once(node)?;
            op(&handle)
        })
    }

    /// Run a driver primitive against `node`'s element with stale recovery
    pub fn call<T, F>(&self, node: &LocatorNode, mut op: F) -> LocusResult<T>
    where
        F: FnMut(&D, &ElementHandle) -> DriverResult<T>,
    {
        let locator = node.to_string();
        self.retry_if_stale(node, &self.config.stale_retry, |handle| {
            op(&self.driver, handle).map_err(|e| driver_error(e, &locator))
        })
    }

    fn with_stale_retry<T>(
        &self,
        node: &LocatorNode,
        policy: &StaleRetryPolicy,
        limit: u32,
        mut attempt_fn: impl FnMut() -> LocusResult<T>,
    ) -> LocusResult<T> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match attempt_fn() {
                Err(err) if err.is_stale() && attempt < limit => {
                    error!(
                        locator = %node,
                        attempt,
                        "Stale element reference, resolving again"
                    );
                    self.clock.sleep(policy.backoff.delay(attempt));
                }
                Err(err) if err.is_stale() => {
                    return Err(LocusError::StaleElementRetriesExhausted {
                        locator: node.to_string(),
                        attempts: attempt,
                    });
                }
                other => return other,
            }
        }
    }

    /// One root-to-leaf resolution, no retry
    fn resolve_once(&self, node: &LocatorNode) -> LocusResult<ElementHandle> {
        if let Some(handle) = node.pinned_handle() {
            return Ok(handle);
        }
        let scope = node.parent().map(|p| self.resolve_once(p)).transpose()?;
        let locator = current_locator(node)?;
        self.driver
            .find_one(&locator, scope.as_ref())
            .map_err(|e| driver_error(e, &node.to_string()))
    }

    // =========================================================================
    // MANY ELEMENTS
    // =========================================================================

    /// Every element matching `node`, in document order.
    ///
    /// No match is an empty list, as is a parent chain that cannot be
    /// resolved.
    pub fn resolve_all(&self, node: &LocatorNode) -> LocusResult<Vec<ElementHandle>> {
        let policy = &self.config.stale_retry;
        self.with_stale_retry(node, policy, retry_limit(node, policy), || {
            self.resolve_all_once(node)
        })
    }

    fn resolve_all_once(&self, node: &LocatorNode) -> LocusResult<Vec<ElementHandle>> {
        if let Some(handle) = node.pinned_handle() {
            return Ok(vec![handle]);
        }
        let scope = match node.parent().map(|p| self.resolve_once(p)).transpose() {
            Ok(scope) => scope,
            Err(LocusError::ElementNotFound { .. }) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let locator = current_locator(node)?;
        self.driver
            .find_all(&locator, scope.as_ref())
            .map_err(|e| driver_error(e, &node.to_string()))
    }

    /// Every current match as a node pinned to its handle
    pub fn resolve_nodes(&self, node: &LocatorNode) -> LocusResult<Vec<LocatorNode>> {
        Ok(self
            .resolve_all(node)?
            .into_iter()
            .map(LocatorNode::pinned)
            .collect())
    }

    /// First element matching the xpath `expression` inside `node`'s element
    pub fn child_handle(&self, node: &LocatorNode, expression: &str) -> LocusResult<ElementHandle> {
        let child = ParsedLocator::new(Strategy::XPath, expression);
        let locator = format!("{node} >> {child}");
        self.retry_if_stale(node, &self.config.stale_retry, |scope| {
            self.driver
                .find_one(&child, Some(scope))
                .map_err(|e| driver_error(e, &locator))
        })
    }

    /// All elements matching the xpath `expression` inside `node`'s element
    pub fn child_handles(
        &self,
        node: &LocatorNode,
        expression: &str,
    ) -> LocusResult<Vec<ElementHandle>> {
        let child = ParsedLocator::new(Strategy::XPath, expression);
        let locator = format!("{node} >> {child}");
        self.retry_if_stale(node, &self.config.stale_retry, |scope| {
            self.driver
                .find_all(&child, Some(scope))
                .map_err(|e| driver_error(e, &locator))
        })
    }

    /// Direct children of `node`'s element
    pub fn children(&self, node: &LocatorNode) -> LocusResult<Vec<ElementHandle>> {
        self.child_handles(node, DEFAULT_CHILD_XPATH)
    }

    /// Elements a wait condition is evaluated against.
    ///
    /// Uses the node's full locator as one document-wide query when the
    /// chain composes; falls back to scoped resolution for mixed css/xpath
    /// chains and chains under a pinned node.
    pub fn locate_targets(&self, node: &LocatorNode) -> LocusResult<Vec<ElementHandle>> {
        if let Some(handle) = node.pinned_handle() {
            return Ok(vec![handle]);
        }
        match node.full_locator() {
            Ok(full) => self
                .driver
                .find_all(&full, None)
                .map_err(|e| driver_error(e, &full.to_string())),
            Err(
                err @ (LocusError::MixedStrategyCompositionError { .. }
                | LocusError::PinnedHandleHasNoLocator),
            ) => {
                debug!(locator = %node, reason = %err, "Falling back to scoped resolution");
                self.resolve_all(node)
            }
            Err(err) => Err(err),
        }
    }
}

/// Attempts allowed for `node`.
///
/// A pinned handle anywhere in the chain cannot be re-resolved, so the
/// first stale result is final.
fn retry_limit(node: &LocatorNode, policy: &StaleRetryPolicy) -> u32 {
    if node.chain().iter().any(LocatorNode::is_pinned) {
        1
    } else {
        policy.max_attempts()
    }
}

fn current_locator(node: &LocatorNode) -> LocusResult<ParsedLocator> {
    node.locator().ok_or(LocusError::PinnedHandleHasNoLocator)
}
