//! Scroll-search: find an element that is only rendered once scrolled to.
//!
//! ```text
//!             found
//!   Searching ─────► Found
//!       │
//!       │ not found, already at bottom
//!       ▼
//!   ExhaustedAtBottom
//! ```
//!
//! Each [`ScrollSearch::tick`] re-resolves the target. When it is still
//! missing the window scrolls to `viewport_height × attempt`, clamped to the
//! document height read when the search started. The tick that clamps marks
//! the search as at the bottom; the next miss ends it.

use std::time::Duration;

use tracing::{debug, info};

use crate::driver::{Driver, ElementHandle};
use crate::node::LocatorNode;
use crate::result::{LocusError, LocusResult};
use crate::session::{driver_error, Session};

/// Scroll-search state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollState {
    /// Still scrolling
    Searching,
    /// Target resolved
    Found(ElementHandle),
    /// Bottom reached without resolving the target
    ExhaustedAtBottom,
}

/// One scroll-search run over a session
#[derive(Debug)]
pub struct ScrollSearch<'s, D: Driver> {
    session: &'s Session<D>,
    node: LocatorNode,
    scroll_height: u32,
    attempt: u32,
    offset: u32,
    at_bottom: bool,
    state: ScrollState,
}

impl<'s, D: Driver> ScrollSearch<'s, D> {
    /// Start a search, reading the document height once
    pub fn start(session: &'s Session<D>, node: &LocatorNode) -> LocusResult<Self> {
        let scroll_height = session
            .driver()
            .document_scroll_height()
            .map_err(|e| driver_error(e, &node.to_string()))?;
        debug!(locator = %node, scroll_height, "Start scroll search");
        Ok(Self {
            session,
            node: node.clone(),
            scroll_height,
            attempt: 0,
            offset: 0,
            at_bottom: false,
            state: ScrollState::Searching,
        })
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &ScrollState {
        &self.state
    }

    /// Scroll steps issued so far
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Document height the offsets are clamped to
    #[must_use]
    pub const fn scroll_height(&self) -> u32 {
        self.scroll_height
    }

    /// Last offset scrolled to
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Advance the search by one step.
    ///
    /// Ending at the bottom is [`LocusError::ScrollSearchExhausted`]; further
    /// calls after a terminal state return it unchanged.
    pub fn tick(&mut self) -> LocusResult<&ScrollState> {
        match &self.state {
            ScrollState::Searching => {}
            ScrollState::Found(_) => return Ok(&self.state),
            ScrollState::ExhaustedAtBottom => return Err(self.exhausted()),
        }

        match self.session.resolve_one(&self.node) {
            Ok(handle) => {
                debug!(locator = %self.node, attempt = self.attempt, "Scroll search found target");
                self.state = ScrollState::Found(handle);
                return Ok(&self.state);
            }
            Err(err) if err.is_transient() => {}
            Err(err) => return Err(err),
        }

        if self.at_bottom {
            self.state = ScrollState::ExhaustedAtBottom;
            return Err(self.exhausted());
        }

        let locator = self.node.to_string();
        let viewport = self
            .session
            .driver()
            .viewport_height()
            .map_err(|e| driver_error(e, &locator))?
            .max(1);
        self.attempt += 1;
        let mut offset = viewport.saturating_mul(self.attempt);
        if offset >= self.scroll_height {
            offset = self.scroll_height;
            self.at_bottom = true;
        }
        info!(locator = %self.node, offset, attempt = self.attempt, "Scroll down");
        self.session
            .driver()
            .scroll_to(offset)
            .map_err(|e| driver_error(e, &locator))?;
        self.offset = offset;
        Ok(&self.state)
    }

    /// Tick until found, exhausted, or `timeout` elapses
    pub fn run(mut self, timeout: Duration) -> LocusResult<ElementHandle> {
        let waited_for = format!("'{}' to be found by scrolling", self.node);
        let session = self.session;
        let _ = session.poller(timeout).until_ok(&waited_for, || {
            Ok(matches!(self.tick()?, ScrollState::Found(_)))
        })?;
        match std::mem::replace(&mut self.state, ScrollState::Searching) {
            ScrollState::Found(handle) => Ok(handle),
            _ => Err(self.exhausted()),
        }
    }

    fn exhausted(&self) -> LocusError {
        LocusError::ScrollSearchExhausted {
            locator: self.node.to_string(),
            scroll_height: self.scroll_height,
        }
    }
}

impl<D: Driver> Session<D> {
    /// Scroll down until `node` resolves, within `timeout`
    pub fn scroll_search(&self, node: &LocatorNode, timeout: Duration) -> LocusResult<ElementHandle> {
        ScrollSearch::start(self, node)?.run(timeout)
    }
}
