//! Element capabilities over a session.
//!
//! [`Element`] pairs a [`LocatorNode`] with the [`Session`] that resolves it.
//! Behaviour is split into capability traits so a page object can expose a
//! wrapper type with only the capabilities its element actually has:
//!
//! | Trait            | Operations                                          |
//! |------------------|-----------------------------------------------------|
//! | [`Control`]      | `exists`, `is_displayed`, `is_enabled`, `is_selected` |
//! | [`TextReadable`] | `text`, `attribute`, `class_name`, `css_value`, `set_attribute` |
//! | [`Clickable`]    | `click`, `click_at`, `script_click`, `double_click`, `hover`, `drag_to`, `send_keys`, ... |
//! | [`Scrollable`]   | `scroll_into_view`, `scroll_to_find`                |
//!
//! `Control` probes answer immediately and never fail. The other traits
//! return real data, so their errors are logged and propagated.

use std::time::Duration;

use tracing::{debug, error};

use crate::driver::{Driver, ElementHandle};
use crate::node::LocatorNode;
use crate::result::{LocusError, LocusResult};
use crate::session::{driver_error, Session};
use crate::wait::Condition;

fn reported<T>(node: &LocatorNode, action: &str, result: LocusResult<T>) -> LocusResult<T> {
    if let Err(err) = &result {
        error!(locator = %node, error = %err, "{} failed", action);
    }
    result
}

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================

/// Access to the element's session and node, plus immediate state probes
pub trait Control {
    /// Driver behind the session
    type Driver: Driver;

    /// Session resolving this element
    fn session(&self) -> &Session<Self::Driver>;

    /// Declared node
    fn node(&self) -> &LocatorNode;

    /// At least one element currently matches
    fn exists(&self) -> bool {
        match self.session().locate_targets(self.node()) {
            Ok(targets) => !targets.is_empty(),
            Err(err) => {
                debug!(locator = %self.node(), error = %err, "Existence check failed");
                false
            }
        }
    }

    /// Element is rendered
    fn is_displayed(&self) -> bool {
        probe(self, "is_displayed", |d, h| d.is_displayed(h))
    }

    /// Element accepts interaction
    fn is_enabled(&self) -> bool {
        probe(self, "is_enabled", |d, h| d.is_enabled(h))
    }

    /// Checkbox, radio or option is selected
    fn is_selected(&self) -> bool {
        probe(self, "is_selected", |d, h| d.is_selected(h))
    }
}

fn probe<C, F>(control: &C, what: &str, op: F) -> bool
where
    C: Control + ?Sized,
    F: FnMut(&C::Driver, &ElementHandle) -> crate::driver::DriverResult<bool>,
{
    match control.session().call(control.node(), op) {
        Ok(value) => value,
        Err(err) => {
            debug!(locator = %control.node(), error = %err, "{} probe failed", what);
            false
        }
    }
}

/// Text, attributes and computed style
pub trait TextReadable: Control {
    /// Visible text; when empty, the `value` then `innerText` attribute
    fn text(&self) -> LocusResult<String> {
        debug!(locator = %self.node(), "Get text");
        let result = self.session().call(self.node(), |d, h| {
            let text = d.read_text(h)?;
            if !text.trim().is_empty() {
                return Ok(text);
            }
            for fallback in ["value", "innerText"] {
                if let Some(value) = d.read_attribute(h, fallback)? {
                    if !value.trim().is_empty() {
                        return Ok(value);
                    }
                }
            }
            Ok(text)
        });
        reported(self.node(), "Get text", result)
    }

    /// Attribute value, `None` when absent
    fn attribute(&self, name: &str) -> LocusResult<Option<String>> {
        debug!(locator = %self.node(), attribute = name, "Get attribute");
        let result = self
            .session()
            .call(self.node(), |d, h| d.read_attribute(h, name));
        reported(self.node(), "Get attribute", result)
    }

    /// `class` attribute
    fn class_name(&self) -> LocusResult<Option<String>> {
        self.attribute("class")
    }

    /// Computed value of css property `name`
    fn css_value(&self, name: &str) -> LocusResult<String> {
        debug!(locator = %self.node(), property = name, "Get css value");
        let result = self
            .session()
            .call(self.node(), |d, h| d.read_css_value(h, name));
        reported(self.node(), "Get css value", result)
    }

    /// Overwrite attribute `name` through a script
    fn set_attribute(&self, name: &str, value: &str) -> LocusResult<()> {
        debug!(locator = %self.node(), attribute = name, "Set attribute");
        let result = self
            .session()
            .call(self.node(), |d, h| d.set_attribute(h, name, value));
        reported(self.node(), "Set attribute", result)
    }
}

/// Pointer and keyboard interaction
pub trait Clickable: Control {
    /// Scroll the element into view, then click it
    fn click(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Click");
        let result = self.session().call(self.node(), |d, h| {
            d.scroll_into_view(h)?;
            d.click(h)
        });
        reported(self.node(), "Click", result)
    }

    /// Click without scrolling first
    fn click_without_scroll(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Click without scroll");
        let result = self.session().call(self.node(), |d, h| d.click(h));
        reported(self.node(), "Click", result)
    }

    /// Click at an `(x, y)` pixel offset from the element's centre
    fn click_at(&self, x: i32, y: i32) -> LocusResult<()> {
        debug!(locator = %self.node(), x, y, "Click at offset");
        let result = self.session().call(self.node(), |d, h| d.click_at(h, x, y));
        reported(self.node(), "Click at offset", result)
    }

    /// Click through a script, for elements covered by an overlay
    fn script_click(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Script click");
        let result = self.session().call(self.node(), |d, h| d.script_click(h));
        reported(self.node(), "Script click", result)
    }

    /// Scroll the element into view, then double-click it
    fn double_click(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Double click");
        let result = self.session().call(self.node(), |d, h| {
            d.scroll_into_view(h)?;
            d.double_click(h)
        });
        reported(self.node(), "Double click", result)
    }

    /// Move the pointer over the element
    fn hover(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Hover");
        let result = self.session().call(self.node(), |d, h| d.hover(h));
        reported(self.node(), "Hover", result)
    }

    /// Give the element keyboard focus
    fn focus(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Focus");
        let result = self.session().call(self.node(), |d, h| d.focus(h));
        reported(self.node(), "Focus", result)
    }

    /// Submit the element's form
    fn submit(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Submit");
        let result = self.session().call(self.node(), |d, h| d.submit(h));
        reported(self.node(), "Submit", result)
    }

    /// Drag the element onto `target`.
    ///
    /// Both ends are resolved on every attempt, so either one going stale
    /// restarts the drag.
    fn drag_to<T>(&self, target: &T) -> LocusResult<()>
    where
        Self: Sized,
        T: Control<Driver = Self::Driver>,
    {
        debug!(locator = %self.node(), target = %target.node(), "Drag to");
        let session = self.session();
        let locator = format!("{} -> {}", self.node(), target.node());
        let result = session.retry_if_stale(self.node(), &session.config().stale_retry, |h| {
            let to = session.resolve_one(target.node())?;
            session
                .driver()
                .drag_to(h, &to)
                .map_err(|e| driver_error(e, &locator))
        });
        reported(self.node(), "Drag to", result)
    }

    /// Drag the element by `(dx, dy)` pixels
    fn drag_by(&self, dx: i32, dy: i32) -> LocusResult<()> {
        debug!(locator = %self.node(), dx, dy, "Drag by offset");
        let result = self.session().call(self.node(), |d, h| d.drag_by(h, dx, dy));
        reported(self.node(), "Drag by offset", result)
    }

    /// Click until the element disappears, at most `attempts` times.
    ///
    /// After each click the element gets the minimum element timeout to go
    /// away. A click that fails because the element is already gone counts
    /// as success.
    fn click_until_gone(&self, attempts: u32) -> LocusResult<()> {
        let session = self.session();
        let wait = session.config().timeouts.minimum_element();
        for attempt in 1..=attempts {
            debug!(locator = %self.node(), attempt, "Click until gone");
            if let Err(err) = self.click() {
                if !self.exists() {
                    return Ok(());
                }
                return Err(err);
            }
            if session.wait_until(self.node(), &Condition::Absent, wait) {
                return Ok(());
            }
        }
        let err = LocusError::Timeout {
            ms: u64::try_from(wait.as_millis())
                .unwrap_or(u64::MAX)
                .saturating_mul(u64::from(attempts)),
            waited_for: format!("'{}' to disappear after {attempts} click(s)", self.node()),
            cause: None,
        };
        reported(self.node(), "Click until gone", Err(err))
    }

    /// Type `text` into the element
    fn send_keys(&self, text: &str) -> LocusResult<()> {
        debug!(locator = %self.node(), "Send keys");
        let result = self.session().call(self.node(), |d, h| d.send_input(h, text));
        reported(self.node(), "Send keys", result)
    }
}

/// Bringing the element on screen
pub trait Scrollable: Control {
    /// Scroll the element to the middle of the viewport
    fn scroll_into_view(&self) -> LocusResult<()> {
        debug!(locator = %self.node(), "Scroll into view");
        let result = self
            .session()
            .call(self.node(), |d, h| d.scroll_into_view(h));
        reported(self.node(), "Scroll into view", result)
    }

    /// Scroll down until the element resolves, then into view
    fn scroll_to_find(&self) -> LocusResult<ElementHandle> {
        let session = self.session();
        let timeout = session.config().timeouts.scroll_search();
        let result = session.scroll_search(self.node(), timeout).and_then(|handle| {
            session
                .driver()
                .scroll_into_view(&handle)
                .map_err(|e| driver_error(e, &self.node().to_string()))?;
            Ok(handle)
        });
        reported(self.node(), "Scroll to find", result)
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// A declared node bound to the session that resolves it
#[derive(Debug)]
pub struct Element<'s, D: Driver> {
    session: &'s Session<D>,
    node: LocatorNode,
}

impl<D: Driver> Clone for Element<'_, D> {
    fn clone(&self) -> Self {
        Self {
            session: self.session,
            node: self.node.clone(),
        }
    }
}

impl<D: Driver> Control for Element<'_, D> {
    type Driver = D;

    fn session(&self) -> &Session<D> {
        self.session
    }

    fn node(&self) -> &LocatorNode {
        &self.node
    }
}

impl<D: Driver> TextReadable for Element<'_, D> {}
impl<D: Driver> Clickable for Element<'_, D> {}
impl<D: Driver> Scrollable for Element<'_, D> {}

impl<'s, D: Driver> Element<'s, D> {
    /// Bind `node` to `session`
    #[must_use]
    pub const fn new(session: &'s Session<D>, node: LocatorNode) -> Self {
        Self { session, node }
    }

    /// Element for a prefixed locator string
    pub fn locate(session: &'s Session<D>, locator: &str) -> LocusResult<Self> {
        Ok(Self::new(session, LocatorNode::new(locator)?))
    }

    /// Child element scoped under this one
    pub fn child(&self, locator: &str) -> LocusResult<Self> {
        Ok(Self::new(self.session, self.node.child(locator)?))
    }

    /// Retarget a templated element
    pub fn bind(&self, args: &[&dyn std::fmt::Display]) -> LocusResult<&Self> {
        self.node.bind(args)?;
        Ok(self)
    }

    /// Every current match as its own pinned element
    pub fn all(&self) -> LocusResult<Vec<Self>> {
        Ok(self
            .session
            .resolve_nodes(&self.node)?
            .into_iter()
            .map(|node| Self::new(self.session, node))
            .collect())
    }

    /// Number of current matches
    pub fn count(&self) -> LocusResult<usize> {
        Ok(self.session.locate_targets(&self.node)?.len())
    }

    fn default_timeout(&self) -> Duration {
        self.session.config().timeouts.default_wait()
    }

    fn probe_within(&self, condition: &Condition, timeout: Duration) -> bool {
        self.session.wait_until(&self.node, condition, timeout)
    }

    // =========================================================================
    // NAMED WAITS
    // =========================================================================

    /// Wait for at least one match
    pub fn wait_for_presence(&self) -> bool {
        self.wait_for_presence_within(self.default_timeout())
    }

    /// [`Self::wait_for_presence`] with an explicit timeout
    pub fn wait_for_presence_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Present, timeout)
    }

    /// Wait for no match
    pub fn wait_for_disappear(&self) -> bool {
        self.wait_for_disappear_within(self.default_timeout())
    }

    /// [`Self::wait_for_disappear`] with an explicit timeout
    pub fn wait_for_disappear_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Absent, timeout)
    }

    /// Wait for the element to be displayed
    pub fn wait_for_visibility(&self) -> bool {
        self.wait_for_visibility_within(self.default_timeout())
    }

    /// [`Self::wait_for_visibility`] with an explicit timeout
    pub fn wait_for_visibility_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Visible, timeout)
    }

    /// Wait for the element to be hidden or gone
    pub fn wait_for_invisibility(&self) -> bool {
        self.wait_for_invisibility_within(self.default_timeout())
    }

    /// [`Self::wait_for_invisibility`] with an explicit timeout
    pub fn wait_for_invisibility_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Invisible, timeout)
    }

    /// Wait for every match to be hidden or gone
    pub fn wait_for_all_invisibility(&self) -> bool {
        self.wait_for_all_invisibility_within(self.default_timeout())
    }

    /// [`Self::wait_for_all_invisibility`] with an explicit timeout
    pub fn wait_for_all_invisibility_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::AllInvisible, timeout)
    }

    /// Wait for the element to be displayed and enabled
    pub fn wait_for_clickable(&self) -> bool {
        self.wait_for_clickable_within(self.default_timeout())
    }

    /// [`Self::wait_for_clickable`] with an explicit timeout
    pub fn wait_for_clickable_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Clickable, timeout)
    }

    /// Wait for the element to be enabled
    pub fn wait_for_enabled(&self) -> bool {
        self.wait_for_enabled_within(self.default_timeout())
    }

    /// [`Self::wait_for_enabled`] with an explicit timeout
    pub fn wait_for_enabled_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Enabled, timeout)
    }

    /// Wait for the element to be disabled
    pub fn wait_for_disabled(&self) -> bool {
        self.wait_for_disabled_within(self.default_timeout())
    }

    /// [`Self::wait_for_disabled`] with an explicit timeout
    pub fn wait_for_disabled_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Disabled, timeout)
    }

    /// Wait for the element to be selected
    pub fn wait_for_selected(&self) -> bool {
        self.wait_for_selected_within(self.default_timeout())
    }

    /// [`Self::wait_for_selected`] with an explicit timeout
    pub fn wait_for_selected_within(&self, timeout: Duration) -> bool {
        self.probe_within(&Condition::Selected, timeout)
    }

    /// Wait for the text to contain `text`
    pub fn wait_for_text_present(&self, text: &str) -> bool {
        self.wait_for_text_present_within(text, self.default_timeout())
    }

    /// [`Self::wait_for_text_present`] with an explicit timeout
    pub fn wait_for_text_present_within(&self, text: &str, timeout: Duration) -> bool {
        self.probe_within(&Condition::TextContains(text.to_string()), timeout)
    }

    /// Wait for the text to stop containing `text`
    pub fn wait_for_text_not_present(&self, text: &str) -> bool {
        self.wait_for_text_not_present_within(text, self.default_timeout())
    }

    /// [`Self::wait_for_text_not_present`] with an explicit timeout
    pub fn wait_for_text_not_present_within(&self, text: &str, timeout: Duration) -> bool {
        self.probe_within(&Condition::TextNotContains(text.to_string()), timeout)
    }

    /// Wait for the text to match `pattern`; an invalid pattern is an error
    pub fn wait_for_text_match(&self, pattern: &str) -> LocusResult<bool> {
        self.wait_for_text_match_within(pattern, self.default_timeout())
    }

    /// [`Self::wait_for_text_match`] with an explicit timeout
    pub fn wait_for_text_match_within(&self, pattern: &str, timeout: Duration) -> LocusResult<bool> {
        let condition = Condition::text_matches(pattern)?;
        Ok(self.probe_within(&condition, timeout))
    }

    /// Wait up to the low timeout for the text to change to a different,
    /// non-empty value
    pub fn wait_for_text_change(&self) -> bool {
        self.wait_for_text_change_within(self.session.config().timeouts.low())
    }

    /// [`Self::wait_for_text_change`] with an explicit timeout
    pub fn wait_for_text_change_within(&self, timeout: Duration) -> bool {
        self.session.wait_for_text_change(&self.node, timeout)
    }

    /// Wait for attribute `name` to equal `value`
    pub fn wait_for_attribute_value(&self, name: &str, value: &str) -> bool {
        self.wait_for_attribute_value_within(name, value, self.default_timeout())
    }

    /// [`Self::wait_for_attribute_value`] with an explicit timeout
    pub fn wait_for_attribute_value_within(&self, name: &str, value: &str, timeout: Duration) -> bool {
        self.probe_within(&Condition::attribute_equals(name, value), timeout)
    }

    /// Wait for attribute `name` to differ from `value`
    pub fn wait_for_attribute_not_value(&self, name: &str, value: &str) -> bool {
        self.wait_for_attribute_not_value_within(name, value, self.default_timeout())
    }

    /// [`Self::wait_for_attribute_not_value`] with an explicit timeout
    pub fn wait_for_attribute_not_value_within(
        &self,
        name: &str,
        value: &str,
        timeout: Duration,
    ) -> bool {
        self.probe_within(&Condition::attribute_not_equals(name, value), timeout)
    }

    /// Wait for more than `n` matches
    pub fn wait_for_count_above(&self, n: usize) -> bool {
        self.wait_for_count_above_within(n, self.default_timeout())
    }

    /// [`Self::wait_for_count_above`] with an explicit timeout
    pub fn wait_for_count_above_within(&self, n: usize, timeout: Duration) -> bool {
        self.probe_within(&Condition::CountAbove(n), timeout)
    }

    /// Wait for fewer than `n` matches
    pub fn wait_for_count_below(&self, n: usize) -> bool {
        self.wait_for_count_below_within(n, self.default_timeout())
    }

    /// [`Self::wait_for_count_below`] with an explicit timeout
    pub fn wait_for_count_below_within(&self, n: usize, timeout: Duration) -> bool {
        self.probe_within(&Condition::CountBelow(n), timeout)
    }

    /// Wait for the current handle to detach
    pub fn wait_for_staleness(&self) -> bool {
        self.wait_for_staleness_within(self.default_timeout())
    }

    /// [`Self::wait_for_staleness`] with an explicit timeout
    pub fn wait_for_staleness_within(&self, timeout: Duration) -> bool {
        self.session.wait_for_staleness(&self.node, timeout)
    }
}
