//! Scripted synthetic DOM implementing [`Driver`].
//!
//! Used by the engine's own tests and by downstream page-object tests that
//! need a browser-shaped collaborator without a browser.
//!
//! Elements are registered with [`MockDriver::add_element`]. Lookups are
//! answered by scripted rules first ([`MockDriver::when`]), then by a
//! structural fallback for the attribute and text strategies:
//!
//! ```ignore
//! let driver = MockDriver::new();
//! let row = driver.add_element(MockElement::new().with_text("Total"));
//! driver.when("//tr[@data-row]").returns(&[row.clone()]);
//! let save = driver.add_element(MockElement::new().with_attribute("id", "save"));
//! // `id=save` now resolves to `save` without a rule.
//! ```
//!
//! Time-dependent DOM changes are scheduled against a [`Clock`] with
//! [`MockDriver::schedule`] and applied lazily whenever the driver is used.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::driver::{Driver, DriverError, DriverResult, ElementHandle};
use crate::locator::{ParsedLocator, Strategy};

// =============================================================================
// ELEMENTS
// =============================================================================

/// Description of a synthetic element
#[derive(Debug, Clone)]
pub struct MockElement {
    tag: String,
    text: String,
    attributes: HashMap<String, String>,
    css: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    selected: bool,
    revealed_at: Option<u32>,
    detached_after_lookup: bool,
    removed_on_click: bool,
    on_hover: Vec<Mutation>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            tag: "div".to_string(),
            text: String::new(),
            attributes: HashMap::new(),
            css: HashMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            revealed_at: None,
            detached_after_lookup: false,
            removed_on_click: false,
            on_hover: Vec::new(),
        }
    }
}

impl MockElement {
    /// A visible, enabled `div` with no text
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag name (`link-text` lookups only match `a`)
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a computed css property
    #[must_use]
    pub fn with_css(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.css.insert(name.into(), value.into());
        self
    }

    /// Not rendered
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Not interactable
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Checked / selected
    #[must_use]
    pub const fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Only rendered once the window is scrolled to at least `offset`
    #[must_use]
    pub const fn revealed_at(mut self, offset: u32) -> Self {
        self.revealed_at = Some(offset);
        self
    }

    /// Detached from the document right after a lookup returns it
    #[must_use]
    pub const fn detached_after_lookup(mut self) -> Self {
        self.detached_after_lookup = true;
        self
    }

    /// Detached from the document when clicked
    #[must_use]
    pub const fn removed_on_click(mut self) -> Self {
        self.removed_on_click = true;
        self
    }

    /// Apply `mutation` each time the pointer moves over the element
    #[must_use]
    pub fn on_hover(mut self, mutation: Mutation) -> Self {
        self.on_hover.push(mutation);
        self
    }
}

/// DOM change applied at a scheduled time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Remove the element from the document
    Detach(ElementHandle),
    /// Put a detached element back
    Attach(ElementHandle),
    /// Replace the rendered text
    SetText(ElementHandle, String),
    /// Set an attribute value
    SetAttribute(ElementHandle, String, String),
    /// Show or hide
    SetDisplayed(ElementHandle, bool),
    /// Enable or disable
    SetEnabled(ElementHandle, bool),
    /// Select or deselect
    SetSelected(ElementHandle, bool),
}

// =============================================================================
// RULES
// =============================================================================

/// Where a scripted rule applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Document-wide lookups only
    Document,
    /// Lookups inside this element only
    Within(ElementHandle),
    /// Any lookup
    Any,
}

impl Scope {
    fn matches(&self, within: Option<&ElementHandle>) -> bool {
        match (self, within) {
            (Self::Any, _) | (Self::Document, None) => true,
            (Self::Within(scope), Some(h)) => scope == h,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Rule {
    locator: ParsedLocator,
    scope: Scope,
    responses: Vec<Vec<ElementHandle>>,
    served: usize,
}

impl Rule {
    /// Next scripted response; the last one repeats
    fn next_response(&mut self) -> Vec<ElementHandle> {
        let idx = self.served.min(self.responses.len().saturating_sub(1));
        self.served += 1;
        self.responses.get(idx).cloned().unwrap_or_default()
    }
}

/// Builder returned by [`MockDriver::when`]
#[derive(Debug)]
pub struct RuleBuilder<'a> {
    driver: &'a MockDriver,
    locator: ParsedLocator,
    scope: Scope,
}

impl RuleBuilder<'_> {
    /// Answer every matching lookup with `handles`
    pub fn returns(self, handles: &[ElementHandle]) {
        self.returns_sequence(vec![handles.to_vec()]);
    }

    /// Answer matching lookups with no elements
    pub fn returns_nothing(self) {
        self.returns_sequence(vec![Vec::new()]);
    }

    /// Answer successive lookups in order; the last response repeats
    pub fn returns_sequence(self, responses: Vec<Vec<ElementHandle>>) {
        self.driver.state.borrow_mut().rules.push(Rule {
            locator: self.locator,
            scope: self.scope,
            responses,
            served: 0,
        });
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// One recorded lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCall {
    /// Locator passed to the driver
    pub locator: ParsedLocator,
    /// Scope handle, `None` for document-wide
    pub within: Option<ElementHandle>,
}

#[derive(Debug)]
struct Record {
    handle: ElementHandle,
    parent: Option<ElementHandle>,
    element: MockElement,
    attached: bool,
}

#[derive(Debug)]
struct MockState {
    records: Vec<Record>,
    rules: Vec<Rule>,
    schedule: Vec<(Duration, Mutation)>,
    viewport_height: u32,
    document_height: u32,
    scroll_offset: u32,
    scroll_history: Vec<u32>,
    finds: Vec<FindCall>,
    call_history: Vec<String>,
    hovered: Option<ElementHandle>,
    focused: Option<ElementHandle>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rules: Vec::new(),
            schedule: Vec::new(),
            viewport_height: 800,
            document_height: 800,
            scroll_offset: 0,
            scroll_history: Vec::new(),
            finds: Vec::new(),
            call_history: Vec::new(),
            hovered: None,
            focused: None,
        }
    }
}

impl MockState {
    fn record(&self, handle: &ElementHandle) -> DriverResult<&Record> {
        self.records
            .iter()
            .find(|r| &r.handle == handle)
            .ok_or_else(|| DriverError::Command(format!("unknown {handle}")))
    }

    fn record_mut(&mut self, handle: &ElementHandle) -> DriverResult<&mut Record> {
        self.records
            .iter_mut()
            .find(|r| &r.handle == handle)
            .ok_or_else(|| DriverError::Command(format!("unknown {handle}")))
    }

    /// Record for an operation that needs the element attached
    fn live(&self, handle: &ElementHandle) -> DriverResult<&Record> {
        let record = self.record(handle)?;
        if record.attached {
            Ok(record)
        } else {
            Err(DriverError::StaleElementReference(handle.clone()))
        }
    }

    fn live_mut(&mut self, handle: &ElementHandle) -> DriverResult<&mut Record> {
        let record = self.record_mut(handle)?;
        if record.attached {
            Ok(record)
        } else {
            Err(DriverError::StaleElementReference(handle.clone()))
        }
    }

    fn is_rendered(&self, record: &Record) -> bool {
        record.attached
            && record
                .element
                .revealed_at
                .map_or(true, |offset| self.scroll_offset >= offset)
    }

    fn is_descendant(&self, handle: &ElementHandle, ancestor: &ElementHandle) -> bool {
        let mut current = self.record(handle).ok().and_then(|r| r.parent.clone());
        while let Some(parent) = current {
            if &parent == ancestor {
                return true;
            }
            current = self.record(&parent).ok().and_then(|r| r.parent.clone());
        }
        false
    }

    fn structural_match(&self, locator: &ParsedLocator, record: &Record) -> bool {
        let element = &record.element;
        let attr = |name: &str| element.attributes.get(name).map(String::as_str);
        let body = locator.body.as_str();
        match locator.strategy {
            Strategy::Id => attr("id") == Some(body),
            Strategy::Name => attr("name") == Some(body),
            Strategy::Class => attr("class") == Some(body),
            Strategy::LinkText => element.tag == "a" && element.text == body,
            Strategy::ContainsText => element.text.contains(body),
            Strategy::XPath | Strategy::Css => false,
        }
    }

    /// Live record for a pointer action; hidden or disabled elements refuse it
    fn interactable(&mut self, handle: &ElementHandle) -> DriverResult<&mut Record> {
        let record = self.live_mut(handle)?;
        if !record.element.displayed || !record.element.enabled {
            return Err(DriverError::Command(format!(
                "{handle} is not interactable"
            )));
        }
        Ok(record)
    }

    fn apply(&mut self, mutation: Mutation) {
        let handle = match &mutation {
            Mutation::Detach(h)
            | Mutation::Attach(h)
            | Mutation::SetText(h, _)
            | Mutation::SetAttribute(h, _, _)
            | Mutation::SetDisplayed(h, _)
            | Mutation::SetEnabled(h, _)
            | Mutation::SetSelected(h, _) => h.clone(),
        };
        let Ok(record) = self.record_mut(&handle) else {
            return;
        };
        match mutation {
            Mutation::Detach(_) => record.attached = false,
            Mutation::Attach(_) => record.attached = true,
            Mutation::SetText(_, text) => record.element.text = text,
            Mutation::SetAttribute(_, name, value) => {
                let _ = record.element.attributes.insert(name, value);
            }
            Mutation::SetDisplayed(_, v) => record.element.displayed = v,
            Mutation::SetEnabled(_, v) => record.element.enabled = v,
            Mutation::SetSelected(_, v) => record.element.selected = v,
        }
    }

    fn lookup(
        &mut self,
        locator: &ParsedLocator,
        within: Option<&ElementHandle>,
    ) -> DriverResult<Vec<ElementHandle>> {
        self.finds.push(FindCall {
            locator: locator.clone(),
            within: within.cloned(),
        });
        if let Some(scope) = within {
            let _ = self.live(scope)?;
        }

        let scripted = self
            .rules
            .iter_mut()
            .rev()
            .find(|rule| rule.locator == *locator && rule.scope.matches(within))
            .map(Rule::next_response);

        let candidates: Vec<ElementHandle> = match scripted {
            Some(handles) => handles,
            None => self
                .records
                .iter()
                .filter(|r| self.structural_match(locator, r))
                .filter(|r| within.map_or(true, |scope| self.is_descendant(&r.handle, scope)))
                .map(|r| r.handle.clone())
                .collect(),
        };

        let found: Vec<ElementHandle> = candidates
            .into_iter()
            .filter(|h| self.record(h).is_ok_and(|r| self.is_rendered(r)))
            .collect();

        for handle in &found {
            if let Ok(record) = self.record_mut(handle) {
                if record.element.detached_after_lookup {
                    record.attached = false;
                }
            }
        }
        Ok(found)
    }
}

/// Scripted driver over a synthetic DOM
#[derive(Debug, Default)]
pub struct MockDriver {
    state: RefCell<MockState>,
    clock: Option<Arc<dyn Clock>>,
}

impl MockDriver {
    /// Create an empty document with an 800px viewport
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply scheduled mutations against `clock`
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Register a top-level element
    pub fn add_element(&self, element: MockElement) -> ElementHandle {
        self.insert(None, element)
    }

    /// Register an element inside `parent`
    pub fn add_child(&self, parent: &ElementHandle, element: MockElement) -> ElementHandle {
        self.insert(Some(parent.clone()), element)
    }

    fn insert(&self, parent: Option<ElementHandle>, element: MockElement) -> ElementHandle {
        let handle = ElementHandle::generate();
        self.state.borrow_mut().records.push(Record {
            handle: handle.clone(),
            parent,
            element,
            attached: true,
        });
        handle
    }

    /// Script document-wide lookups of `locator`
    #[must_use]
    pub fn when(&self, locator: &str) -> RuleBuilder<'_> {
        self.rule(locator, Scope::Document)
    }

    /// Script lookups of `locator` inside `parent`
    #[must_use]
    pub fn when_within(&self, parent: &ElementHandle, locator: &str) -> RuleBuilder<'_> {
        self.rule(locator, Scope::Within(parent.clone()))
    }

    /// Script lookups of `locator` in any scope
    #[must_use]
    pub fn when_anywhere(&self, locator: &str) -> RuleBuilder<'_> {
        self.rule(locator, Scope::Any)
    }

    fn rule(&self, locator: &str, scope: Scope) -> RuleBuilder<'_> {
        let locator = ParsedLocator::parse(locator)
            .unwrap_or_else(|_| ParsedLocator::new(Strategy::XPath, locator));
        RuleBuilder {
            driver: self,
            locator,
            scope,
        }
    }

    /// Remove an element from the document now
    pub fn detach(&self, handle: &ElementHandle) {
        self.state.borrow_mut().apply(Mutation::Detach(handle.clone()));
    }

    /// Apply a mutation now
    pub fn mutate(&self, mutation: Mutation) {
        self.state.borrow_mut().apply(mutation);
    }

    /// Apply `mutation` once the clock reaches `at`
    pub fn schedule(&self, at: Duration, mutation: Mutation) {
        self.state.borrow_mut().schedule.push((at, mutation));
    }

    /// Set viewport and document heights
    pub fn set_viewport(&self, viewport_height: u32, document_height: u32) {
        let mut state = self.state.borrow_mut();
        state.viewport_height = viewport_height;
        state.document_height = document_height;
    }

    /// Every offset passed to `scroll_to`, in order
    #[must_use]
    pub fn scroll_history(&self) -> Vec<u32> {
        self.state.borrow().scroll_history.clone()
    }

    /// Current vertical scroll offset
    #[must_use]
    pub fn scroll_offset(&self) -> u32 {
        self.state.borrow().scroll_offset
    }

    /// Every lookup made so far
    #[must_use]
    pub fn finds(&self) -> Vec<FindCall> {
        self.state.borrow().finds.clone()
    }

    /// Number of lookups of `locator`, any scope
    #[must_use]
    pub fn find_count(&self, locator: &str) -> usize {
        let Ok(wanted) = ParsedLocator::parse(locator) else {
            return 0;
        };
        self.state
            .borrow()
            .finds
            .iter()
            .filter(|call| call.locator == wanted)
            .count()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state
            .borrow()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Whether `handle` is still in the document
    #[must_use]
    pub fn is_attached(&self, handle: &ElementHandle) -> bool {
        self.state
            .borrow()
            .record(handle)
            .is_ok_and(|r| r.attached)
    }

    /// Element the pointer last moved over
    #[must_use]
    pub fn hovered(&self) -> Option<ElementHandle> {
        self.state.borrow().hovered.clone()
    }

    /// Element holding keyboard focus
    #[must_use]
    pub fn focused(&self) -> Option<ElementHandle> {
        self.state.borrow().focused.clone()
    }

    /// Current `value` attribute of `handle`
    #[must_use]
    pub fn value_of(&self, handle: &ElementHandle) -> Option<String> {
        self.state
            .borrow()
            .record(handle)
            .ok()
            .and_then(|r| r.element.attributes.get("value").cloned())
    }

    /// Borrow state after applying due mutations and logging `call`
    fn enter(&self, call: String) -> std::cell::RefMut<'_, MockState> {
        let mut state = self.state.borrow_mut();
        if let Some(clock) = &self.clock {
            let now = clock.now();
            let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.schedule)
                .into_iter()
                .partition(|(at, _)| *at <= now);
            state.schedule = pending;
            for (_, mutation) in due {
                state.apply(mutation);
            }
        }
        state.call_history.push(call);
        state
    }
}

fn scoped_call(method: &str, locator: &ParsedLocator, within: Option<&ElementHandle>) -> String {
    match within {
        Some(scope) => format!("{method}:{locator}@{}", scope.id),
        None => format!("{method}:{locator}"),
    }
}

impl Driver for MockDriver {
    fn find_one(
        &self,
        locator: &ParsedLocator,
        within: Option<&ElementHandle>,
    ) -> DriverResult<ElementHandle> {
        let mut state = self.enter(scoped_call("find_one", locator, within));
        state
            .lookup(locator, within)?
            .into_iter()
            .next()
            .ok_or(DriverError::NoSuchElement)
    }

    fn find_all(
        &self,
        locator: &ParsedLocator,
        within: Option<&ElementHandle>,
    ) -> DriverResult<Vec<ElementHandle>> {
        let mut state = self.enter(scoped_call("find_all", locator, within));
        state.lookup(locator, within)
    }

    fn is_stale(&self, handle: &ElementHandle) -> DriverResult<bool> {
        let state = self.enter(format!("is_stale:{}", handle.id));
        Ok(!state.record(handle)?.attached)
    }

    fn read_text(&self, handle: &ElementHandle) -> DriverResult<String> {
        let state = self.enter(format!("read_text:{}", handle.id));
        Ok(state.live(handle)?.element.text.clone())
    }

    fn read_attribute(&self, handle: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        let state = self.enter(format!("read_attribute:{}:{name}", handle.id));
        Ok(state.live(handle)?.element.attributes.get(name).cloned())
    }

    fn is_displayed(&self, handle: &ElementHandle) -> DriverResult<bool> {
        let state = self.enter(format!("is_displayed:{}", handle.id));
        Ok(state.live(handle)?.element.displayed)
    }

    fn is_enabled(&self, handle: &ElementHandle) -> DriverResult<bool> {
        let state = self.enter(format!("is_enabled:{}", handle.id));
        Ok(state.live(handle)?.element.enabled)
    }

    fn is_selected(&self, handle: &ElementHandle) -> DriverResult<bool> {
        let state = self.enter(format!("is_selected:{}", handle.id));
        Ok(state.live(handle)?.element.selected)
    }

    fn click(&self, handle: &ElementHandle) -> DriverResult<()> {
        let mut state = self.enter(format!("click:{}", handle.id));
        let record = state.interactable(handle)?;
        if record.element.removed_on_click {
            record.attached = false;
        }
        Ok(())
    }

    fn send_input(&self, handle: &ElementHandle, text: &str) -> DriverResult<()> {
        let mut state = self.enter(format!("send_input:{}:{text}", handle.id));
        let record = state.live_mut(handle)?;
        if !record.element.enabled {
            return Err(DriverError::Command(format!(
                "{handle} is not interactable"
            )));
        }
        record
            .element
            .attributes
            .entry("value".to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    fn click_at(&self, handle: &ElementHandle, x: i32, y: i32) -> DriverResult<()> {
        let mut state = self.enter(format!("click_at:{}:{x},{y}", handle.id));
        let record = state.interactable(handle)?;
        if record.element.removed_on_click {
            record.attached = false;
        }
        Ok(())
    }

    fn script_click(&self, handle: &ElementHandle) -> DriverResult<()> {
        let mut state = self.enter(format!("script_click:{}", handle.id));
        let record = state.live_mut(handle)?;
        if record.element.removed_on_click {
            record.attached = false;
        }
        Ok(())
    }

    fn double_click(&self, handle: &ElementHandle) -> DriverResult<()> {
        let mut state = self.enter(format!("double_click:{}", handle.id));
        let _ = state.interactable(handle)?;
        Ok(())
    }

    fn hover(&self, handle: &ElementHandle) -> DriverResult<()> {
        let mut state = self.enter(format!("hover:{}", handle.id));
        let record = state.live(handle)?;
        if !record.element.displayed {
            return Err(DriverError::Command(format!("{handle} is not displayed")));
        }
        let triggered = record.element.on_hover.clone();
        state.hovered = Some(handle.clone());
        for mutation in triggered {
            state.apply(mutation);
        }
        Ok(())
    }

    fn focus(&self, handle: &ElementHandle) -> DriverResult<()> {
        let mut state = self.enter(format!("focus:{}", handle.id));
        let _ = state.live(handle)?;
        state.focused = Some(handle.clone());
        Ok(())
    }

    fn submit(&self, handle: &ElementHandle) -> DriverResult<()> {
        let state = self.enter(format!("submit:{}", handle.id));
        let _ = state.live(handle)?;
        Ok(())
    }

    fn drag_to(&self, handle: &ElementHandle, target: &ElementHandle) -> DriverResult<()> {
        let mut state = self.enter(format!("drag_to:{}:{}", handle.id, target.id));
        let _ = state.live(target)?;
        let _ = state.interactable(handle)?;
        Ok(())
    }

    fn drag_by(&self, handle: &ElementHandle, dx: i32, dy: i32) -> DriverResult<()> {
        let mut state = self.enter(format!("drag_by:{}:{dx},{dy}", handle.id));
        let _ = state.interactable(handle)?;
        Ok(())
    }

    fn read_css_value(&self, handle: &ElementHandle, name: &str) -> DriverResult<String> {
        let state = self.enter(format!("read_css_value:{}:{name}", handle.id));
        Ok(state
            .live(handle)?
            .element
            .css
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    fn set_attribute(&self, handle: &ElementHandle, name: &str, value: &str) -> DriverResult<()> {
        let mut state = self.enter(format!("set_attribute:{}:{name}", handle.id));
        let record = state.live_mut(handle)?;
        let _ = record
            .element
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn scroll_into_view(&self, handle: &ElementHandle) -> DriverResult<()> {
        let state = self.enter(format!("scroll_into_view:{}", handle.id));
        let _ = state.live(handle)?;
        Ok(())
    }

    fn scroll_to(&self, offset: u32) -> DriverResult<()> {
        let mut state = self.enter(format!("scroll_to:{offset}"));
        state.scroll_offset = offset;
        state.scroll_history.push(offset);
        Ok(())
    }

    fn viewport_height(&self) -> DriverResult<u32> {
        let state = self.enter("viewport_height".to_string());
        Ok(state.viewport_height)
    }

    fn document_scroll_height(&self) -> DriverResult<u32> {
        let state = self.enter("document_scroll_height".to_string());
        Ok(state.document_height)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    fn loc(s: &str) -> ParsedLocator {
        ParsedLocator::parse(s).unwrap()
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_structural_fallback() {
            let driver = MockDriver::new();
            let save = driver.add_element(MockElement::new().with_attribute("id", "save"));
            let link = driver.add_element(MockElement::new().with_tag("a").with_text("Home"));
            let _ = driver.add_element(MockElement::new().with_text("Home"));

            assert_eq!(driver.find_one(&loc("id=save"), None).unwrap(), save);
            assert_eq!(driver.find_all(&loc("link=Home"), None).unwrap(), vec![link]);
            assert_eq!(driver.find_all(&loc("text=Hom"), None).unwrap().len(), 2);
            assert_eq!(
                driver.find_one(&loc("id=missing"), None),
                Err(DriverError::NoSuchElement)
            );
        }

        #[test]
        fn test_fallback_respects_scope() {
            let driver = MockDriver::new();
            let form = driver.add_element(MockElement::new());
            let inside = driver.add_child(&form, MockElement::new().with_attribute("name", "q"));
            let _outside = driver.add_element(MockElement::new().with_attribute("name", "q"));

            let found = driver.find_all(&loc("name=q"), Some(&form)).unwrap();
            assert_eq!(found, vec![inside]);
            assert_eq!(driver.find_all(&loc("name=q"), None).unwrap().len(), 2);
        }

        #[test]
        fn test_rule_sequence_repeats_last() {
            let driver = MockDriver::new();
            let row = driver.add_element(MockElement::new());
            driver
                .when("//tr")
                .returns_sequence(vec![vec![], vec![row.clone()]]);

            assert!(driver.find_all(&loc("//tr"), None).unwrap().is_empty());
            assert_eq!(driver.find_all(&loc("//tr"), None).unwrap(), vec![row.clone()]);
            assert_eq!(driver.find_all(&loc("//tr"), None).unwrap(), vec![row]);
            assert_eq!(driver.find_count("//tr"), 3);
        }

        #[test]
        fn test_rule_scope() {
            let driver = MockDriver::new();
            let table = driver.add_element(MockElement::new());
            let cell = driver.add_element(MockElement::new());
            driver.when_within(&table, ".//td").returns(&[cell.clone()]);

            assert_eq!(driver.find_one(&loc(".//td"), Some(&table)).unwrap(), cell);
            assert!(driver.find_all(&loc(".//td"), None).unwrap().is_empty());
        }

        #[test]
        fn test_rule_in_any_scope() {
            let driver = MockDriver::new();
            let table = driver.add_element(MockElement::new());
            let cell = driver.add_element(MockElement::new());
            driver.when_anywhere(".//td").returns(&[cell.clone()]);

            assert_eq!(driver.find_one(&loc(".//td"), Some(&table)).unwrap(), cell);
            assert_eq!(driver.find_one(&loc(".//td"), None).unwrap(), cell);
        }

        #[test]
        fn test_rule_hides_structural_match() {
            let driver = MockDriver::new();
            let _ = driver.add_element(MockElement::new().with_attribute("id", "save"));
            driver.when("id=save").returns_nothing();

            assert!(driver.find_all(&loc("id=save"), None).unwrap().is_empty());
        }

        #[test]
        fn test_search_within_detached_scope_is_stale() {
            let driver = MockDriver::new();
            let table = driver.add_element(MockElement::new());
            driver.detach(&table);
            let err = driver.find_one(&loc(".//td"), Some(&table)).unwrap_err();
            assert_eq!(err, DriverError::StaleElementReference(table));
        }

        #[test]
        fn test_detached_after_lookup() {
            let driver = MockDriver::new();
            let row = driver.add_element(MockElement::new().detached_after_lookup());
            driver.when("//tr").returns(&[row.clone()]);

            assert_eq!(driver.find_one(&loc("//tr"), None).unwrap(), row);
            assert!(driver.is_stale(&row).unwrap());
            assert_eq!(
                driver.find_one(&loc("//tr"), None),
                Err(DriverError::NoSuchElement)
            );
        }

        #[test]
        fn test_revealed_by_scrolling() {
            let driver = MockDriver::new();
            let footer = driver.add_element(
                MockElement::new()
                    .with_attribute("id", "footer")
                    .revealed_at(1600),
            );
            assert!(driver.find_all(&loc("id=footer"), None).unwrap().is_empty());
            driver.scroll_to(1600).unwrap();
            assert_eq!(driver.find_one(&loc("id=footer"), None).unwrap(), footer);
            assert_eq!(driver.scroll_history(), vec![1600]);
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_detached_handle_operations_are_stale() {
            let driver = MockDriver::new();
            let h = driver.add_element(MockElement::new().with_text("x"));
            driver.detach(&h);
            assert!(matches!(
                driver.read_text(&h),
                Err(DriverError::StaleElementReference(_))
            ));
            assert!(matches!(
                driver.click(&h),
                Err(DriverError::StaleElementReference(_))
            ));
        }

        #[test]
        fn test_click_and_input() {
            let driver = MockDriver::new();
            let button = driver.add_element(MockElement::new().removed_on_click());
            driver.click(&button).unwrap();
            assert!(!driver.is_attached(&button));
            assert!(driver.was_called("click"));

            let input = driver.add_element(MockElement::new().with_attribute("value", "a"));
            driver.send_input(&input, "bc").unwrap();
            assert_eq!(driver.value_of(&input).as_deref(), Some("abc"));

            let disabled = driver.add_element(MockElement::new().disabled());
            assert!(matches!(
                driver.click(&disabled),
                Err(DriverError::Command(_))
            ));
        }

        #[test]
        fn test_pointer_actions() {
            let driver = MockDriver::new();
            let tooltip = driver.add_element(MockElement::new().hidden());
            let slice = driver.add_element(
                MockElement::new().on_hover(Mutation::SetDisplayed(tooltip.clone(), true)),
            );
            driver.hover(&slice).unwrap();
            assert_eq!(driver.hovered(), Some(slice.clone()));
            assert!(driver.is_displayed(&tooltip).unwrap());

            driver.double_click(&slice).unwrap();
            driver.click_at(&slice, 5, -3).unwrap();
            assert!(driver.was_called(&format!("double_click:{}", slice.id)));
            assert!(driver.was_called(&format!("click_at:{}:5,-3", slice.id)));

            let hidden = driver.add_element(MockElement::new().hidden());
            assert!(matches!(driver.hover(&hidden), Err(DriverError::Command(_))));
            assert!(matches!(
                driver.double_click(&hidden),
                Err(DriverError::Command(_))
            ));
        }

        #[test]
        fn test_script_click_skips_interactability() {
            let driver = MockDriver::new();
            let covered = driver.add_element(MockElement::new().disabled().removed_on_click());
            assert!(driver.click(&covered).is_err());
            driver.script_click(&covered).unwrap();
            assert!(!driver.is_attached(&covered));
        }

        #[test]
        fn test_drag_needs_live_target() {
            let driver = MockDriver::new();
            let card = driver.add_element(MockElement::new());
            let lane = driver.add_element(MockElement::new());
            driver.drag_to(&card, &lane).unwrap();
            driver.drag_by(&card, 40, 0).unwrap();
            assert!(driver.was_called(&format!("drag_to:{}:{}", card.id, lane.id)));

            driver.detach(&lane);
            assert_eq!(
                driver.drag_to(&card, &lane),
                Err(DriverError::StaleElementReference(lane))
            );
        }

        #[test]
        fn test_focus_submit_css_and_attribute() {
            let driver = MockDriver::new();
            let field = driver.add_element(MockElement::new().with_css("color", "rgba(0, 0, 0, 1)"));
            driver.focus(&field).unwrap();
            driver.submit(&field).unwrap();
            assert_eq!(driver.focused(), Some(field.clone()));
            assert!(driver.was_called("submit"));

            assert_eq!(driver.read_css_value(&field, "color").unwrap(), "rgba(0, 0, 0, 1)");
            assert_eq!(driver.read_css_value(&field, "width").unwrap(), "");

            driver.set_attribute(&field, "value", "42").unwrap();
            assert_eq!(driver.value_of(&field).as_deref(), Some("42"));
        }

        #[test]
        fn test_scheduled_mutation() {
            let clock = FakeClock::new();
            let driver = MockDriver::new().with_clock(Arc::new(clock.clone()));
            let h = driver.add_element(MockElement::new().hidden());
            driver.schedule(
                Duration::from_millis(1000),
                Mutation::SetDisplayed(h.clone(), true),
            );

            assert!(!driver.is_displayed(&h).unwrap());
            clock.fast_forward(Duration::from_millis(999));
            assert!(!driver.is_displayed(&h).unwrap());
            clock.fast_forward(Duration::from_millis(1));
            assert!(driver.is_displayed(&h).unwrap());
        }

        #[test]
        fn test_history_records_scope() {
            let driver = MockDriver::new();
            let parent = driver.add_element(MockElement::new());
            let _ = driver.find_all(&loc("id=a"), Some(&parent));
            let history = driver.history();
            assert_eq!(history[0], format!("find_all:id=a@{}", parent.id));
        }
    }
}
