//! Driver boundary: the browser capabilities the engine consumes.
//!
//! Locus does not speak any automation protocol itself. A [`Driver`]
//! implementation wraps a live browser session (WebDriver, CDP, ...) and
//! exposes the few primitives resolution, waiting and scroll-search need.
//!
//! ```text
//! ┌──────────────┐   find_one / find_all   ┌──────────────────┐
//! │ Session      │ ──────────────────────► │ Driver (adapter) │ ──► browser
//! │ resolver,    │ ◄────────────────────── │  WebDriver, CDP, │
//! │ poller       │   ElementHandle / error │  MockDriver      │
//! └──────────────┘                         └──────────────────┘
//! ```
//!
//! Methods take `&self`: one driver belongs to one session owned by a single
//! thread of control.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::locator::ParsedLocator;

/// Live reference to a DOM element as issued by the driver.
///
/// Valid until the element is removed or replaced; afterwards every
/// operation on it reports [`DriverError::StaleElementReference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned element reference
    pub id: String,
}

impl ElementHandle {
    /// Wrap a driver element reference
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// A fresh random reference (W3C element references are UUIDs)
    #[must_use]
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element({})", self.id)
    }
}

/// Result type for driver primitives
pub type DriverResult<T> = Result<T, DriverError>;

/// Failures reported by a driver primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Lookup matched nothing
    #[error("no such element")]
    NoSuchElement,

    /// The handle is no longer attached to the document
    #[error("stale element reference: {0}")]
    StaleElementReference(ElementHandle),

    /// Any other command failure
    #[error("{0}")]
    Command(String),
}

/// Browser capabilities consumed by the engine
pub trait Driver {
    /// First element matching `locator`, searched in `within`'s subtree or
    /// the whole document
    fn find_one(
        &self,
        locator: &ParsedLocator,
        within: Option<&ElementHandle>,
    ) -> DriverResult<ElementHandle>;

    /// All matches in document order; empty when nothing matches
    fn find_all(
        &self,
        locator: &ParsedLocator,
        within: Option<&ElementHandle>,
    ) -> DriverResult<Vec<ElementHandle>>;

    /// Whether the handle has been detached from the document
    fn is_stale(&self, handle: &ElementHandle) -> DriverResult<bool>;

    /// Rendered text of the element
    fn read_text(&self, handle: &ElementHandle) -> DriverResult<String>;

    /// Attribute or property value, `None` when absent
    fn read_attribute(&self, handle: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    /// Whether the element is rendered
    fn is_displayed(&self, handle: &ElementHandle) -> DriverResult<bool>;

    /// Whether the element accepts interaction
    fn is_enabled(&self, handle: &ElementHandle) -> DriverResult<bool>;

    /// Whether a checkbox, radio or option is selected
    fn is_selected(&self, handle: &ElementHandle) -> DriverResult<bool>;

    /// Click the element
    fn click(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Type `text` into the element
    fn send_input(&self, handle: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Click at an `(x, y)` pixel offset from the element's centre
    fn click_at(&self, handle: &ElementHandle, x: i32, y: i32) -> DriverResult<()>;

    /// Click through a script, skipping the interactability check
    fn script_click(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Double-click the element
    fn double_click(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Move the pointer over the element
    fn hover(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Give the element keyboard focus
    fn focus(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Submit the form the element belongs to
    fn submit(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Press on `handle`, move to `target` and release
    fn drag_to(&self, handle: &ElementHandle, target: &ElementHandle) -> DriverResult<()>;

    /// Press on `handle`, move by `(dx, dy)` pixels and release
    fn drag_by(&self, handle: &ElementHandle, dx: i32, dy: i32) -> DriverResult<()>;

    /// Computed value of css property `name`; empty when unset
    fn read_css_value(&self, handle: &ElementHandle, name: &str) -> DriverResult<String>;

    /// Set attribute `name` through a script
    fn set_attribute(&self, handle: &ElementHandle, name: &str, value: &str) -> DriverResult<()>;

    /// Scroll so the element sits in the middle of the viewport
    fn scroll_into_view(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Scroll the window to vertical offset `offset`
    fn scroll_to(&self, offset: u32) -> DriverResult<()>;

    /// Current viewport height in pixels
    fn viewport_height(&self) -> DriverResult<u32>;

    /// Full scrollable height of the document in pixels
    fn document_scroll_height(&self) -> DriverResult<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_handles_are_unique() {
        let a = ElementHandle::generate();
        let b = ElementHandle::generate();
        assert_ne!(a, b);
        assert_eq!(a.id.len(), 36);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(ElementHandle::new("e-1").to_string(), "element(e-1)");
    }

    #[test]
    fn test_stale_error_names_handle() {
        let err = DriverError::StaleElementReference(ElementHandle::new("e-9"));
        assert_eq!(err.to_string(), "stale element reference: element(e-9)");
    }
}
