//! Page Object Model support.
//!
//! A page object declares its elements once as [`LocatorNode`]s and exposes
//! a single readiness probe built on the condition poller.
//!
//! # Example
//!
//! ```ignore
//! struct StatisticsPage {
//!     header: LocatorNode,
//!     row: LocatorNode,
//! }
//!
//! impl PageObject for StatisticsPage {
//!     fn ready_marker(&self) -> &LocatorNode {
//!         &self.header
//!     }
//! }
//!
//! impl StatisticsPage {
//!     fn new() -> LocusResult<Self> {
//!         Ok(Self {
//!             header: LocatorNode::new("css=h1.statistics")?,
//!             row: LocatorNode::new("//table//tr[%d]")?,
//!         })
//!     }
//!
//!     fn cell<'s, D: Driver>(&self, session: &'s Session<D>, row: usize) -> LocusResult<Element<'s, D>> {
//!         self.row.bind(&[&row])?;
//!         Element::new(session, self.row.clone()).child(".//td[2]")
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use crate::driver::Driver;
use crate::element::Element;
use crate::node::LocatorNode;
use crate::result::LocusResult;
use crate::session::Session;
use crate::wait::Condition;

/// Default page load timeout
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// A page or component with a readiness marker
pub trait PageObject {
    /// Element whose condition signals the page is ready
    fn ready_marker(&self) -> &LocatorNode;

    /// Condition the marker must meet
    fn ready_condition(&self) -> Condition {
        Condition::Visible
    }

    /// How long to wait for the page
    fn load_timeout(&self) -> Duration {
        DEFAULT_LOAD_TIMEOUT
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Probe: wait for the ready marker
    fn wait_until_loaded<D: Driver>(&self, session: &Session<D>) -> bool
    where
        Self: Sized,
    {
        info!(page = self.page_name(), "Waiting for page to load");
        session.wait_until(
            self.ready_marker(),
            &self.ready_condition(),
            self.load_timeout(),
        )
    }
}

/// Builder for creating page objects from locator strings
#[derive(Debug, Clone)]
pub struct PageObjectBuilder {
    name: String,
    ready_marker: String,
    nodes: Vec<(String, String)>,
    load_timeout: Duration,
}

impl Default for PageObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageObjectBuilder {
    /// Create a new page object builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "page".to_string(),
            ready_marker: "css=body".to_string(),
            nodes: Vec::new(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// Set the page name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the ready marker locator
    #[must_use]
    pub fn with_ready_marker(mut self, locator: impl Into<String>) -> Self {
        self.ready_marker = locator.into();
        self
    }

    /// Declare a named element
    #[must_use]
    pub fn with_node(mut self, name: impl Into<String>, locator: impl Into<String>) -> Self {
        self.nodes.push((name.into(), locator.into()));
        self
    }

    /// Set the load timeout
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Parse every declared locator
    pub fn build(self) -> LocusResult<SimplePageObject> {
        let mut page = SimplePageObject {
            name: self.name,
            ready_marker: LocatorNode::new(&self.ready_marker)?,
            nodes: HashMap::new(),
            load_timeout: self.load_timeout,
        };
        for (name, locator) in self.nodes {
            page.add_node(name, &locator)?;
        }
        Ok(page)
    }
}

/// A generic page object holding named nodes
#[derive(Debug, Clone)]
pub struct SimplePageObject {
    name: String,
    ready_marker: LocatorNode,
    nodes: HashMap<String, LocatorNode>,
    load_timeout: Duration,
}

impl SimplePageObject {
    /// Page with a ready marker and no other nodes
    pub fn new(name: impl Into<String>, ready_marker: &str) -> LocusResult<Self> {
        Ok(Self {
            name: name.into(),
            ready_marker: LocatorNode::new(ready_marker)?,
            nodes: HashMap::new(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        })
    }

    /// Get a node by name
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&LocatorNode> {
        self.nodes.get(name)
    }

    /// Named node bound to `session`
    #[must_use]
    pub fn element<'s, D: Driver>(
        &self,
        session: &'s Session<D>,
        name: &str,
    ) -> Option<Element<'s, D>> {
        self.node(name).map(|node| Element::new(session, node.clone()))
    }

    /// Add a node
    pub fn add_node(&mut self, name: impl Into<String>, locator: &str) -> LocusResult<()> {
        let _ = self.nodes.insert(name.into(), LocatorNode::new(locator)?);
        Ok(())
    }

    /// Get all node names
    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }
}

impl PageObject for SimplePageObject {
    fn ready_marker(&self) -> &LocatorNode {
        &self.ready_marker
    }

    fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    fn page_name(&self) -> &str {
        &self.name
    }
}
