//! Locator nodes: composable, re-bindable element declarations.
//!
//! A [`LocatorNode`] is what a page object holds for each UI element it
//! declares. It keeps the raw template it was built from, the locator parsed
//! from the most recent binding, and an optional parent that scopes its
//! lookups:
//!
//! ```text
//! table   = "css=table.statistics"
//!   row   = "xpath=.//tr[%d]"          bind(3) -> ".//tr[3]"
//!     val = "xpath=./td[text()='%s']"  bind("Total")
//! ```
//!
//! Nodes are cheap handles (`Rc`) so one parent can be shared by many
//! children. They are deliberately `!Send`: [`LocatorNode::bind`] mutates in
//! place, and a node tree belongs to the one session that drives it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::driver::ElementHandle;
use crate::locator::{ParsedLocator, Strategy};
use crate::result::{LocusError, LocusResult};
use crate::template;

#[derive(Debug, Clone)]
enum Target {
    Template {
        raw: String,
        parsed: ParsedLocator,
    },
    Pinned(ElementHandle),
}

#[derive(Debug)]
struct NodeInner {
    parent: Option<LocatorNode>,
    target: RefCell<Target>,
}

/// A declared element: template + current locator, or a pinned handle
#[derive(Debug, Clone)]
pub struct LocatorNode(Rc<NodeInner>);

impl LocatorNode {
    /// Node from a prefixed locator string.
    ///
    /// Placeholders are left in place until [`Self::bind`] is called.
    pub fn new(locator: &str) -> LocusResult<Self> {
        Self::build(None, locator)
    }

    /// Node from a template, bound immediately to `args`
    pub fn with_args(template: &str, args: &[&dyn fmt::Display]) -> LocusResult<Self> {
        let node = Self::new(template)?;
        node.bind(args)?;
        Ok(node)
    }

    /// Node whose lookups are scoped to this node's element
    pub fn child(&self, locator: &str) -> LocusResult<Self> {
        Self::build(Some(self.clone()), locator)
    }

    /// Child node bound immediately to `args`
    pub fn child_with_args(&self, template: &str, args: &[&dyn fmt::Display]) -> LocusResult<Self> {
        let node = self.child(template)?;
        node.bind(args)?;
        Ok(node)
    }

    /// Node pinned to a literal handle; resolution returns it directly
    #[must_use]
    pub fn pinned(handle: ElementHandle) -> Self {
        Self(Rc::new(NodeInner {
            parent: None,
            target: RefCell::new(Target::Pinned(handle)),
        }))
    }

    fn build(parent: Option<Self>, locator: &str) -> LocusResult<Self> {
        let parsed = ParsedLocator::parse(locator)?;
        Ok(Self(Rc::new(NodeInner {
            parent,
            target: RefCell::new(Target::Template {
                raw: locator.to_string(),
                parsed,
            }),
        })))
    }

    /// Substitute `args` into the raw template and re-parse.
    ///
    /// Replaces the current locator in place; every clone of this node and
    /// every child scoped under it sees the new target. On error the node is
    /// left unchanged. A pinned node accepts only an empty argument list.
    pub fn bind(&self, args: &[&dyn fmt::Display]) -> LocusResult<()> {
        let raw = match &*self.0.target.borrow() {
            Target::Template { raw, .. } => raw.clone(),
            Target::Pinned(_) if args.is_empty() => return Ok(()),
            Target::Pinned(handle) => {
                return Err(LocusError::LocatorBindingArityError {
                    template: handle.to_string(),
                    expected: 0,
                    actual: args.len(),
                })
            }
        };
        let substituted = template::substitute(&raw, args)?;
        let parsed = ParsedLocator::parse(&substituted)?;
        *self.0.target.borrow_mut() = Target::Template { raw, parsed };
        Ok(())
    }

    /// Current locator, `None` for a pinned node
    #[must_use]
    pub fn locator(&self) -> Option<ParsedLocator> {
        match &*self.0.target.borrow() {
            Target::Template { parsed, .. } => Some(parsed.clone()),
            Target::Pinned(_) => None,
        }
    }

    /// Template the node was declared with, `None` for a pinned node
    #[must_use]
    pub fn raw_template(&self) -> Option<String> {
        match &*self.0.target.borrow() {
            Target::Template { raw, .. } => Some(raw.clone()),
            Target::Pinned(_) => None,
        }
    }

    /// Literal handle of a pinned node
    #[must_use]
    pub fn pinned_handle(&self) -> Option<ElementHandle> {
        match &*self.0.target.borrow() {
            Target::Pinned(handle) => Some(handle.clone()),
            Target::Template { .. } => None,
        }
    }

    /// Whether this node bypasses resolution
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        matches!(&*self.0.target.borrow(), Target::Pinned(_))
    }

    /// Scoping parent
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.0.parent.as_ref()
    }

    /// This node and its ancestors, root first
    #[must_use]
    pub fn chain(&self) -> Vec<Self> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(node) = current {
            chain.push(node.clone());
            current = node.parent();
        }
        chain.reverse();
        chain
    }

    /// Whether both values are the same declared node
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Single locator equivalent to resolving the whole chain.
    ///
    /// A root node yields its own locator. A chain of css nodes joins the
    /// bodies with a descendant space. Any other chain is expanded to xpath
    /// and concatenated, each child segment losing one leading `.`. Mixing
    /// css with anything else is a [`LocusError::MixedStrategyCompositionError`].
    pub fn full_locator(&self) -> LocusResult<ParsedLocator> {
        let mut locators = Vec::new();
        for node in self.chain() {
            locators.push(node.locator().ok_or(LocusError::PinnedHandleHasNoLocator)?);
        }

        let Some((root, rest)) = locators.split_first() else {
            return Err(LocusError::PinnedHandleHasNoLocator);
        };
        if rest.is_empty() {
            return Ok(root.clone());
        }

        if let Some(pair) = locators
            .windows(2)
            .find(|w| (w[0].strategy == Strategy::Css) != (w[1].strategy == Strategy::Css))
        {
            return Err(LocusError::MixedStrategyCompositionError {
                parent: pair[0].to_string(),
                child: pair[1].to_string(),
            });
        }

        if root.strategy == Strategy::Css {
            let bodies: Vec<&str> = locators.iter().map(|l| l.body.as_str()).collect();
            return Ok(ParsedLocator::new(Strategy::Css, bodies.join(" ")));
        }

        let mut expression = root.to_xpath().unwrap_or_default();
        for child in rest {
            expression.push_str(&child.xpath_segment().unwrap_or_default());
        }
        Ok(ParsedLocator::new(Strategy::XPath, expression))
    }
}

impl fmt::Display for LocatorNode {
    /// Chain rendered root first, `>>`-separated
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent() {
            write!(f, "{parent} >> ")?;
        }
        match &*self.0.target.borrow() {
            Target::Template { parsed, .. } => write!(f, "{parsed}"),
            Target::Pinned(handle) => write!(f, "{handle}"),
        }
    }
}
