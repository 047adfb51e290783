//! Locus: composable string locators with stale-tolerant resolution
//!
//! Elements are described by prefixed locator strings (`id=submit`,
//! `css=.row`, `//table//tr[%d]`), composed into parent/child chains, and
//! resolved lazily through a [`Driver`]. Every resolution recovers from stale
//! handles with a bounded retry, and every wait is built on one poller over
//! an injectable [`Clock`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      LOCUS Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Locator    │    │ Locator    │    │ Session    │            │
//! │   │ grammar    │───►│ Node chain │───►│ (resolve + │──► Driver  │
//! │   │            │    │ (bind)     │    │  retry)    │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             │                    │
//! │              ┌──────────────┬───────────────┤                    │
//! │              ▼              ▼               ▼                    │
//! │        ┌──────────┐  ┌────────────┐  ┌────────────┐             │
//! │        │ Poller / │  │ Scroll     │  │ Element    │             │
//! │        │ Wait     │  │ search     │  │ traits     │             │
//! │        └──────────┘  └────────────┘  └────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use locus::prelude::*;
//!
//! let session = Session::new(driver);
//! let row = Element::locate(&session, "//table//tr[%d]")?;
//! row.bind(&[&3])?;
//!
//! if row.wait_for_visibility() {
//!     row.child(".//td[2]")?.click()?;
//! }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod clock;
pub mod config;
pub mod driver;
pub mod element;
pub mod locator;
pub mod logging;
pub mod mock;
pub mod node;
pub mod page_object;
pub mod result;
pub mod scroll;
pub mod session;
pub mod template;
pub mod wait;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Backoff, LocusConfig, StaleRetryPolicy, Timeouts};
pub use driver::{Driver, DriverError, DriverResult, ElementHandle};
pub use element::{Clickable, Control, Element, Scrollable, TextReadable};
pub use locator::{ParsedLocator, Strategy};
pub use node::LocatorNode;
pub use page_object::{PageObject, PageObjectBuilder, SimplePageObject};
pub use result::{LocusError, LocusResult};
pub use scroll::{ScrollSearch, ScrollState};
pub use session::Session;
pub use wait::{Condition, Poller, WaitOptions, WaitResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::clock::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::element::*;
    pub use super::locator::*;
    pub use super::logging::*;
    pub use super::node::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::scroll::*;
    pub use super::session::*;
    pub use super::wait::*;
}
