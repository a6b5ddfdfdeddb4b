//! Content filter engine
//!
//! Wiki pages carry filter tags: small markers whose `cf-val-<mask>` class
//! says under which filters the surrounding content is relevant. The engine
//! works out which block of content each tag governs (its *context*) and,
//! for a selected filter, folds the governed blocks into the fewest
//! top-level fragments to hide or show.
//!
//! ```no_run
//! use cf_engine::{Engine, FilterConfig, PageIdentity};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = cf_html::parse(r#"<div class="mw-body-content">...</div>"#)?;
//! let content = doc.get_elements_by_class_name("mw-body-content")[0];
//!
//! let mut engine = Engine::new(FilterConfig::default(), PageIdentity::new("Items", "view"));
//! engine.register(&mut doc, content)?;
//! engine.activate_view(&mut doc, Some(1))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
mod engine;
pub mod error;
pub mod filter;
pub mod notify;
pub mod page;
pub mod params;
pub mod registry;
pub mod table;
pub mod view;
pub mod walker;

pub use config::FilterConfig;
pub use context::ContextResolver;
pub use engine::{Engine, Registration, SkipReason};
pub use error::{EngineError, InvariantViolation, Result};
pub use notify::Notification;
pub use page::{PageIdentity, PageTitle};
pub use view::ViewFragments;
