//! HTTP Context Abstraction Layer
//!
//! Decouples request/response semantics from the transport through a
//! type-indexed feature registry: the transport populates capabilities
//! (request line, headers, body streams), the context facade lazily derives
//! typed views (query, cookies, form) over them, and a factory recycles
//! context instances across requests.
#![warn(missing_debug_implementations)]

pub mod http;
pub mod values;
pub mod features;
pub mod body;
pub mod cookie;
pub mod form;
pub mod context;

mod log;

pub use context::{ContextFactory, HttpContext, Request, Response};
pub use features::Features;
pub use values::{ValueMap, Values};
