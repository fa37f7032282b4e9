//! # Trellis Materializer
//!
//! Turns the flattened document model into a live, traversable node tree.
//!
//! The host supplies two capabilities: a [`NodeFactory`] that constructs live
//! nodes by type name and a [`DocumentLoader`] that resolves template paths to
//! Documents.

pub mod error;
pub mod factory;
pub mod live;
pub mod loader;
pub mod materializer;

pub use error::{LoadError, MaterializeError, MaterializeResult};
pub use factory::{FactoryRegistry, NodeFactory, CORE_TYPES};
pub use live::{LiveId, LiveNode, LiveTree, SourceLink};
pub use loader::{DocumentLoader, InMemoryLoader};
pub use materializer::{
    Diagnostic, MaterializeOptions, MaterializeReport, Materializer, Severity,
};
