//! View composer: declarative read pipelines.
//!
//! A view is built with [`ViewQuery`], compiled to a [`QueryPlan`] and executed
//! once by the entity store. Rows come back as JSON and are decoded into the
//! typed rows in [`rows`].

/// Dotted paths and value ordering
pub mod path;
/// Row predicates
pub mod filter;
/// Pagination
pub mod page;
/// Plan stages
pub mod plan;
/// Plan builder
pub mod builder;
/// Typed view rows
pub mod rows;

pub use builder::ViewQuery;
pub use filter::Filter;
pub use page::Page;
pub use plan::{CountJoin, JoinShape, Lookup, QueryPlan, SortDirection, SortSpec, Stage};
