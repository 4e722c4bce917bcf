//! # Typed statement building
//!
//! Entities are declared with [`entity!`](crate::entity), which produces a
//! set of typed [`Field`] handles and registers table metadata. Selectors and
//! predicates are closures over those handles; [`SelectStatement`] compiles
//! them into dialect-quoted, parameterized SQL fragments.
//!
//! ## Layers
//!
//! - [`model`]: entity metadata and field handles
//! - [`registry`]: type identity to metadata lookup
//! - [`expressions`]: the expression tree built by selectors and predicates
//! - [`compiler`]: field resolution and predicate compilation
//! - [`fragment`]: SQL text with parameter slots and final rendering
//! - [`projection`]: nested reference projections
//! - [`query`]: the fluent SELECT builder

pub mod compiler;
pub mod error;
pub mod expressions;
pub mod fragment;
pub mod model;
pub mod projection;
pub mod query;
pub mod registry;

pub use compiler::{ExpressionCompiler, ResolvedColumn};
pub use error::{QueryError, Result};
pub use expressions::{
	BinaryOp, ColumnRef, Expr, Method, Operand, Predicate, Selection, TextValue, UnaryOp,
};
pub use fragment::{Fragment, Piece, SqlStatement};
pub use model::{ColumnDescriptor, Entity, EntityDescriptor, EntityKey, Field, FieldSet, Slot};
pub use projection::{ProjectedColumn, ReferenceBuilder, ReferenceKind, ReferenceNode};
pub use query::{JoinKind, SelectStatement, SqlContext};
pub use registry::{EntityRegistration, MetadataRegistry};
