//! # sqlweave database layer
//!
//! Compiles typed field selectors and predicate expressions over mapped
//! entities into parameterized SQL fragments for PostgreSQL, SQLite, MySQL
//! and SQL Server. Nothing here talks to a database: the output is SQL text
//! plus an ordered parameter list, ready for whatever executes it.
//!
//! ## Quick Start
//!
//! ```rust
//! use sqlweave_db::prelude::*;
//! use std::sync::Arc;
//!
//! struct User;
//! entity!(User => "users" { id: i64, name: String, age: i32 });
//!
//! let ctx = SqlContext::new(Arc::new(SqliteDialect));
//! let statement = ctx
//!     .select::<User>()?
//!     .filter(|u| u.age.gte(21) & u.name.contains("an"))?
//!     .where_in(|u| u.id, [1i64, 2, 3])?
//!     .build();
//!
//! assert_eq!(
//!     statement.sql,
//!     "SELECT \"users\".\"id\", \"users\".\"name\", \"users\".\"age\" FROM \"users\" \
//!      WHERE ((\"users\".\"age\" >= ?1) AND \"users\".\"name\" LIKE ?2 ESCAPE '\\') \
//!      AND \"users\".\"id\" IN (?3)"
//! );
//! assert_eq!(statement.params.len(), 3);
//! # Ok::<(), QueryError>(())
//! ```
//!
//! ## Modules
//!
//! - [`backends`]: dialects and bound values
//! - [`orm`]: entities, expressions, the compiler and the SELECT builder
//! - [`settings`]: compiler configuration from files or the environment

pub mod backends;
pub mod orm;
pub mod settings;

// Used by `entity!` expansions in downstream crates
#[doc(hidden)]
pub use inventory;
#[doc(hidden)]
pub use paste;

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::backends::*;
	pub use crate::entity;
	pub use crate::orm::*;
	pub use crate::settings::{CompilerSettings, SettingsError};
}
