//! # sqlweave
//!
//! Typed, dialect-aware SQL fragment building over mapped entities.
//!
//! sqlweave turns field selectors and predicate closures into parameterized
//! SQL for PostgreSQL, SQLite, MySQL and SQL Server. It assembles statements
//! only: executing them, pooling connections and mapping rows back are left
//! to whichever driver the application already uses.
//!
//! ## Quick Start
//!
//! ```rust
//! use sqlweave::prelude::*;
//! use std::sync::Arc;
//!
//! struct Customer;
//! entity!(Customer => "crm"."customers" {
//!     id: i64,
//!     name: String => "display_name",
//!     region: String,
//! });
//!
//! let ctx = SqlContext::new(Arc::new(MySqlDialect));
//! let statement = ctx
//!     .select::<Customer>()?
//!     .select(|c| (c.id, c.name))?
//!     .filter(|c| c.region.eq("EU"))?
//!     .order_by(|c| c.name)?
//!     .limit(20)
//!     .build();
//!
//! assert_eq!(
//!     statement.sql,
//!     "SELECT `crm`.`customers`.`id`, `crm`.`customers`.`display_name` \
//!      FROM `crm`.`customers` WHERE (`crm`.`customers`.`region` = ?) \
//!      ORDER BY `crm`.`customers`.`display_name` LIMIT 20"
//! );
//! # Ok::<(), QueryError>(())
//! ```
//!
//! ## Crates
//!
//! - [`db`] (`sqlweave-db`): dialects, entity metadata, the expression
//!   compiler and the SELECT builder

/// The database layer
pub use sqlweave_db as db;

pub use sqlweave_db::entity;
pub use sqlweave_db::backends::{DatabaseType, Dialect, QueryValue, dialect_for};
pub use sqlweave_db::orm::{
	Entity, Expr, JoinKind, MetadataRegistry, QueryError, SelectStatement, SqlContext, SqlStatement,
};
pub use sqlweave_db::settings::{CompilerSettings, SettingsError};

/// Prelude module for convenient imports
pub mod prelude {
	pub use sqlweave_db::prelude::*;
}
