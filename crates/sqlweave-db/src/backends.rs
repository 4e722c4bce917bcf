//! # Dialect backends
//!
//! Spelling rules for the supported databases plus the value type every
//! compiled fragment binds.
//!
//! | Database | Dialect |
//! |----------|---------|
//! | PostgreSQL | [`PostgresDialect`] |
//! | MySQL/MariaDB | [`MySqlDialect`] |
//! | SQLite | [`SqliteDialect`] |
//! | SQL Server | [`SqlServerDialect`] |
//!
//! Use [`dialect_for`] to pick one from a [`DatabaseType`].

pub mod dialect;
pub mod types;

pub use dialect::{
	Dialect, LimitClause, MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect,
	dialect_for,
};
pub use types::{DatabaseType, ParamStyle, QueryValue};
