//! SQL dialect providers
//!
//! A dialect only knows how to spell things: identifier quoting, parameter
//! placeholders, row limiting and LIKE escaping. It never executes anything.
//!
//! | Backend | Quote | Placeholder | Row limit |
//! |---------|-------|-------------|-----------|
//! | PostgreSQL | `"users"` | `$1` | `LIMIT 10 OFFSET 20` |
//! | SQLite | `"users"` | `?1` | `LIMIT 10 OFFSET 20` |
//! | MySQL | `` `users` `` | `?` | `LIMIT 10 OFFSET 20` |
//! | SQL Server | `[users]` | `@p1` | `TOP 10` / `OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY` |

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

use std::fmt;
use std::sync::Arc;

use super::types::{DatabaseType, ParamStyle};

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

/// Row-limiting fragments produced by a dialect
///
/// `top` is written right after `SELECT [DISTINCT]`, `tail` after `ORDER BY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitClause {
	pub top: Option<String>,
	pub tail: Option<String>,
}

/// Spelling rules of one SQL dialect
pub trait Dialect: Send + Sync + fmt::Debug {
	fn database_type(&self) -> DatabaseType;

	/// Quote a single identifier, doubling any embedded closing quote
	fn quote_identifier(&self, ident: &str) -> String {
		format!("\"{}\"", ident.replace('"', "\"\""))
	}

	/// Placeholder for the parameter at 1-based `index`
	fn placeholder(&self, index: usize) -> String;

	fn param_style(&self) -> ParamStyle {
		ParamStyle::Numbered
	}

	/// Build the row-limit fragments for `limit` rows after skipping `offset`
	fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> LimitClause {
		let tail = match (limit, offset) {
			(None, None) => None,
			(Some(rows), None) => Some(format!("LIMIT {}", rows)),
			(Some(rows), Some(skip)) => Some(format!("LIMIT {} OFFSET {}", rows, skip)),
			(None, Some(skip)) => Some(format!("OFFSET {}", skip)),
		};
		LimitClause { top: None, tail }
	}

	/// Whether an OFFSET is only legal after an ORDER BY
	fn offset_requires_order(&self) -> bool {
		false
	}

	/// Escape LIKE wildcards so `value` matches literally
	fn escape_like(&self, value: &str) -> String {
		let mut escaped = String::with_capacity(value.len());
		for ch in value.chars() {
			if matches!(ch, '\\' | '%' | '_') {
				escaped.push('\\');
			}
			escaped.push(ch);
		}
		escaped
	}

	/// Suffix declaring the escape character used by [`Dialect::escape_like`]
	fn like_escape_suffix(&self) -> &'static str {
		" ESCAPE '\\'"
	}

	/// Quote a table name, optionally schema-qualified
	fn quote_table(&self, schema: Option<&str>, table: &str) -> String {
		match schema {
			Some(schema) => format!(
				"{}.{}",
				self.quote_identifier(schema),
				self.quote_identifier(table)
			),
			None => self.quote_identifier(table),
		}
	}
}

/// Get the built-in dialect for a database type
///
/// # Examples
///
/// ```
/// use sqlweave_db::backends::dialect::dialect_for;
/// use sqlweave_db::backends::types::DatabaseType;
///
/// let dialect = dialect_for(DatabaseType::Mysql);
/// assert_eq!(dialect.quote_identifier("users"), "`users`");
/// assert_eq!(dialect.placeholder(3), "?");
/// ```
pub fn dialect_for(database_type: DatabaseType) -> Arc<dyn Dialect> {
	match database_type {
		DatabaseType::Postgres => Arc::new(PostgresDialect),
		DatabaseType::Sqlite => Arc::new(SqliteDialect),
		DatabaseType::Mysql => Arc::new(MySqlDialect),
		DatabaseType::SqlServer => Arc::new(SqlServerDialect),
	}
}
