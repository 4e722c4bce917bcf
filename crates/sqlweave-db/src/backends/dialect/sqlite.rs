//! SQLite dialect implementation

use super::{Dialect, LimitClause};
use crate::backends::types::DatabaseType;

/// SQLite dialect
///
/// Uses numbered `?NNN` placeholders so parameters may appear out of textual order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
	fn database_type(&self) -> DatabaseType {
		DatabaseType::Sqlite
	}

	fn placeholder(&self, index: usize) -> String {
		format!("?{}", index)
	}

	fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> LimitClause {
		// SQLite only accepts OFFSET as part of a LIMIT clause
		let tail = match (limit, offset) {
			(None, None) => None,
			(Some(rows), None) => Some(format!("LIMIT {}", rows)),
			(Some(rows), Some(skip)) => Some(format!("LIMIT {} OFFSET {}", rows, skip)),
			(None, Some(skip)) => Some(format!("LIMIT -1 OFFSET {}", skip)),
		};
		LimitClause { top: None, tail }
	}
}
