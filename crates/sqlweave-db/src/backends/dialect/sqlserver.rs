//! SQL Server dialect implementation

use super::{Dialect, LimitClause};
use crate::backends::types::DatabaseType;

/// Microsoft SQL Server dialect
///
/// Row limiting uses `SELECT TOP n` when there is nothing to skip and
/// `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
	fn database_type(&self) -> DatabaseType {
		DatabaseType::SqlServer
	}

	fn quote_identifier(&self, ident: &str) -> String {
		format!("[{}]", ident.replace(']', "]]"))
	}

	fn placeholder(&self, index: usize) -> String {
		format!("@p{}", index)
	}

	fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> LimitClause {
		match (limit, offset) {
			(None, None) => LimitClause::default(),
			(Some(rows), None) => LimitClause {
				top: Some(format!("TOP {}", rows)),
				tail: None,
			},
			(Some(rows), Some(skip)) => LimitClause {
				top: None,
				tail: Some(format!(
					"OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
					skip, rows
				)),
			},
			(None, Some(skip)) => LimitClause {
				top: None,
				tail: Some(format!("OFFSET {} ROWS", skip)),
			},
		}
	}

	fn offset_requires_order(&self) -> bool {
		true
	}

	/// Also escapes `[`, which opens a character class in T-SQL `LIKE`
	fn escape_like(&self, value: &str) -> String {
		let mut escaped = String::with_capacity(value.len());
		for ch in value.chars() {
			if matches!(ch, '\\' | '%' | '_' | '[') {
				escaped.push('\\');
			}
			escaped.push(ch);
		}
		escaped
	}
}
