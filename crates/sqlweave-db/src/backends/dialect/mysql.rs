//! MySQL dialect implementation

use super::{Dialect, LimitClause};
use crate::backends::types::{DatabaseType, ParamStyle};

/// MySQL/MariaDB dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
	fn database_type(&self) -> DatabaseType {
		DatabaseType::Mysql
	}

	fn quote_identifier(&self, ident: &str) -> String {
		format!("`{}`", ident.replace('`', "``"))
	}

	fn placeholder(&self, _index: usize) -> String {
		"?".to_string()
	}

	fn param_style(&self) -> ParamStyle {
		ParamStyle::Positional
	}

	fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> LimitClause {
		// MySQL has no bare OFFSET; the documented idiom is the largest BIGINT UNSIGNED
		let tail = match (limit, offset) {
			(None, None) => None,
			(Some(rows), None) => Some(format!("LIMIT {}", rows)),
			(Some(rows), Some(skip)) => Some(format!("LIMIT {} OFFSET {}", rows, skip)),
			(None, Some(skip)) => Some(format!("LIMIT {} OFFSET {}", u64::MAX, skip)),
		};
		LimitClause { top: None, tail }
	}

	fn like_escape_suffix(&self) -> &'static str {
		// backslash is itself an escape inside MySQL string literals
		" ESCAPE '\\\\'"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_positional_placeholders() {
		assert_eq!(MySqlDialect.param_style(), ParamStyle::Positional);
		assert_eq!(MySqlDialect.placeholder(1), "?");
		assert_eq!(MySqlDialect.placeholder(7), "?");
	}

	#[rstest]
	fn test_offset_without_limit_uses_max_rows() {
		let clause = MySqlDialect.limit_clause(None, Some(5));

		assert_eq!(
			clause.tail.as_deref(),
			Some("LIMIT 18446744073709551615 OFFSET 5")
		);
	}

	#[rstest]
	fn test_like_escape_suffix_doubles_backslash() {
		assert_eq!(MySqlDialect.like_escape_suffix(), " ESCAPE '\\\\'");
	}
}
