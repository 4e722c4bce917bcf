//! Common type definitions shared by dialects and the compiler

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
	Postgres,
	Sqlite,
	Mysql,
	#[serde(alias = "mssql")]
	SqlServer,
}

impl DatabaseType {
	/// Parse a database type from its configuration name
	///
	/// # Examples
	///
	/// ```
	/// use sqlweave_db::backends::types::DatabaseType;
	///
	/// assert_eq!(DatabaseType::from_name("postgresql"), Some(DatabaseType::Postgres));
	/// assert_eq!(DatabaseType::from_name("MSSQL"), Some(DatabaseType::SqlServer));
	/// assert_eq!(DatabaseType::from_name("oracle"), None);
	/// ```
	pub fn from_name(name: &str) -> Option<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"postgres" | "postgresql" | "pg" => Some(Self::Postgres),
			"sqlite" | "sqlite3" => Some(Self::Sqlite),
			"mysql" | "mariadb" => Some(Self::Mysql),
			"sqlserver" | "mssql" => Some(Self::SqlServer),
			_ => None,
		}
	}
}

impl fmt::Display for DatabaseType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			DatabaseType::Postgres => "postgres",
			DatabaseType::Sqlite => "sqlite",
			DatabaseType::Mysql => "mysql",
			DatabaseType::SqlServer => "sqlserver",
		};
		f.write_str(name)
	}
}

/// How a dialect expects bound parameters to be referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
	/// Placeholders carry an index (`$1`, `?1`, `@p1`), so textual order is free
	Numbered,
	/// Placeholders are anonymous (`?`) and bind in textual order
	Positional,
}

/// Query value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Bytes(Vec<u8>),
	Timestamp(chrono::DateTime<chrono::Utc>),
	Uuid(Uuid),
	/// A whole value set bound to a single placeholder (`IN (@p)`)
	List(Vec<QueryValue>),
}

impl QueryValue {
	pub fn is_null(&self) -> bool {
		matches!(self, QueryValue::Null)
	}

	/// Short, log-friendly rendering that never prints full payloads
	pub fn kind(&self) -> &'static str {
		match self {
			QueryValue::Null => "null",
			QueryValue::Bool(_) => "bool",
			QueryValue::Int(_) => "int",
			QueryValue::Float(_) => "float",
			QueryValue::String(_) => "string",
			QueryValue::Bytes(_) => "bytes",
			QueryValue::Timestamp(_) => "timestamp",
			QueryValue::Uuid(_) => "uuid",
			QueryValue::List(_) => "list",
		}
	}
}

impl fmt::Display for QueryValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			QueryValue::Null => f.write_str("NULL"),
			QueryValue::Bool(b) => write!(f, "{}", b),
			QueryValue::Int(i) => write!(f, "{}", i),
			QueryValue::Float(v) => write!(f, "{}", v),
			QueryValue::String(s) => write!(f, "'{}'", s),
			QueryValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
			QueryValue::Timestamp(dt) => write!(f, "'{}'", dt.to_rfc3339()),
			QueryValue::Uuid(u) => write!(f, "'{}'", u),
			QueryValue::List(values) => {
				f.write_str("[")?;
				for (i, value) in values.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}", value)?;
				}
				f.write_str("]")
			}
		}
	}
}

impl From<&str> for QueryValue {
	fn from(s: &str) -> Self {
		QueryValue::String(s.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(s: String) -> Self {
		QueryValue::String(s)
	}
}

impl From<i64> for QueryValue {
	fn from(i: i64) -> Self {
		QueryValue::Int(i)
	}
}

impl From<i32> for QueryValue {
	fn from(i: i32) -> Self {
		QueryValue::Int(i as i64)
	}
}

impl From<f64> for QueryValue {
	fn from(f: f64) -> Self {
		QueryValue::Float(f)
	}
}

impl From<bool> for QueryValue {
	fn from(b: bool) -> Self {
		QueryValue::Bool(b)
	}
}

impl From<chrono::DateTime<chrono::Utc>> for QueryValue {
	fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
		QueryValue::Timestamp(dt)
	}
}

impl From<Uuid> for QueryValue {
	fn from(u: Uuid) -> Self {
		QueryValue::Uuid(u)
	}
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(QueryValue::Null)
	}
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
	fn from(values: Vec<T>) -> Self {
		QueryValue::List(values.into_iter().map(Into::into).collect())
	}
}
