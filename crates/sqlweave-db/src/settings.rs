//! Compiler settings
//!
//! Settings can be built in code, loaded from a `.toml` or `.json` file, or
//! read from `SQLWEAVE_*` environment variables.
//!
//! ```toml
//! dialect = "mysql"
//! reference_separator = "__"
//! log_sql = true
//! ```

use crate::backends::types::DatabaseType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Characters a reference separator may not contain, since they would end a
/// quoted identifier in one of the supported dialects
const FORBIDDEN_SEPARATOR_CHARS: &[char] = &['"', '`', '[', ']', '\''];

/// Settings shared by every statement built from one context
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
	/// Target database
	#[serde(default = "default_dialect")]
	pub dialect: DatabaseType,

	/// Joins reference path segments in projected column aliases
	#[serde(default = "default_reference_separator")]
	pub reference_separator: String,

	/// Include the full SQL text in `debug` events when a statement is built
	#[serde(default)]
	pub log_sql: bool,
}

fn default_dialect() -> DatabaseType {
	DatabaseType::Postgres
}

fn default_reference_separator() -> String {
	"__".to_string()
}

impl Default for CompilerSettings {
	fn default() -> Self {
		Self {
			dialect: default_dialect(),
			reference_separator: default_reference_separator(),
			log_sql: false,
		}
	}
}

impl CompilerSettings {
	/// Default settings for `dialect`
	pub fn for_dialect(dialect: DatabaseType) -> Self {
		Self {
			dialect,
			..Self::default()
		}
	}

	pub fn with_reference_separator(mut self, separator: impl Into<String>) -> Self {
		self.reference_separator = separator.into();
		self
	}

	pub fn with_log_sql(mut self, log_sql: bool) -> Self {
		self.log_sql = log_sql;
		self
	}

	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.reference_separator.is_empty() {
			return Err(SettingsError::ValidationError(
				"reference_separator must not be empty".to_string(),
			));
		}
		if let Some(ch) = self
			.reference_separator
			.chars()
			.find(|ch| FORBIDDEN_SEPARATOR_CHARS.contains(ch) || ch.is_whitespace())
		{
			return Err(SettingsError::ValidationError(format!(
				"reference_separator contains forbidden character {:?}",
				ch
			)));
		}
		Ok(())
	}

	/// Load settings from the process environment
	///
	/// Reads `SQLWEAVE_DIALECT`, `SQLWEAVE_REFERENCE_SEPARATOR` and
	/// `SQLWEAVE_LOG_SQL`; unset variables keep their defaults.
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Load settings from an arbitrary variable lookup
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
		let mut settings = Self::default();

		if let Some(name) = lookup("SQLWEAVE_DIALECT") {
			settings.dialect = DatabaseType::from_name(&name).ok_or_else(|| {
				SettingsError::ValidationError(format!("unknown dialect `{}`", name))
			})?;
		}

		if let Some(separator) = lookup("SQLWEAVE_REFERENCE_SEPARATOR") {
			settings.reference_separator = separator;
		}

		if let Some(log_sql) = lookup("SQLWEAVE_LOG_SQL") {
			settings.log_sql = log_sql.to_lowercase() == "true" || log_sql == "1";
		}

		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a `.toml` or `.json` file
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		let settings: CompilerSettings = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::parse_toml(&contents)?,
			Some("json") => serde_json::from_str(&contents)
				.map_err(|e| SettingsError::ParseError(format!("JSON parse error: {}", e)))?,
			_ => {
				return Err(SettingsError::UnsupportedFormat(
					"Supported formats: .toml, .json".to_string(),
				));
			}
		};

		settings.validate()?;
		tracing::debug!(path = %path.display(), dialect = %settings.dialect, "loaded compiler settings");
		Ok(settings)
	}

	/// Parse settings from TOML text
	pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
		let settings = Self::parse_toml(contents)?;
		settings.validate()?;
		Ok(settings)
	}

	fn parse_toml(contents: &str) -> Result<Self, SettingsError> {
		toml::from_str(contents)
			.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))
	}
}

/// Settings errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),
}
