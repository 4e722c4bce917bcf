//! Statement construction errors
//!
//! Every variant is raised while a statement is being built. None of them is
//! transient, so nothing is retried.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
	/// A selector did not reduce to a bare field access
	#[error("Unsupported expression in {context}: `{expression}` is not a field reference")]
	UnsupportedExpression {
		context: &'static str,
		expression: String,
	},

	/// The entity type was never registered
	#[error("No metadata registered for entity `{entity}`")]
	MissingMetadata { entity: String },

	/// The entity is registered but has no such field
	#[error("Entity `{entity}` has no mapped field `{field}`")]
	UnknownColumn { entity: String, field: String },

	/// A reference projection targets an entity without mapped columns
	#[error("Reference `{path}` targets entity `{entity}` which has no mapped columns")]
	EmptyProjection { entity: String, path: String },

	/// The requested combination of clauses cannot be rendered
	#[error("Invalid statement: {0}")]
	InvalidStatement(String),
}

impl QueryError {
	pub(crate) fn unsupported(context: &'static str, expression: impl ToString) -> Self {
		Self::UnsupportedExpression {
			context,
			expression: expression.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, QueryError>;
