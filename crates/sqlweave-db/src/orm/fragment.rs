//! SQL fragments with parameter slots
//!
//! A [`Fragment`] is SQL text interleaved with references to bound
//! parameters. Parameter references hold the parameter's index in the
//! owning statement's call-ordered parameter list, so fragments can be
//! assembled in any textual order and spliced into other statements by
//! shifting their indices.

use crate::backends::dialect::Dialect;
use crate::backends::types::{ParamStyle, QueryValue};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
	Sql(String),
	Param(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
	pieces: SmallVec<[Piece; 8]>,
}

impl Fragment {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn sql(text: impl Into<String>) -> Self {
		let mut fragment = Self::new();
		fragment.push_sql(&text.into());
		fragment
	}

	pub fn is_empty(&self) -> bool {
		self.pieces.is_empty()
	}

	pub fn pieces(&self) -> &[Piece] {
		&self.pieces
	}

	pub fn push_sql(&mut self, text: &str) {
		if text.is_empty() {
			return;
		}
		if let Some(Piece::Sql(last)) = self.pieces.last_mut() {
			last.push_str(text);
		} else {
			self.pieces.push(Piece::Sql(text.to_string()));
		}
	}

	pub fn push_param(&mut self, index: usize) {
		self.pieces.push(Piece::Param(index));
	}

	/// Bind `value` at the end of `params` and reference it here
	pub fn bind(&mut self, params: &mut Vec<QueryValue>, value: QueryValue) {
		params.push(value);
		self.push_param(params.len() - 1);
	}

	pub fn append(&mut self, other: &Fragment) {
		self.append_shifted(other, 0);
	}

	/// Append `other`, shifting its parameter references by `offset`
	pub fn append_shifted(&mut self, other: &Fragment, offset: usize) {
		for piece in &other.pieces {
			match piece {
				Piece::Sql(text) => self.push_sql(text),
				Piece::Param(index) => self.push_param(index + offset),
			}
		}
	}

	/// Wrap the whole fragment in parentheses
	pub fn parenthesized(&self) -> Fragment {
		let mut wrapped = Fragment::sql("(");
		wrapped.append(self);
		wrapped.push_sql(")");
		wrapped
	}

	/// Parameter references in textual order
	pub fn param_indices(&self) -> impl Iterator<Item = usize> + '_ {
		self.pieces.iter().filter_map(|piece| match piece {
			Piece::Param(index) => Some(*index),
			Piece::Sql(_) => None,
		})
	}

	/// Render to final SQL text plus the parameters it references
	///
	/// Numbered dialects keep the statement's call order (dense renumbering
	/// only drops parameters this fragment does not reference); positional
	/// dialects get the parameters re-sequenced into textual order.
	pub fn render(&self, dialect: &dyn Dialect, params: &[QueryValue]) -> SqlStatement {
		let mut sql = String::new();
		let mut bound = Vec::new();

		match dialect.param_style() {
			ParamStyle::Positional => {
				for piece in &self.pieces {
					match piece {
						Piece::Sql(text) => sql.push_str(text),
						Piece::Param(index) => {
							bound.push(params[*index].clone());
							sql.push_str(&dialect.placeholder(bound.len()));
						}
					}
				}
			}
			ParamStyle::Numbered => {
				let mut used: Vec<usize> = self.param_indices().collect();
				used.sort_unstable();
				used.dedup();
				for piece in &self.pieces {
					match piece {
						Piece::Sql(text) => sql.push_str(text),
						Piece::Param(index) => {
							// `used` holds every referenced index, so the search always hits
							let position = used.binary_search(index).unwrap_or_default();
							sql.push_str(&dialect.placeholder(position + 1));
						}
					}
				}
				bound = used.into_iter().map(|index| params[index].clone()).collect();
			}
		}

		SqlStatement { sql, params: bound }
	}
}

/// A finished statement ready to hand to an executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlStatement {
	pub sql: String,
	pub params: Vec<QueryValue>,
}

impl SqlStatement {
	pub fn into_parts(self) -> (String, Vec<QueryValue>) {
		(self.sql, self.params)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::dialect::{MySqlDialect, PostgresDialect, SqlServerDialect};
	use rstest::{fixture, rstest};

	/// `b = ?` bound first, `a = ?` bound second, but `a` is written first
	#[fixture]
	fn out_of_order() -> (Fragment, Vec<QueryValue>) {
		let mut params = Vec::new();
		let mut where_b = Fragment::sql("b = ");
		where_b.bind(&mut params, QueryValue::Int(2));
		let mut where_a = Fragment::sql("a = ");
		where_a.bind(&mut params, QueryValue::Int(1));

		let mut fragment = where_a;
		fragment.push_sql(" AND ");
		fragment.append(&where_b);
		(fragment, params)
	}

	#[rstest]
	fn test_adjacent_sql_pieces_merge() {
		let mut fragment = Fragment::sql("SELECT ");
		fragment.push_sql("1");

		assert_eq!(fragment.pieces(), &[Piece::Sql("SELECT 1".to_string())]);
	}

	#[rstest]
	fn test_numbered_render_keeps_call_order(out_of_order: (Fragment, Vec<QueryValue>)) {
		let (fragment, params) = out_of_order;

		let statement = fragment.render(&PostgresDialect, &params);

		assert_eq!(statement.sql, "a = $2 AND b = $1");
		assert_eq!(statement.params, vec![QueryValue::Int(2), QueryValue::Int(1)]);
	}

	#[rstest]
	fn test_positional_render_follows_text_order(out_of_order: (Fragment, Vec<QueryValue>)) {
		let (fragment, params) = out_of_order;

		let statement = fragment.render(&MySqlDialect, &params);

		assert_eq!(statement.sql, "a = ? AND b = ?");
		assert_eq!(statement.params, vec![QueryValue::Int(1), QueryValue::Int(2)]);
	}

	#[rstest]
	fn test_unreferenced_params_are_dropped_and_renumbered() {
		let mut params = vec![QueryValue::Int(10), QueryValue::Int(20)];
		let mut fragment = Fragment::sql("x = ");
		fragment.bind(&mut params, QueryValue::Int(30));

		let statement = fragment.render(&SqlServerDialect, &params);

		assert_eq!(statement.sql, "x = @p1");
		assert_eq!(statement.params, vec![QueryValue::Int(30)]);
	}

	#[rstest]
	fn test_append_shifted_offsets_params() {
		let mut inner = Fragment::sql("y = ");
		inner.push_param(0);
		let mut outer = Fragment::sql("x IN (");

		outer.append_shifted(&inner, 3);
		outer.push_sql(")");

		assert_eq!(outer.param_indices().collect::<Vec<_>>(), vec![3]);
		assert_eq!(outer.parenthesized().pieces().len(), 3);
	}
}
