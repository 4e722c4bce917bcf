//! Expression-to-SQL fragment compiler
//!
//! Walks an [`Expr`] tree once, resolving every field reference through the
//! metadata registry and quoting it with the dialect. Literal operands are
//! bound as parameters in traversal order (left to right, depth first).

use super::error::{QueryError, Result};
use super::expressions::{BinaryOp, ColumnRef, Expr, Method, UnaryOp};
use super::fragment::Fragment;
use super::model::{EntityDescriptor, EntityKey, Slot};
use super::registry::MetadataRegistry;
use crate::backends::dialect::Dialect;
use crate::backends::types::QueryValue;

/// Where a sub-expression sits, which decides how bare columns compile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
	/// Operand of a comparison, arithmetic or function
	Value,
	/// Stand-alone condition (top level, AND/OR/NOT operand)
	Condition,
}

/// A field reference resolved against its entity metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
	pub descriptor: &'static EntityDescriptor,
	/// Quoted table alias or (schema-qualified) table name
	pub qualifier: String,
	pub column: &'static str,
	/// `qualifier.quoted_column`
	pub sql: String,
}

/// Compiles selectors and predicates over one or two entity shapes
pub struct ExpressionCompiler<'a> {
	registry: &'a MetadataRegistry,
	dialect: &'a dyn Dialect,
	aliases: [Option<&'a str>; 2],
}

impl<'a> ExpressionCompiler<'a> {
	pub fn new(registry: &'a MetadataRegistry, dialect: &'a dyn Dialect) -> Self {
		Self {
			registry,
			dialect,
			aliases: [None, None],
		}
	}

	/// Use `alias` instead of the table name when qualifying columns of `slot`
	pub fn with_alias(mut self, slot: Slot, alias: Option<&'a str>) -> Self {
		if let Some(entry) = self.aliases.get_mut(slot as usize) {
			*entry = alias;
		}
		self
	}

	pub fn dialect(&self) -> &'a dyn Dialect {
		self.dialect
	}

	pub fn registry(&self) -> &'a MetadataRegistry {
		self.registry
	}

	/// Quoted qualifier for columns of `descriptor` seen through `slot`
	pub fn qualifier(&self, descriptor: &EntityDescriptor, slot: Slot) -> String {
		self.qualify(descriptor, self.aliases.get(slot as usize).copied().flatten())
	}

	/// Quoted `alias`, or the quoted (schema-qualified) table name without one
	pub fn qualify(&self, descriptor: &EntityDescriptor, alias: Option<&str>) -> String {
		match alias {
			Some(alias) => self.dialect.quote_identifier(alias),
			None => self.dialect.quote_table(descriptor.schema, descriptor.table),
		}
	}

	pub fn resolve_column(&self, column: &ColumnRef) -> Result<ResolvedColumn> {
		let descriptor = self.registry.resolve(column.entity)?;
		let mapped = descriptor
			.column(column.field)
			.ok_or_else(|| QueryError::UnknownColumn {
				entity: descriptor.name.to_string(),
				field: column.field.to_string(),
			})?;
		let qualifier = self.qualifier(descriptor, column.slot);
		let sql = format!(
			"{}.{}",
			qualifier,
			self.dialect.quote_identifier(mapped.column_name())
		);
		Ok(ResolvedColumn {
			descriptor,
			qualifier,
			column: mapped.column_name(),
			sql,
		})
	}

	/// Resolve a selector that must be a bare field access
	///
	/// Anything else (arithmetic, function calls, literals) is rejected with
	/// [`QueryError::UnsupportedExpression`].
	pub fn field_reference(&self, expr: &Expr, context: &'static str) -> Result<ResolvedColumn> {
		match expr {
			Expr::Column(column) => self.resolve_column(column),
			other => Err(QueryError::unsupported(context, other)),
		}
	}

	/// Resolve an ordered column list
	///
	/// No selectors expands to every mapped column of `entity` (seen through
	/// `slot`) in declaration order; otherwise exactly the given fields are
	/// resolved in caller order.
	pub fn column_list(
		&self,
		entity: EntityKey,
		slot: Slot,
		selectors: &[Expr],
		context: &'static str,
	) -> Result<Vec<ResolvedColumn>> {
		if selectors.is_empty() {
			let descriptor = self.registry.resolve(entity)?;
			let qualifier = self.qualifier(descriptor, slot);
			return Ok(descriptor
				.columns
				.iter()
				.map(|mapped| ResolvedColumn {
					descriptor,
					qualifier: qualifier.clone(),
					column: mapped.column_name(),
					sql: format!(
						"{}.{}",
						qualifier,
						self.dialect.quote_identifier(mapped.column_name())
					),
				})
				.collect());
		}

		selectors
			.iter()
			.map(|expr| self.field_reference(expr, context))
			.collect()
	}

	/// Compile a boolean predicate, binding literals into `params`
	pub fn compile_predicate(&self, expr: &Expr, params: &mut Vec<QueryValue>) -> Result<Fragment> {
		let mut out = Fragment::new();
		self.write(expr, Position::Condition, &mut out, params)?;
		tracing::trace!(expression = %expr, "compiled predicate");
		Ok(out)
	}

	/// Compile a value expression (no implicit boolean comparison)
	pub fn compile_value(&self, expr: &Expr, params: &mut Vec<QueryValue>) -> Result<Fragment> {
		let mut out = Fragment::new();
		self.write(expr, Position::Value, &mut out, params)?;
		Ok(out)
	}

	fn write(
		&self,
		expr: &Expr,
		position: Position,
		out: &mut Fragment,
		params: &mut Vec<QueryValue>,
	) -> Result<()> {
		match expr {
			Expr::Column(column) => {
				let resolved = self.resolve_column(column)?;
				match position {
					Position::Value => out.push_sql(&resolved.sql),
					Position::Condition => {
						out.push_sql("(");
						out.push_sql(&resolved.sql);
						out.push_sql(" = ");
						out.bind(params, QueryValue::Bool(true));
						out.push_sql(")");
					}
				}
			}
			Expr::Value(QueryValue::Null) => out.push_sql("NULL"),
			Expr::Value(value) => out.bind(params, value.clone()),
			Expr::Unary { op, expr: inner } => match op {
				UnaryOp::Not => {
					out.push_sql("NOT (");
					self.write(inner, Position::Condition, out, params)?;
					out.push_sql(")");
				}
				UnaryOp::Neg => {
					out.push_sql("-(");
					self.write(inner, Position::Value, out, params)?;
					out.push_sql(")");
				}
			},
			Expr::Binary { op, left, right } => self.write_binary(*op, left, right, out, params)?,
			Expr::Call {
				method,
				target,
				args,
			} => self.write_call(*method, target, args, out, params)?,
		}
		Ok(())
	}

	fn write_binary(
		&self,
		op: BinaryOp,
		left: &Expr,
		right: &Expr,
		out: &mut Fragment,
		params: &mut Vec<QueryValue>,
	) -> Result<()> {
		if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
			let null_test = match (left, right) {
				(operand, Expr::Value(QueryValue::Null)) | (Expr::Value(QueryValue::Null), operand) => {
					Some(operand)
				}
				_ => None,
			};
			if let Some(operand) = null_test {
				out.push_sql("(");
				self.write(operand, Position::Value, out, params)?;
				out.push_sql(if op == BinaryOp::Eq {
					" IS NULL)"
				} else {
					" IS NOT NULL)"
				});
				return Ok(());
			}
		}

		let operand_position = if op.is_logical() {
			Position::Condition
		} else {
			Position::Value
		};
		out.push_sql("(");
		self.write(left, operand_position, out, params)?;
		out.push_sql(" ");
		out.push_sql(op.as_sql());
		out.push_sql(" ");
		self.write(right, operand_position, out, params)?;
		out.push_sql(")");
		Ok(())
	}

	fn write_call(
		&self,
		method: Method,
		target: &Expr,
		args: &[Expr],
		out: &mut Fragment,
		params: &mut Vec<QueryValue>,
	) -> Result<()> {
		let call = || Expr::call(method, target.clone(), args.to_vec());
		match method {
			Method::Lower | Method::Upper => {
				out.push_sql(if method == Method::Lower {
					"LOWER("
				} else {
					"UPPER("
				});
				self.write(target, Position::Value, out, params)?;
				out.push_sql(")");
			}
			Method::IsNull | Method::IsNotNull => {
				out.push_sql("(");
				self.write(target, Position::Value, out, params)?;
				out.push_sql(if method == Method::IsNull {
					" IS NULL)"
				} else {
					" IS NOT NULL)"
				});
			}
			Method::Between => {
				let [low, high] = args else {
					return Err(QueryError::unsupported("BETWEEN", call()));
				};
				out.push_sql("(");
				self.write(target, Position::Value, out, params)?;
				out.push_sql(" BETWEEN ");
				self.write(low, Position::Value, out, params)?;
				out.push_sql(" AND ");
				self.write(high, Position::Value, out, params)?;
				out.push_sql(")");
			}
			Method::In | Method::NotIn => {
				let [Expr::Value(values @ QueryValue::List(_))] = args else {
					return Err(QueryError::unsupported("IN", call()));
				};
				self.write(target, Position::Value, out, params)?;
				out.push_sql(if method == Method::In {
					" IN ("
				} else {
					" NOT IN ("
				});
				out.bind(params, values.clone());
				out.push_sql(")");
			}
			Method::Like | Method::Contains | Method::StartsWith | Method::EndsWith => {
				let [Expr::Value(QueryValue::String(text))] = args else {
					return Err(QueryError::unsupported("LIKE", call()));
				};
				self.write(target, Position::Value, out, params)?;
				out.push_sql(" LIKE ");
				let pattern = match method {
					Method::Like => text.clone(),
					Method::Contains => format!("%{}%", self.dialect.escape_like(text)),
					Method::StartsWith => format!("{}%", self.dialect.escape_like(text)),
					_ => format!("%{}", self.dialect.escape_like(text)),
				};
				out.bind(params, QueryValue::String(pattern));
				if method != Method::Like {
					out.push_sql(self.dialect.like_escape_suffix());
				}
			}
		}
		Ok(())
	}
}
