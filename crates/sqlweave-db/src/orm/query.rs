//! Fluent SELECT statement builder
//!
//! Every builder call compiles its selectors or predicate immediately,
//! appends the resulting fragment to the matching clause and binds its
//! parameters in call order. Errors therefore surface at the call that
//! caused them, not when the statement is finalized.
//!
//! ```
//! use sqlweave_db::entity;
//! use sqlweave_db::backends::PostgresDialect;
//! use sqlweave_db::orm::SqlContext;
//! use std::sync::Arc;
//!
//! struct Book;
//! entity!(Book => "books" { id: i64, title: String, pages: i32 });
//!
//! let ctx = SqlContext::new(Arc::new(PostgresDialect));
//! let statement = ctx
//!     .select::<Book>()?
//!     .select(|b| (b.id, b.title))?
//!     .filter(|b| b.pages.gt(300))?
//!     .order_by_desc(|b| b.pages)?
//!     .limit(5)
//!     .build();
//!
//! assert_eq!(
//!     statement.sql,
//!     "SELECT \"books\".\"id\", \"books\".\"title\" FROM \"books\" \
//!      WHERE (\"books\".\"pages\" > $1) ORDER BY \"books\".\"pages\" DESC LIMIT 5"
//! );
//! # Ok::<(), sqlweave_db::orm::QueryError>(())
//! ```

use super::compiler::{ExpressionCompiler, ResolvedColumn};
use super::error::{QueryError, Result};
use super::expressions::{BinaryOp, Expr, Operand, Predicate, Selection};
use super::fragment::{Fragment, SqlStatement};
use super::model::{Entity, EntityDescriptor, EntityKey, Field, FieldSet};
use super::projection::{ProjectedColumn, ReferenceBuilder};
use super::registry::MetadataRegistry;
use crate::backends::dialect::{Dialect, dialect_for};
use crate::backends::types::QueryValue;
use crate::settings::{CompilerSettings, SettingsError};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Shared ingredients of statement construction
///
/// Cheap to clone: the registry and dialect are reference counted.
#[derive(Clone)]
pub struct SqlContext {
	registry: Arc<MetadataRegistry>,
	dialect: Arc<dyn Dialect>,
	settings: CompilerSettings,
}

impl SqlContext {
	/// Context over the global registry with default settings for `dialect`
	pub fn new(dialect: Arc<dyn Dialect>) -> Self {
		let settings = CompilerSettings::for_dialect(dialect.database_type());
		Self {
			registry: MetadataRegistry::global(),
			dialect,
			settings,
		}
	}

	/// Context over the global registry configured by `settings`
	pub fn from_settings(settings: CompilerSettings) -> std::result::Result<Self, SettingsError> {
		settings.validate()?;
		Ok(Self {
			registry: MetadataRegistry::global(),
			dialect: dialect_for(settings.dialect),
			settings,
		})
	}

	/// Replace the metadata registry
	pub fn with_registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
		self.registry = registry;
		self
	}

	pub fn registry(&self) -> &MetadataRegistry {
		&self.registry
	}

	pub fn dialect(&self) -> &dyn Dialect {
		self.dialect.as_ref()
	}

	pub fn settings(&self) -> &CompilerSettings {
		&self.settings
	}

	fn compiler<'s>(&'s self, alias: Option<&'s str>) -> ExpressionCompiler<'s> {
		ExpressionCompiler::new(&self.registry, self.dialect.as_ref()).with_alias(0, alias)
	}

	/// Start a SELECT over the table of `E`
	pub fn select<E: Entity>(&self) -> Result<SelectStatement<E>> {
		let descriptor = self.registry.resolve(EntityKey::of::<E>())?;
		if descriptor.columns.is_empty() {
			return Err(QueryError::InvalidStatement(format!(
				"entity `{}` has no mapped columns to select",
				descriptor.name
			)));
		}
		Ok(SelectStatement::new(self.clone(), descriptor))
	}

	/// Quoted `table.column` of a single field selector
	pub fn column<E: Entity, X: Into<Expr>>(
		&self,
		selector: impl FnOnce(E::Fields) -> X,
	) -> Result<String> {
		let resolved = self
			.compiler(None)
			.field_reference(&selector(E::fields()).into(), "column")?;
		Ok(resolved.sql)
	}

	/// Quoted column list; an empty selection yields every mapped column
	pub fn columns<E: Entity, S: Selection>(
		&self,
		selector: impl FnOnce(E::Fields) -> S,
	) -> Result<Vec<String>> {
		let columns = self.compiler(None).column_list(
			EntityKey::of::<E>(),
			0,
			&selector(E::fields()).into_exprs(),
			"column list",
		)?;
		Ok(columns.into_iter().map(|column| column.sql).collect())
	}
}

impl fmt::Debug for SqlContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SqlContext")
			.field("dialect", &self.dialect.database_type())
			.field("entities", &self.registry.len())
			.field("settings", &self.settings)
			.finish()
	}
}

/// SQL join type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
	Inner,
	Left,
	Right,
	Full,
	Cross,
}

impl JoinKind {
	pub fn as_sql(&self) -> &'static str {
		match self {
			JoinKind::Inner => "INNER JOIN",
			JoinKind::Left => "LEFT JOIN",
			JoinKind::Right => "RIGHT JOIN",
			JoinKind::Full => "FULL JOIN",
			JoinKind::Cross => "CROSS JOIN",
		}
	}
}

/// Conditions joined by AND/OR
///
/// The accumulated text is parenthesized whenever the connective changes,
/// so `a OR b` followed by an AND filter reads `(a OR b) AND c`.
#[derive(Debug, Clone, Default)]
struct Conditions {
	fragment: Fragment,
	connective: Option<BinaryOp>,
}

impl Conditions {
	fn push(&mut self, condition: Fragment, connective: BinaryOp) {
		if self.fragment.is_empty() {
			self.fragment = condition;
			return;
		}
		if self.connective.is_some_and(|previous| previous != connective) {
			self.fragment = self.fragment.parenthesized();
		}
		self.fragment.push_sql(" ");
		self.fragment.push_sql(connective.as_sql());
		self.fragment.push_sql(" ");
		self.fragment.append(&condition);
		self.connective = Some(connective);
	}

	fn is_empty(&self) -> bool {
		self.fragment.is_empty()
	}
}

/// A SELECT statement over entity `E` under construction
///
/// Owned by a single caller while it is being built; it is deliberately
/// not `Sync`.
pub struct SelectStatement<E: Entity> {
	context: SqlContext,
	descriptor: &'static EntityDescriptor,
	alias: Option<String>,
	distinct: bool,
	columns: Vec<String>,
	joins: Vec<Fragment>,
	conditions: Conditions,
	group_by: Vec<String>,
	having: Conditions,
	order_by: Vec<String>,
	limit: Option<u64>,
	offset: Option<u64>,
	params: Vec<QueryValue>,
	_entity: PhantomData<fn() -> E>,
	_single_writer: PhantomData<Cell<()>>,
}

impl<E: Entity> SelectStatement<E> {
	fn new(context: SqlContext, descriptor: &'static EntityDescriptor) -> Self {
		Self {
			context,
			descriptor,
			alias: None,
			distinct: false,
			columns: Vec::new(),
			joins: Vec::new(),
			conditions: Conditions::default(),
			group_by: Vec::new(),
			having: Conditions::default(),
			order_by: Vec::new(),
			limit: None,
			offset: None,
			params: Vec::new(),
			_entity: PhantomData,
			_single_writer: PhantomData,
		}
	}

	/// Alias the root table
	///
	/// Clauses are compiled as they are added, so the alias has to be set
	/// before any of them.
	pub fn alias(mut self, alias: impl Into<String>) -> Result<Self> {
		let alias = alias.into();
		if self.has_compiled_clauses() {
			return Err(QueryError::InvalidStatement(format!(
				"alias `{}` must be set before any clause is added",
				alias
			)));
		}
		self.alias = Some(alias);
		Ok(self)
	}

	fn has_compiled_clauses(&self) -> bool {
		!self.conditions.is_empty()
			|| !self.joins.is_empty()
			|| !self.order_by.is_empty()
			|| !self.group_by.is_empty()
			|| !self.having.is_empty()
			|| !self.columns.is_empty()
	}

	/// Parameters bound so far, in call order
	pub fn params(&self) -> &[QueryValue] {
		&self.params
	}

	pub fn context(&self) -> &SqlContext {
		&self.context
	}

	fn root_columns(&self, selectors: &[Expr], context: &'static str) -> Result<Vec<ResolvedColumn>> {
		self.context
			.compiler(self.alias.as_deref())
			.column_list(EntityKey::of::<E>(), 0, selectors, context)
	}

	// WHERE

	/// Add a predicate, AND-ed with the existing WHERE clause
	pub fn filter<P: Predicate>(self, predicate: impl FnOnce(E::Fields) -> P) -> Result<Self> {
		let expr = predicate(E::fields()).into_predicate();
		self.push_predicate(&expr, BinaryOp::And)
	}

	/// Add a predicate, OR-ed with the existing WHERE clause
	pub fn or_filter<P: Predicate>(self, predicate: impl FnOnce(E::Fields) -> P) -> Result<Self> {
		let expr = predicate(E::fields()).into_predicate();
		self.push_predicate(&expr, BinaryOp::Or)
	}

	/// Add a predicate over the root entity and a joined entity `J`
	///
	/// `alias` must match the alias `J` was joined under, if any.
	pub fn filter_with<J: Entity, P: Predicate>(
		mut self,
		alias: Option<&str>,
		predicate: impl FnOnce(E::Fields, J::Fields) -> P,
	) -> Result<Self> {
		let expr = predicate(E::fields(), J::Fields::at_slot(1)).into_predicate();
		let fragment = self
			.context
			.compiler(self.alias.as_deref())
			.with_alias(1, alias)
			.compile_predicate(&expr, &mut self.params)?;
		self.conditions.push(fragment, BinaryOp::And);
		Ok(self)
	}

	fn push_predicate(mut self, expr: &Expr, connective: BinaryOp) -> Result<Self> {
		let fragment = self
			.context
			.compiler(self.alias.as_deref())
			.compile_predicate(expr, &mut self.params)?;
		self.conditions.push(fragment, connective);
		Ok(self)
	}

	/// Append a hand-written condition
	///
	/// Each `{}` in `sql` is replaced by a placeholder for the next value of
	/// `params`; the number of slots and values must agree.
	pub fn filter_raw<V: Into<QueryValue>>(
		mut self,
		sql: &str,
		params: impl IntoIterator<Item = V>,
	) -> Result<Self> {
		let values: Vec<QueryValue> = params.into_iter().map(Into::into).collect();
		let slots = sql.matches("{}").count();
		if slots != values.len() {
			return Err(QueryError::InvalidStatement(format!(
				"raw condition has {} parameter slots but {} values",
				slots,
				values.len()
			)));
		}

		let mut fragment = Fragment::sql("(");
		let mut values = values.into_iter();
		for (i, text) in sql.split("{}").enumerate() {
			if i > 0 {
				if let Some(value) = values.next() {
					fragment.bind(&mut self.params, value);
				}
			}
			fragment.push_sql(text);
		}
		fragment.push_sql(")");
		self.conditions.push(fragment, BinaryOp::And);
		Ok(self)
	}

	/// `column IN (<one placeholder>)` with the whole set bound as one list
	pub fn where_in<T, V>(
		self,
		selector: impl FnOnce(E::Fields) -> Field<E, T>,
		values: impl IntoIterator<Item = V>,
	) -> Result<Self>
	where
		V: Operand<T> + Into<QueryValue>,
	{
		self.in_values(selector(E::fields()).expr(), values, false)
	}

	pub fn where_not_in<T, V>(
		self,
		selector: impl FnOnce(E::Fields) -> Field<E, T>,
		values: impl IntoIterator<Item = V>,
	) -> Result<Self>
	where
		V: Operand<T> + Into<QueryValue>,
	{
		self.in_values(selector(E::fields()).expr(), values, true)
	}

	fn in_values<V: Into<QueryValue>>(
		mut self,
		target: Expr,
		values: impl IntoIterator<Item = V>,
		negated: bool,
	) -> Result<Self> {
		let column = self
			.context
			.compiler(self.alias.as_deref())
			.field_reference(&target, "IN")?;
		let list = QueryValue::List(values.into_iter().map(Into::into).collect());

		let mut fragment = Fragment::sql(&column.sql);
		fragment.push_sql(if negated { " NOT IN (" } else { " IN (" });
		fragment.bind(&mut self.params, list);
		fragment.push_sql(")");
		self.conditions.push(fragment, BinaryOp::And);
		Ok(self)
	}

	/// `column IN (<sub-statement>)`
	///
	/// The sub-statement's parameters are spliced in at this point of the
	/// call order, keeping their own relative order.
	pub fn where_in_subquery<S: Entity, T>(
		self,
		selector: impl FnOnce(E::Fields) -> Field<E, T>,
		subquery: SelectStatement<S>,
	) -> Result<Self> {
		self.in_subquery(selector(E::fields()).expr(), subquery, false)
	}

	pub fn where_not_in_subquery<S: Entity, T>(
		self,
		selector: impl FnOnce(E::Fields) -> Field<E, T>,
		subquery: SelectStatement<S>,
	) -> Result<Self> {
		self.in_subquery(selector(E::fields()).expr(), subquery, true)
	}

	fn in_subquery<S: Entity>(
		mut self,
		target: Expr,
		subquery: SelectStatement<S>,
		negated: bool,
	) -> Result<Self> {
		let ours = self.context.dialect.database_type();
		let theirs = subquery.context.dialect.database_type();
		if ours != theirs {
			return Err(QueryError::InvalidStatement(format!(
				"sub-statement built for {} cannot be nested in a {} statement",
				theirs, ours
			)));
		}

		let column = self
			.context
			.compiler(self.alias.as_deref())
			.field_reference(&target, "IN")?;
		let base = self.params.len();
		let inner = subquery.assemble();
		self.params.extend(subquery.params);

		let mut fragment = Fragment::sql(&column.sql);
		fragment.push_sql(if negated { " NOT IN (" } else { " IN (" });
		fragment.append_shifted(&inner, base);
		fragment.push_sql(")");
		self.conditions.push(fragment, BinaryOp::And);
		Ok(self)
	}

	// JOIN

	/// Join `J` on `left = right`
	pub fn join<J: Entity, X: Into<Expr>, Y: Into<Expr>>(
		self,
		kind: JoinKind,
		left: impl FnOnce(E::Fields) -> X,
		right: impl FnOnce(J::Fields) -> Y,
	) -> Result<Self> {
		let root_alias = self.alias.clone();
		let left = left(E::fields()).into();
		let right = right(J::Fields::at_slot(1)).into();
		self.join_keys::<J>(kind, root_alias.as_deref(), None, left, right)
	}

	/// Join `J` under `alias` on `left = right`
	pub fn join_as<J: Entity, X: Into<Expr>, Y: Into<Expr>>(
		self,
		kind: JoinKind,
		alias: &str,
		left: impl FnOnce(E::Fields) -> X,
		right: impl FnOnce(J::Fields) -> Y,
	) -> Result<Self> {
		let root_alias = self.alias.clone();
		let left = left(E::fields()).into();
		let right = right(J::Fields::at_slot(1)).into();
		self.join_keys::<J>(kind, root_alias.as_deref(), Some(alias), left, right)
	}

	/// `LEFT JOIN` shorthand for [`join`](Self::join)
	pub fn left_join<J: Entity, X: Into<Expr>, Y: Into<Expr>>(
		self,
		left: impl FnOnce(E::Fields) -> X,
		right: impl FnOnce(J::Fields) -> Y,
	) -> Result<Self> {
		self.join::<J, X, Y>(JoinKind::Left, left, right)
	}

	/// Join `J` to an already joined entity `L`
	///
	/// `left_alias` is the alias `L` was joined under, `alias` the one for `J`.
	pub fn join_from<L: Entity, J: Entity, X: Into<Expr>, Y: Into<Expr>>(
		self,
		kind: JoinKind,
		left_alias: Option<&str>,
		alias: Option<&str>,
		left: impl FnOnce(L::Fields) -> X,
		right: impl FnOnce(J::Fields) -> Y,
	) -> Result<Self> {
		let left = left(L::fields()).into();
		let right = right(J::Fields::at_slot(1)).into();
		self.join_keys::<J>(kind, left_alias, alias, left, right)
	}

	fn join_keys<J: Entity>(
		mut self,
		kind: JoinKind,
		left_alias: Option<&str>,
		alias: Option<&str>,
		left: Expr,
		right: Expr,
	) -> Result<Self> {
		if kind == JoinKind::Cross {
			return Err(QueryError::InvalidStatement(
				"CROSS JOIN takes no ON condition".to_string(),
			));
		}
		let compiler = self.context.compiler(left_alias).with_alias(1, alias);
		let left_column = compiler.field_reference(&left, "JOIN")?;
		let right_column = compiler.field_reference(&right, "JOIN")?;

		let mut fragment = self.join_target::<J>(kind, alias)?;
		fragment.push_sql(" ON ");
		fragment.push_sql(&left_column.sql);
		fragment.push_sql(" = ");
		fragment.push_sql(&right_column.sql);
		self.joins.push(fragment);
		Ok(self)
	}

	/// Join `J` on a general predicate over the root entity and `J`
	pub fn join_where<J: Entity, P: Predicate>(
		mut self,
		kind: JoinKind,
		alias: Option<&str>,
		predicate: impl FnOnce(E::Fields, J::Fields) -> P,
	) -> Result<Self> {
		if kind == JoinKind::Cross {
			return Err(QueryError::InvalidStatement(
				"CROSS JOIN takes no ON condition".to_string(),
			));
		}
		let expr = predicate(E::fields(), J::Fields::at_slot(1)).into_predicate();
		let mut fragment = self.join_target::<J>(kind, alias)?;
		let condition = self
			.context
			.compiler(self.alias.as_deref())
			.with_alias(1, alias)
			.compile_predicate(&expr, &mut self.params)?;
		fragment.push_sql(" ON ");
		fragment.append(&condition);
		self.joins.push(fragment);
		Ok(self)
	}

	pub fn cross_join<J: Entity>(mut self, alias: Option<&str>) -> Result<Self> {
		let fragment = self.join_target::<J>(JoinKind::Cross, alias)?;
		self.joins.push(fragment);
		Ok(self)
	}

	fn join_target<J: Entity>(&self, kind: JoinKind, alias: Option<&str>) -> Result<Fragment> {
		let descriptor = self.context.registry.resolve(EntityKey::of::<J>())?;
		let dialect = self.context.dialect.as_ref();
		let mut fragment = Fragment::sql(kind.as_sql());
		fragment.push_sql(" ");
		fragment.push_sql(&dialect.quote_table(descriptor.schema, descriptor.table));
		if let Some(alias) = alias {
			fragment.push_sql(" AS ");
			fragment.push_sql(&dialect.quote_identifier(alias));
		}
		Ok(fragment)
	}

	// ORDER BY / GROUP BY / HAVING

	/// Replace the ordering with the selected columns, ascending
	pub fn order_by<S: Selection>(mut self, selector: impl FnOnce(E::Fields) -> S) -> Result<Self> {
		self.order_by.clear();
		self.then_by(selector)
	}

	/// Replace the ordering with the selected columns, descending
	pub fn order_by_desc<S: Selection>(
		mut self,
		selector: impl FnOnce(E::Fields) -> S,
	) -> Result<Self> {
		self.order_by.clear();
		self.then_by_desc(selector)
	}

	/// Append ascending sort keys after the existing ones
	pub fn then_by<S: Selection>(self, selector: impl FnOnce(E::Fields) -> S) -> Result<Self> {
		self.push_order(&selector(E::fields()).into_exprs(), "")
	}

	pub fn then_by_desc<S: Selection>(self, selector: impl FnOnce(E::Fields) -> S) -> Result<Self> {
		self.push_order(&selector(E::fields()).into_exprs(), " DESC")
	}

	fn push_order(mut self, selectors: &[Expr], direction: &str) -> Result<Self> {
		let columns = self.root_columns(selectors, "ORDER BY")?;
		self.order_by
			.extend(columns.into_iter().map(|column| column.sql + direction));
		Ok(self)
	}

	pub fn group_by<S: Selection>(mut self, selector: impl FnOnce(E::Fields) -> S) -> Result<Self> {
		let columns = self.root_columns(&selector(E::fields()).into_exprs(), "GROUP BY")?;
		self.group_by
			.extend(columns.into_iter().map(|column| column.sql));
		Ok(self)
	}

	/// Filter groups; AND-ed with any earlier HAVING predicate
	pub fn having<P: Predicate>(mut self, predicate: impl FnOnce(E::Fields) -> P) -> Result<Self> {
		if self.group_by.is_empty() {
			return Err(QueryError::InvalidStatement(
				"HAVING requires a GROUP BY clause".to_string(),
			));
		}
		let expr = predicate(E::fields()).into_predicate();
		let fragment = self
			.context
			.compiler(self.alias.as_deref())
			.compile_predicate(&expr, &mut self.params)?;
		self.having.push(fragment, BinaryOp::And);
		Ok(self)
	}

	// SELECT list

	/// Select exactly the given columns; `()` selects every mapped column
	pub fn select<S: Selection>(mut self, selector: impl FnOnce(E::Fields) -> S) -> Result<Self> {
		let columns = self.root_columns(&selector(E::fields()).into_exprs(), "SELECT")?;
		self.columns = columns.into_iter().map(|column| column.sql).collect();
		Ok(self)
	}

	pub fn select_distinct<S: Selection>(self, selector: impl FnOnce(E::Fields) -> S) -> Result<Self> {
		let mut statement = self.select(selector)?;
		statement.distinct = true;
		Ok(statement)
	}

	/// Select root columns followed by the columns of referenced entities
	///
	/// Referenced columns are aliased with their reference path, e.g.
	/// `"customer__address__city"`. The referenced tables must be joined
	/// separately under matching aliases.
	pub fn select_with_references<S: Selection>(
		mut self,
		selector: impl FnOnce(E::Fields) -> S,
		references: impl FnOnce(ReferenceBuilder<E>) -> ReferenceBuilder<E>,
	) -> Result<Self> {
		let root = self.root_columns(&selector(E::fields()).into_exprs(), "SELECT")?;
		let projected = self.project_references(references)?;
		self.columns = root
			.into_iter()
			.map(|column| column.sql)
			.chain(projected.into_iter().map(|column| column.sql))
			.collect();
		Ok(self)
	}

	/// Resolve a reference tree rooted at `E` without touching the statement
	pub fn project_references(
		&self,
		references: impl FnOnce(ReferenceBuilder<E>) -> ReferenceBuilder<E>,
	) -> Result<Vec<ProjectedColumn>> {
		let tree = references(ReferenceBuilder::new());
		tree.project(
			&self.context.compiler(self.alias.as_deref()),
			&self.context.settings.reference_separator,
		)
	}

	// LIMIT / OFFSET

	pub fn limit(mut self, rows: u64) -> Self {
		self.limit = Some(rows);
		self
	}

	pub fn offset(mut self, rows: u64) -> Self {
		self.offset = Some(rows);
		self
	}

	/// Page `number` (starting at 1) of `size` rows
	pub fn page(self, number: u64, size: u64) -> Result<Self> {
		if number == 0 || size == 0 {
			return Err(QueryError::InvalidStatement(format!(
				"page {} of size {} is out of range; both start at 1",
				number, size
			)));
		}
		let skip = (number - 1).checked_mul(size).ok_or_else(|| {
			QueryError::InvalidStatement(format!(
				"page {} of size {} skips more rows than can be addressed",
				number, size
			))
		})?;
		Ok(self.limit(size).offset(skip))
	}

	// Rendering

	fn from_clause(&self) -> Fragment {
		let dialect = self.context.dialect.as_ref();
		let mut fragment = Fragment::sql(" FROM ");
		fragment.push_sql(&dialect.quote_table(self.descriptor.schema, self.descriptor.table));
		if let Some(alias) = &self.alias {
			fragment.push_sql(" AS ");
			fragment.push_sql(&dialect.quote_identifier(alias));
		}
		for join in &self.joins {
			fragment.push_sql(" ");
			fragment.append(join);
		}
		if !self.conditions.is_empty() {
			fragment.push_sql(" WHERE ");
			fragment.append(&self.conditions.fragment);
		}
		fragment
	}

	fn grouping_clause(&self) -> Fragment {
		let mut fragment = Fragment::new();
		if !self.group_by.is_empty() {
			fragment.push_sql(" GROUP BY ");
			fragment.push_sql(&self.group_by.join(", "));
		}
		if !self.having.is_empty() {
			fragment.push_sql(" HAVING ");
			fragment.append(&self.having.fragment);
		}
		fragment
	}

	fn select_list(&self) -> String {
		if !self.columns.is_empty() {
			return self.columns.join(", ");
		}
		let dialect = self.context.dialect.as_ref();
		let qualifier = match &self.alias {
			Some(alias) => dialect.quote_identifier(alias),
			None => dialect.quote_table(self.descriptor.schema, self.descriptor.table),
		};
		self.descriptor
			.column_names()
			.map(|column| format!("{}.{}", qualifier, dialect.quote_identifier(column)))
			.collect::<Vec<_>>()
			.join(", ")
	}

	/// The whole statement with parameter references into `self.params`
	fn assemble(&self) -> Fragment {
		let dialect = self.context.dialect.as_ref();
		let limits = dialect.limit_clause(self.limit, self.offset);

		let mut fragment = Fragment::sql("SELECT ");
		if self.distinct {
			fragment.push_sql("DISTINCT ");
		}
		if let Some(top) = &limits.top {
			fragment.push_sql(top);
			fragment.push_sql(" ");
		}
		fragment.push_sql(&self.select_list());
		fragment.append(&self.from_clause());
		fragment.append(&self.grouping_clause());

		if !self.order_by.is_empty() {
			fragment.push_sql(" ORDER BY ");
			fragment.push_sql(&self.order_by.join(", "));
		} else if self.offset.is_some() && dialect.offset_requires_order() {
			fragment.push_sql(" ORDER BY (SELECT NULL)");
		}
		if let Some(tail) = &limits.tail {
			fragment.push_sql(" ");
			fragment.push_sql(tail);
		}
		fragment
	}

	/// Finalize into SQL text and the parameters it binds
	pub fn build(&self) -> SqlStatement {
		let statement = self.assemble().render(self.context.dialect(), &self.params);
		self.trace_build("select", &statement);
		statement
	}

	/// `SELECT COUNT(*)` over the same rows, ignoring ordering and paging
	///
	/// Grouped or DISTINCT statements are counted through a derived table.
	pub fn to_count_statement(&self) -> SqlStatement {
		let dialect = self.context.dialect.as_ref();
		let fragment = if self.group_by.is_empty() && !self.distinct {
			let mut fragment = Fragment::sql("SELECT COUNT(*)");
			fragment.append(&self.from_clause());
			fragment
		} else {
			let mut inner = Fragment::sql("SELECT ");
			if self.distinct {
				inner.push_sql("DISTINCT ");
			}
			inner.push_sql(&self.select_list());
			inner.append(&self.from_clause());
			inner.append(&self.grouping_clause());

			let mut fragment = Fragment::sql("SELECT COUNT(*) FROM (");
			fragment.append(&inner);
			fragment.push_sql(") AS ");
			fragment.push_sql(&dialect.quote_identifier("counted"));
			fragment
		};
		let statement = fragment.render(dialect, &self.params);
		self.trace_build("count", &statement);
		statement
	}

	fn trace_build(&self, kind: &str, statement: &SqlStatement) {
		let dialect = self.context.dialect.database_type();
		if self.context.settings.log_sql {
			tracing::debug!(
				%dialect,
				kind,
				params = statement.params.len(),
				sql = %statement.sql,
				"built statement"
			);
		} else {
			tracing::debug!(
				%dialect,
				kind,
				params = statement.params.len(),
				"built statement"
			);
		}
	}
}

impl<E: Entity> fmt::Debug for SelectStatement<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SelectStatement")
			.field("entity", &self.descriptor.name)
			.field("alias", &self.alias)
			.field("params", &self.params)
			.finish_non_exhaustive()
	}
}
