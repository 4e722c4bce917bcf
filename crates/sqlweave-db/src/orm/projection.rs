//! Reference projections
//!
//! A reference projection extends a SELECT list with the columns of related
//! entities. Each projected column is aliased with the chain of referencing
//! field names, so a flat result row can be reassembled into an object graph:
//! with the default separator, `order -> customer -> address -> city` is
//! selected as `"customer__address__city"`.
//!
//! The tree is walked depth first and nothing guards against cycles; callers
//! describe a finite graph.

use super::compiler::ExpressionCompiler;
use super::error::{QueryError, Result};
use super::model::{Entity, EntityKey};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
	/// A single related entity
	Single,
	/// A homogeneous collection of related entities
	Collection,
}

/// One referenced entity inside a projection tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNode {
	/// Name of the referencing field on the parent
	pub field: String,
	pub target: EntityKey,
	/// Alias the target table is joined under
	pub alias: Option<String>,
	pub kind: ReferenceKind,
	pub children: Vec<ReferenceNode>,
}

/// A projected column of a referenced entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
	/// Dotted reference path, e.g. `customer.address`
	pub path: String,
	pub column: &'static str,
	/// Unquoted result alias, e.g. `customer__address__city`
	pub alias: String,
	/// `qualifier.column AS alias`
	pub sql: String,
	pub kind: ReferenceKind,
}

/// Nested builder describing the references of entity `P`
pub struct ReferenceBuilder<P: Entity> {
	alias: Option<String>,
	children: Vec<ReferenceNode>,
	_parent: PhantomData<fn() -> P>,
}

impl<P: Entity> Default for ReferenceBuilder<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P: Entity> ReferenceBuilder<P> {
	pub fn new() -> Self {
		Self {
			alias: None,
			children: Vec::new(),
			_parent: PhantomData,
		}
	}

	/// Alias under which this level's table is joined
	///
	/// Ignored at the root, which always uses the statement's own alias.
	pub fn alias(mut self, alias: impl Into<String>) -> Self {
		self.alias = Some(alias.into());
		self
	}

	/// Project a single related `T` reached through `field`
	pub fn reference<T: Entity>(
		self,
		field: impl Into<String>,
		nested: impl FnOnce(ReferenceBuilder<T>) -> ReferenceBuilder<T>,
	) -> Self {
		self.child(field.into(), ReferenceKind::Single, nested)
	}

	/// Project a collection of related `T` reached through `field`
	pub fn collection<T: Entity>(
		self,
		field: impl Into<String>,
		nested: impl FnOnce(ReferenceBuilder<T>) -> ReferenceBuilder<T>,
	) -> Self {
		self.child(field.into(), ReferenceKind::Collection, nested)
	}

	fn child<T: Entity>(
		mut self,
		field: String,
		kind: ReferenceKind,
		nested: impl FnOnce(ReferenceBuilder<T>) -> ReferenceBuilder<T>,
	) -> Self {
		let built = nested(ReferenceBuilder::new());
		self.children.push(ReferenceNode {
			field,
			target: EntityKey::of::<T>(),
			alias: built.alias,
			kind,
			children: built.children,
		});
		self
	}

	pub fn nodes(&self) -> &[ReferenceNode] {
		&self.children
	}

	pub fn into_nodes(self) -> Vec<ReferenceNode> {
		self.children
	}

	/// Emit the aliased columns of every reference, depth first
	pub fn project(&self, compiler: &ExpressionCompiler<'_>, separator: &str) -> Result<Vec<ProjectedColumn>> {
		let mut out = Vec::new();
		let mut path = Vec::new();
		for node in &self.children {
			project_node(node, compiler, separator, &mut path, &mut out)?;
		}
		Ok(out)
	}
}

fn project_node<'n>(
	node: &'n ReferenceNode,
	compiler: &ExpressionCompiler<'_>,
	separator: &str,
	path: &mut Vec<&'n str>,
	out: &mut Vec<ProjectedColumn>,
) -> Result<()> {
	path.push(&node.field);
	let descriptor = compiler.registry().resolve(node.target)?;
	if descriptor.columns.is_empty() {
		return Err(QueryError::EmptyProjection {
			entity: descriptor.name.to_string(),
			path: path.join("."),
		});
	}

	let dialect = compiler.dialect();
	let qualifier = compiler.qualify(descriptor, node.alias.as_deref());
	let prefix = path.join(separator);
	let dotted = path.join(".");
	for column in descriptor.column_names() {
		let alias = format!("{}{}{}", prefix, separator, column);
		let sql = format!(
			"{}.{} AS {}",
			qualifier,
			dialect.quote_identifier(column),
			dialect.quote_identifier(&alias)
		);
		out.push(ProjectedColumn {
			path: dotted.clone(),
			column,
			alias,
			sql,
			kind: node.kind,
		});
	}
	tracing::trace!(path = %dotted, entity = descriptor.name, "projected reference");

	for child in &node.children {
		project_node(child, compiler, separator, path, out)?;
	}
	path.pop();
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::dialect::PostgresDialect;
	use crate::orm::registry::MetadataRegistry;
	use rstest::{fixture, rstest};

	struct Order;
	crate::entity!(Order => "orders" { id: i64, customer_id: i64 });

	struct Customer;
	crate::entity!(Customer => "customers" { id: i64, name: String, address_id: i64 });

	struct Address;
	crate::entity!(Address => "addresses" { id: i64, city: String });

	struct Line;
	crate::entity!(Line => "order_lines" { id: i64, sku: String => "sku_code" });

	struct Marker;
	crate::entity!(Marker => "markers" {});

	#[fixture]
	fn registry() -> MetadataRegistry {
		let registry = MetadataRegistry::new();
		registry
			.register::<Order>()
			.register::<Customer>()
			.register::<Address>()
			.register::<Line>()
			.register::<Marker>();
		registry
	}

	#[rstest]
	fn test_nested_reference_aliases_carry_prefix_chain(registry: MetadataRegistry) {
		// Arrange
		let compiler = ExpressionCompiler::new(&registry, &PostgresDialect);
		let tree = ReferenceBuilder::<Order>::new().reference::<Customer>("customer", |c| {
			c.alias("c")
				.reference::<Address>("address", |a| a.alias("a"))
		});

		// Act
		let columns = tree.project(&compiler, "__").unwrap();

		// Assert
		let aliases: Vec<_> = columns.iter().map(|c| c.alias.as_str()).collect();
		assert_eq!(
			aliases,
			vec![
				"customer__id",
				"customer__name",
				"customer__address_id",
				"customer__address__id",
				"customer__address__city",
			]
		);
		assert_eq!(
			columns[4].sql,
			"\"a\".\"city\" AS \"customer__address__city\""
		);
		assert_eq!(columns[4].path, "customer.address");
	}

	#[rstest]
	fn test_collection_uses_table_without_alias(registry: MetadataRegistry) {
		let compiler = ExpressionCompiler::new(&registry, &PostgresDialect);
		let tree = ReferenceBuilder::<Order>::new().collection::<Line>("lines", |l| l);

		let columns = tree.project(&compiler, "$").unwrap();

		assert_eq!(columns.len(), 2);
		assert_eq!(columns[1].kind, ReferenceKind::Collection);
		assert_eq!(
			columns[1].sql,
			"\"order_lines\".\"sku_code\" AS \"lines$sku_code\""
		);
	}

	#[rstest]
	fn test_target_without_columns_is_rejected(registry: MetadataRegistry) {
		let compiler = ExpressionCompiler::new(&registry, &PostgresDialect);
		let tree = ReferenceBuilder::<Order>::new()
			.reference::<Customer>("customer", |c| c.reference::<Marker>("badge", |m| m));

		let err = tree.project(&compiler, "__").unwrap_err();

		assert_eq!(
			err,
			QueryError::EmptyProjection {
				entity: "Marker".to_string(),
				path: "customer.badge".to_string(),
			}
		);
	}

	#[rstest]
	fn test_builder_records_tree_shape() {
		let tree = ReferenceBuilder::<Order>::new()
			.reference::<Customer>("customer", |c| c.alias("c"))
			.collection::<Line>("lines", |l| l);

		let nodes = tree.into_nodes();

		assert_eq!(nodes.len(), 2);
		assert_eq!(nodes[0].alias.as_deref(), Some("c"));
		assert_eq!(nodes[0].target, EntityKey::of::<Customer>());
		assert!(nodes[1].children.is_empty());
	}
}
