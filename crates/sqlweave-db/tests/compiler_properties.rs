//! Property tests for column resolution, IN lists, reference projections
//! and parameter ordering

use proptest::prelude::*;
use sqlweave_db::backends::{PostgresDialect, QueryValue};
use sqlweave_db::entity;
use sqlweave_db::orm::{
	ColumnDescriptor, ColumnRef, EntityDescriptor, EntityKey, Expr, ExpressionCompiler,
	MetadataRegistry, QueryError, SqlContext,
};
use std::any::TypeId;
use std::sync::Arc;

struct Shipment;
entity!(Shipment => "logistics"."shipments" {
	id: i64,
	carrier_id: i64,
	weight: f64,
	tracking: String,
	delivered: bool,
});

struct Carrier;
entity!(Carrier => "carriers" { id: i64, hub_id: i64, name: String });

struct Hub;
entity!(Hub => "hubs" { id: i64, city_id: i64 });

struct City;
entity!(City => "cities" { id: i64, name: String, country: String });

/// Stand-in type for descriptors generated at runtime
struct Generated;

fn generated_key() -> EntityKey {
	EntityKey {
		type_id: TypeId::of::<Generated>(),
		type_name: "Generated",
	}
}

fn leak(text: String) -> &'static str {
	Box::leak(text.into_boxed_str())
}

fn generated_registry(table: &str, columns: &[String]) -> MetadataRegistry {
	let columns: Vec<ColumnDescriptor> = columns
		.iter()
		.map(|column| ColumnDescriptor::new(leak(column.clone())))
		.collect();
	let descriptor: &'static EntityDescriptor = Box::leak(Box::new(EntityDescriptor {
		name: "Generated",
		table: leak(table.to_string()),
		schema: None,
		columns: Box::leak(columns.into_boxed_slice()),
	}));
	let registry = MetadataRegistry::new();
	registry.register_descriptor(TypeId::of::<Generated>(), descriptor);
	registry
}

fn column_names() -> impl Strategy<Value = Vec<String>> {
	prop::collection::hash_set("[a-z][a-z0-9_]{0,10}", 1..16)
		.prop_map(|names| names.into_iter().collect())
}

fn quoted(ident: &str) -> String {
	format!("\"{}\"", ident.replace('"', "\"\""))
}

#[derive(Debug, Clone)]
enum Call {
	Greater(i64),
	Raw(Vec<i64>),
	In(Vec<i64>),
}

fn calls() -> impl Strategy<Value = Vec<Call>> {
	let call = prop_oneof![
		any::<i64>().prop_map(Call::Greater),
		prop::collection::vec(any::<i64>(), 0..4).prop_map(Call::Raw),
		prop::collection::vec(any::<i64>(), 0..6).prop_map(Call::In),
	];
	prop::collection::vec(call, 0..12)
}

proptest! {
	/// Property: an empty selection expands to every mapped column, in order
	#[test]
	fn prop_empty_selection_lists_all_columns(columns in column_names()) {
		let registry = generated_registry("generated", &columns);
		let compiler = ExpressionCompiler::new(&registry, &PostgresDialect);

		let resolved = compiler.column_list(generated_key(), 0, &[], "SELECT").unwrap();

		prop_assert_eq!(resolved.len(), columns.len());
		for (column, name) in resolved.iter().zip(&columns) {
			prop_assert_eq!(column.column, name.as_str());
		}
	}

	/// Property: a known column resolves to quote(table).quote(column)
	#[test]
	fn prop_field_reference_is_quoted_table_dot_column(
		table in "[a-z\"]{1,12}",
		columns in column_names(),
		pick in any::<prop::sample::Index>(),
	) {
		let registry = generated_registry(&table, &columns);
		let compiler = ExpressionCompiler::new(&registry, &PostgresDialect);
		let field = pick.get(&columns).clone();
		let selector = Expr::Column(ColumnRef {
			entity: generated_key(),
			field: leak(field.clone()),
			slot: 0,
		});

		let resolved = compiler.field_reference(&selector, "SELECT").unwrap();

		prop_assert_eq!(resolved.sql, format!("{}.{}", quoted(&table), quoted(&field)));
	}

	/// Property: an explicit value set binds exactly one placeholder
	#[test]
	fn prop_in_list_binds_single_placeholder(
		values in prop::collection::vec(any::<i64>(), 0..32),
		negated in any::<bool>(),
	) {
		let ctx = SqlContext::new(Arc::new(PostgresDialect));
		let statement = ctx.select::<Shipment>().unwrap();
		let statement = if negated {
			statement.where_not_in(|s| s.carrier_id, values.clone()).unwrap()
		} else {
			statement.where_in(|s| s.carrier_id, values.clone()).unwrap()
		};

		let built = statement.build();

		prop_assert_eq!(built.sql.matches('$').count(), 1);
		prop_assert_eq!(built.sql.contains(" NOT IN ($1)"), negated);
		prop_assert!(built.sql.contains(" IN ($1)"));
		prop_assert_eq!(
			built.params,
			vec![QueryValue::List(values.into_iter().map(QueryValue::Int).collect())]
		);
	}

	/// Property: three nested references prefix the innermost columns with A__B__C__
	#[test]
	fn prop_nested_reference_prefix_chain(
		a in "[a-z]{1,8}",
		b in "[a-z]{1,8}",
		c in "[a-z]{1,8}",
	) {
		let ctx = SqlContext::new(Arc::new(PostgresDialect));
		let statement = ctx.select::<Shipment>().unwrap();
		let (ra, rb, rc) = (a.clone(), b.clone(), c.clone());

		let projected = statement
			.project_references(move |s| {
				s.reference::<Carrier>(ra, move |carrier| {
					carrier.reference::<Hub>(rb, move |hub| hub.reference::<City>(rc, |city| city))
				})
			})
			.unwrap();

		let prefix = format!("{}__{}__{}__", a, b, c);
		let innermost: Vec<_> = projected
			.iter()
			.filter(|column| column.path == format!("{}.{}.{}", a, b, c))
			.collect();
		prop_assert_eq!(innermost.len(), 3);
		for column in innermost {
			prop_assert!(column.alias.starts_with(&prefix));
			prop_assert_eq!(&column.alias[prefix.len()..], column.column);
		}
	}

	/// Property: a computed selector is rejected while the statement is built
	#[test]
	fn prop_computed_selector_is_rejected(k in any::<i64>(), op in 0usize..5) {
		let ctx = SqlContext::new(Arc::new(PostgresDialect));
		let statement = ctx.select::<Shipment>().unwrap();

		let result = statement.order_by(move |s| match op {
			0 => s.id + k,
			1 => s.id - k,
			2 => s.id * k,
			3 => s.id / k,
			_ => s.id % k,
		});

		prop_assert!(
			matches!(
				result,
				Err(QueryError::UnsupportedExpression { context: "ORDER BY", .. })
			),
			"computed selector was accepted"
		);
	}

	/// Property: parameters accumulate in call order whatever produced them
	#[test]
	fn prop_params_follow_call_order(calls in calls()) {
		let ctx = SqlContext::new(Arc::new(PostgresDialect));
		let mut statement = ctx.select::<Shipment>().unwrap();
		let mut expected = Vec::new();

		for call in calls {
			statement = match call {
				Call::Greater(n) => {
					expected.push(QueryValue::Int(n));
					statement.filter(|s| s.id.gt(n)).unwrap()
				}
				Call::Raw(values) => {
					let sql = vec!["{}"; values.len()].join(" + ");
					let sql = if sql.is_empty() { "1 = 1".to_string() } else { format!("{} > 0", sql) };
					expected.extend(values.iter().copied().map(QueryValue::Int));
					statement.filter_raw(&sql, values).unwrap()
				}
				Call::In(values) => {
					expected.push(QueryValue::List(values.iter().copied().map(QueryValue::Int).collect()));
					statement.where_in(|s| s.carrier_id, values).unwrap()
				}
			};
		}

		prop_assert_eq!(statement.params(), expected.as_slice());
		prop_assert_eq!(statement.build().params, expected);
	}

	/// Property: sub-statement parameters are spliced in their own order at the call point
	#[test]
	fn prop_subquery_params_spliced_in_order(
		before in prop::collection::vec(any::<i64>(), 0..4),
		inner in prop::collection::vec(any::<i64>(), 0..4),
		after in prop::collection::vec(any::<i64>(), 0..4),
	) {
		let ctx = SqlContext::new(Arc::new(PostgresDialect));
		let mut sub = ctx.select::<Carrier>().unwrap().select(|c| c.id).unwrap();
		for n in &inner {
			let n = *n;
			sub = sub.filter(|c| c.hub_id.ne(n)).unwrap();
		}
		let mut outer = ctx.select::<Shipment>().unwrap();
		for n in &before {
			let n = *n;
			outer = outer.filter(|s| s.id.gt(n)).unwrap();
		}
		outer = outer.where_in_subquery(|s| s.carrier_id, sub).unwrap();
		for n in &after {
			let n = *n;
			outer = outer.filter(|s| s.id.lt(n)).unwrap();
		}

		let built = outer.build();

		let expected: Vec<_> = before
			.iter()
			.chain(&inner)
			.chain(&after)
			.copied()
			.map(QueryValue::Int)
			.collect();
		prop_assert_eq!(built.params, expected);
		let placeholders = (1..=before.len() + inner.len() + after.len())
			.map(|i| format!("${}", i))
			.collect::<Vec<_>>();
		let mut cursor = 0;
		for placeholder in placeholders {
			let found = built.sql[cursor..].find(&placeholder);
			prop_assert!(found.is_some(), "{} missing or out of order in {}", placeholder, built.sql);
			cursor += found.unwrap_or_default() + placeholder.len();
		}
	}
}
