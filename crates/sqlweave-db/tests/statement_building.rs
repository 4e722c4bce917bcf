//! End-to-end statement building across dialects

use rstest::*;
use sqlweave_db::backends::{
	DatabaseType, Dialect, MySqlDialect, PostgresDialect, QueryValue, SqlServerDialect,
	SqliteDialect,
};
use sqlweave_db::entity;
use sqlweave_db::orm::{Expr, JoinKind, QueryError, SqlContext};
use sqlweave_db::settings::CompilerSettings;
use std::sync::Arc;

pub struct Article;

entity!(pub Article => "content"."articles" {
	id: i64,
	author_id: i64,
	title: String => "headline",
	score: i32,
	archived: bool,
});

pub struct Writer;
entity!(pub Writer => "writers" { id: i64, name: String, agency_id: Option<i64> });

pub struct Agency;
entity!(pub Agency => "agencies" { id: i64, label: String });

#[fixture]
fn pg() -> SqlContext {
	SqlContext::new(Arc::new(PostgresDialect))
}

#[rstest]
#[case::postgres(Arc::new(PostgresDialect) as Arc<dyn Dialect>, "SELECT \"content\".\"articles\".\"headline\" FROM \"content\".\"articles\" WHERE (\"content\".\"articles\".\"score\" BETWEEN $1 AND $2) AND NOT ((\"content\".\"articles\".\"archived\" = $3))")]
#[case::sqlite(Arc::new(SqliteDialect) as Arc<dyn Dialect>, "SELECT \"content\".\"articles\".\"headline\" FROM \"content\".\"articles\" WHERE (\"content\".\"articles\".\"score\" BETWEEN ?1 AND ?2) AND NOT ((\"content\".\"articles\".\"archived\" = ?3))")]
#[case::mysql(Arc::new(MySqlDialect) as Arc<dyn Dialect>, "SELECT `content`.`articles`.`headline` FROM `content`.`articles` WHERE (`content`.`articles`.`score` BETWEEN ? AND ?) AND NOT ((`content`.`articles`.`archived` = ?))")]
#[case::sqlserver(Arc::new(SqlServerDialect) as Arc<dyn Dialect>, "SELECT [content].[articles].[headline] FROM [content].[articles] WHERE ([content].[articles].[score] BETWEEN @p1 AND @p2) AND NOT (([content].[articles].[archived] = @p3))")]
fn test_same_statement_per_dialect(#[case] dialect: Arc<dyn Dialect>, #[case] expected: &str) {
	// Arrange
	let ctx = SqlContext::new(dialect);

	// Act
	let statement = ctx
		.select::<Article>()
		.unwrap()
		.select(|a| a.title)
		.unwrap()
		.filter(|a| a.score.between(10, 20))
		.unwrap()
		.filter(|a| !a.archived)
		.unwrap()
		.build();

	// Assert
	assert_eq!(statement.sql, expected);
	assert_eq!(
		statement.params,
		vec![QueryValue::Int(10), QueryValue::Int(20), QueryValue::Bool(true)]
	);
}

#[rstest]
fn test_reference_projection_with_joins(pg: SqlContext) {
	let statement = pg
		.select::<Article>()
		.unwrap()
		.alias("a")
		.unwrap()
		.join_as::<Writer, _, _>(JoinKind::Inner, "w", |a| a.author_id, |w| w.id)
		.unwrap()
		.join_from::<Writer, Agency, _, _>(
			JoinKind::Left,
			Some("w"),
			Some("g"),
			|w| w.agency_id,
			|g| g.id,
		)
		.unwrap()
		.select_with_references(
			|a| (a.id, a.title),
			|r| {
				r.reference::<Writer>("writer", |w| {
					w.alias("w").reference::<Agency>("agency", |g| g.alias("g"))
				})
			},
		)
		.unwrap()
		.build();

	assert_eq!(
		statement.sql,
		"SELECT \"a\".\"id\", \"a\".\"headline\", \
		 \"w\".\"id\" AS \"writer__id\", \"w\".\"name\" AS \"writer__name\", \
		 \"w\".\"agency_id\" AS \"writer__agency_id\", \
		 \"g\".\"id\" AS \"writer__agency__id\", \"g\".\"label\" AS \"writer__agency__label\" \
		 FROM \"content\".\"articles\" AS \"a\" \
		 INNER JOIN \"writers\" AS \"w\" ON \"a\".\"author_id\" = \"w\".\"id\" \
		 LEFT JOIN \"agencies\" AS \"g\" ON \"w\".\"agency_id\" = \"g\".\"id\""
	);
}

#[rstest]
fn test_settings_separator_reaches_projection() {
	let settings = CompilerSettings::from_toml_str("dialect = \"sqlite\"\nreference_separator = \"$\"\n")
		.unwrap();
	let ctx = SqlContext::from_settings(settings).unwrap();

	let projected = ctx
		.select::<Writer>()
		.unwrap()
		.project_references(|w| w.reference::<Agency>("agency", |g| g))
		.unwrap();

	assert_eq!(ctx.dialect().database_type(), DatabaseType::Sqlite);
	assert_eq!(
		projected.iter().map(|c| c.alias.as_str()).collect::<Vec<_>>(),
		vec!["agency$id", "agency$label"]
	);
}

#[rstest]
fn test_invalid_settings_are_rejected() {
	let settings = CompilerSettings::for_dialect(DatabaseType::Mysql).with_reference_separator("");

	assert!(SqlContext::from_settings(settings).is_err());
}

#[rstest]
fn test_null_comparison_and_escaped_suffix(pg: SqlContext) {
	let statement = pg
		.select::<Writer>()
		.unwrap()
		.select(|w| w.id)
		.unwrap()
		.filter(|w| w.agency_id.ne(Expr::Value(QueryValue::Null)) | w.name.ends_with("_x"))
		.unwrap()
		.build();

	assert_eq!(
		statement.sql,
		"SELECT \"writers\".\"id\" FROM \"writers\" \
		 WHERE ((\"writers\".\"agency_id\" IS NOT NULL) OR \"writers\".\"name\" LIKE $1 ESCAPE '\\')"
	);
	assert_eq!(statement.params, vec![QueryValue::from("%\\_x")]);
}

#[rstest]
fn test_count_matches_filtered_select(pg: SqlContext) {
	let statement = pg
		.select::<Article>()
		.unwrap()
		.join::<Writer, _, _>(JoinKind::Inner, |a| a.author_id, |w| w.id)
		.unwrap()
		.filter(|a| a.score.gte(3))
		.unwrap()
		.page(2, 25)
		.unwrap();

	let count = statement.to_count_statement();
	let rows = statement.build();

	assert_eq!(
		count.sql,
		"SELECT COUNT(*) FROM \"content\".\"articles\" \
		 INNER JOIN \"writers\" ON \"content\".\"articles\".\"author_id\" = \"writers\".\"id\" \
		 WHERE (\"content\".\"articles\".\"score\" >= $1)"
	);
	assert!(rows.sql.ends_with("LIMIT 25 OFFSET 25"));
	assert_eq!(count.params, rows.params);
}

#[rstest]
fn test_errors_surface_at_the_offending_call(pg: SqlContext) {
	let err = pg
		.select::<Article>()
		.unwrap()
		.group_by(|a| a.score * 2)
		.unwrap_err();

	assert_eq!(
		err.to_string(),
		"Unsupported expression in GROUP BY: `(Article.score * 2)` is not a field reference"
	);
	assert!(matches!(err, QueryError::UnsupportedExpression { .. }));
}
