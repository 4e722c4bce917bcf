//! Predicate and selector expressions
//!
//! Selectors and predicates are ordinary closures over an entity's generated
//! field set. Calling comparison methods on a [`Field`] (or combining
//! expressions with `&`, `|`, `!` and arithmetic operators) builds an
//! [`Expr`] tree which the compiler later walks once.
//!
//! ```
//! use sqlweave_db::entity;
//! use sqlweave_db::orm::{Entity, Expr};
//!
//! struct User;
//! entity!(User => "users" { id: i64, age: i32, name: String, active: bool });
//!
//! let u = User::fields();
//! let predicate: Expr = u.age.gte(18) & u.name.starts_with("A") & u.active;
//! assert_eq!(
//!     predicate.to_string(),
//!     "(((User.age >= 18) AND User.name STARTS_WITH 'A') AND User.active)"
//! );
//! ```

use super::model::{Entity, EntityKey, Field, Slot};
use crate::backends::types::QueryValue;
use chrono::{DateTime, Utc};
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Rem, Sub};
use uuid::Uuid;

/// Reference to a mapped field inside an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
	pub entity: EntityKey,
	pub field: &'static str,
	pub slot: Slot,
}

impl ColumnRef {
	/// Short entity name without the module path
	pub fn entity_name(&self) -> &'static str {
		self.entity
			.type_name
			.rsplit("::")
			.next()
			.unwrap_or(self.entity.type_name)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Eq,
	Ne,
	Lt,
	Lte,
	Gt,
	Gte,
	And,
	Or,
	Add,
	Sub,
	Mul,
	Div,
	Rem,
}

impl BinaryOp {
	pub fn as_sql(&self) -> &'static str {
		match self {
			BinaryOp::Eq => "=",
			BinaryOp::Ne => "<>",
			BinaryOp::Lt => "<",
			BinaryOp::Lte => "<=",
			BinaryOp::Gt => ">",
			BinaryOp::Gte => ">=",
			BinaryOp::And => "AND",
			BinaryOp::Or => "OR",
			BinaryOp::Add => "+",
			BinaryOp::Sub => "-",
			BinaryOp::Mul => "*",
			BinaryOp::Div => "/",
			BinaryOp::Rem => "%",
		}
	}

	pub fn is_logical(&self) -> bool {
		matches!(self, BinaryOp::And | BinaryOp::Or)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
	Neg,
}

/// Method-call nodes: LIKE family, set membership, range and NULL tests,
/// and the scalar functions allowed inside predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Like,
	Contains,
	StartsWith,
	EndsWith,
	In,
	NotIn,
	Between,
	IsNull,
	IsNotNull,
	Lower,
	Upper,
}

impl Method {
	fn name(&self) -> &'static str {
		match self {
			Method::Like => "LIKE",
			Method::Contains => "CONTAINS",
			Method::StartsWith => "STARTS_WITH",
			Method::EndsWith => "ENDS_WITH",
			Method::In => "IN",
			Method::NotIn => "NOT IN",
			Method::Between => "BETWEEN",
			Method::IsNull => "IS NULL",
			Method::IsNotNull => "IS NOT NULL",
			Method::Lower => "LOWER",
			Method::Upper => "UPPER",
		}
	}
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Column(ColumnRef),
	Value(QueryValue),
	Unary {
		op: UnaryOp,
		expr: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Call {
		method: Method,
		target: Box<Expr>,
		args: Vec<Expr>,
	},
}

impl Expr {
	pub fn value(value: impl Into<QueryValue>) -> Self {
		Expr::Value(value.into())
	}

	pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
		Expr::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn call(method: Method, target: Expr, args: Vec<Expr>) -> Self {
		Expr::Call {
			method,
			target: Box::new(target),
			args,
		}
	}

	pub fn and(self, other: impl Into<Expr>) -> Expr {
		Expr::binary(BinaryOp::And, self, other.into())
	}

	pub fn or(self, other: impl Into<Expr>) -> Expr {
		Expr::binary(BinaryOp::Or, self, other.into())
	}

	/// The column this expression denotes, if it is a bare field access
	pub fn as_column(&self) -> Option<&ColumnRef> {
		match self {
			Expr::Column(column) => Some(column),
			_ => None,
		}
	}
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expr::Column(column) => write!(f, "{}.{}", column.entity_name(), column.field),
			Expr::Value(value) => write!(f, "{}", value),
			Expr::Unary { op: UnaryOp::Not, expr } => write!(f, "NOT {}", expr),
			Expr::Unary { op: UnaryOp::Neg, expr } => write!(f, "-{}", expr),
			Expr::Binary { op, left, right } => {
				write!(f, "({} {} {})", left, op.as_sql(), right)
			}
			Expr::Call {
				method,
				target,
				args,
			} => {
				write!(f, "{} {}", target, method.name())?;
				for (i, arg) in args.iter().enumerate() {
					let sep = if i == 0 { " " } else { ", " };
					write!(f, "{}{}", sep, arg)?;
				}
				Ok(())
			}
		}
	}
}

impl<E: Entity, T> From<Field<E, T>> for Expr {
	fn from(field: Field<E, T>) -> Self {
		field.expr()
	}
}

impl From<QueryValue> for Expr {
	fn from(value: QueryValue) -> Self {
		Expr::Value(value)
	}
}

/// Right-hand side accepted where a value of type `T` is expected
pub trait Operand<T> {
	fn into_expr(self) -> Expr;
}

impl<E: Entity, T> Operand<T> for Field<E, T> {
	fn into_expr(self) -> Expr {
		self.expr()
	}
}

impl<T> Operand<T> for Expr {
	fn into_expr(self) -> Expr {
		self
	}
}

macro_rules! value_operands {
	($($target:ty => $($source:ty),+;)*) => {
		$($(
			impl Operand<$target> for $source {
				fn into_expr(self) -> Expr {
					Expr::Value(self.into())
				}
			}

			impl Operand<Option<$target>> for $source {
				fn into_expr(self) -> Expr {
					Expr::Value(self.into())
				}
			}

			impl Operand<Option<$target>> for Option<$source> {
				fn into_expr(self) -> Expr {
					Expr::Value(self.into())
				}
			}
		)+)*
	};
}

value_operands! {
	i64 => i64, i32;
	i32 => i32;
	f64 => f64;
	bool => bool;
	String => String, &str;
	Uuid => Uuid;
	DateTime<Utc> => DateTime<Utc>;
}

/// Marker for field types supporting text predicates
pub trait TextValue {}

impl TextValue for String {}
impl TextValue for Option<String> {}

impl<E: Entity, T> Field<E, T> {
	/// Untyped column expression of this field
	pub fn expr(self) -> Expr {
		Expr::Column(ColumnRef {
			entity: EntityKey::of::<E>(),
			field: self.name(),
			slot: self.slot(),
		})
	}

	pub fn eq(self, rhs: impl Operand<T>) -> Expr {
		Expr::binary(BinaryOp::Eq, self.expr(), rhs.into_expr())
	}

	pub fn ne(self, rhs: impl Operand<T>) -> Expr {
		Expr::binary(BinaryOp::Ne, self.expr(), rhs.into_expr())
	}

	pub fn gt(self, rhs: impl Operand<T>) -> Expr {
		Expr::binary(BinaryOp::Gt, self.expr(), rhs.into_expr())
	}

	pub fn gte(self, rhs: impl Operand<T>) -> Expr {
		Expr::binary(BinaryOp::Gte, self.expr(), rhs.into_expr())
	}

	pub fn lt(self, rhs: impl Operand<T>) -> Expr {
		Expr::binary(BinaryOp::Lt, self.expr(), rhs.into_expr())
	}

	pub fn lte(self, rhs: impl Operand<T>) -> Expr {
		Expr::binary(BinaryOp::Lte, self.expr(), rhs.into_expr())
	}

	pub fn between(self, low: impl Operand<T>, high: impl Operand<T>) -> Expr {
		Expr::call(
			Method::Between,
			self.expr(),
			vec![low.into_expr(), high.into_expr()],
		)
	}

	pub fn is_null(self) -> Expr {
		Expr::call(Method::IsNull, self.expr(), Vec::new())
	}

	pub fn is_not_null(self) -> Expr {
		Expr::call(Method::IsNotNull, self.expr(), Vec::new())
	}

	/// Membership in an explicit value set, bound as a single parameter
	pub fn is_in<V>(self, values: impl IntoIterator<Item = V>) -> Expr
	where
		V: Operand<T> + Into<QueryValue>,
	{
		Expr::call(Method::In, self.expr(), vec![value_list(values)])
	}

	pub fn not_in<V>(self, values: impl IntoIterator<Item = V>) -> Expr
	where
		V: Operand<T> + Into<QueryValue>,
	{
		Expr::call(Method::NotIn, self.expr(), vec![value_list(values)])
	}
}

impl<E: Entity, T: TextValue> Field<E, T> {
	/// Raw LIKE with a caller-supplied pattern
	pub fn like(self, pattern: impl Into<String>) -> Expr {
		text_call(Method::Like, self.expr(), pattern.into())
	}

	pub fn contains(self, needle: impl Into<String>) -> Expr {
		text_call(Method::Contains, self.expr(), needle.into())
	}

	pub fn starts_with(self, prefix: impl Into<String>) -> Expr {
		text_call(Method::StartsWith, self.expr(), prefix.into())
	}

	pub fn ends_with(self, suffix: impl Into<String>) -> Expr {
		text_call(Method::EndsWith, self.expr(), suffix.into())
	}

	pub fn lower(self) -> Expr {
		Expr::call(Method::Lower, self.expr(), Vec::new())
	}

	pub fn upper(self) -> Expr {
		Expr::call(Method::Upper, self.expr(), Vec::new())
	}
}

fn text_call(method: Method, target: Expr, text: String) -> Expr {
	Expr::call(method, target, vec![Expr::Value(QueryValue::String(text))])
}

fn value_list<V: Into<QueryValue>>(values: impl IntoIterator<Item = V>) -> Expr {
	Expr::Value(QueryValue::List(values.into_iter().map(Into::into).collect()))
}

impl BitAnd for Expr {
	type Output = Expr;

	fn bitand(self, rhs: Expr) -> Expr {
		self.and(rhs)
	}
}

impl BitOr for Expr {
	type Output = Expr;

	fn bitor(self, rhs: Expr) -> Expr {
		self.or(rhs)
	}
}

impl<E: Entity> BitAnd<Field<E, bool>> for Expr {
	type Output = Expr;

	fn bitand(self, rhs: Field<E, bool>) -> Expr {
		self.and(rhs)
	}
}

impl<E: Entity> BitOr<Field<E, bool>> for Expr {
	type Output = Expr;

	fn bitor(self, rhs: Field<E, bool>) -> Expr {
		self.or(rhs)
	}
}

impl Not for Expr {
	type Output = Expr;

	fn not(self) -> Expr {
		Expr::Unary {
			op: UnaryOp::Not,
			expr: Box::new(self),
		}
	}
}

impl<E: Entity> Not for Field<E, bool> {
	type Output = Expr;

	fn not(self) -> Expr {
		!self.expr()
	}
}

impl Neg for Expr {
	type Output = Expr;

	fn neg(self) -> Expr {
		Expr::Unary {
			op: UnaryOp::Neg,
			expr: Box::new(self),
		}
	}
}

macro_rules! arithmetic_ops {
	($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
		$(
			impl<E: Entity, T, R: Operand<T>> $trait<R> for Field<E, T> {
				type Output = Expr;

				fn $method(self, rhs: R) -> Expr {
					Expr::binary(BinaryOp::$op, self.expr(), rhs.into_expr())
				}
			}

			impl $trait<Expr> for Expr {
				type Output = Expr;

				fn $method(self, rhs: Expr) -> Expr {
					Expr::binary(BinaryOp::$op, self, rhs)
				}
			}

			impl $trait<i64> for Expr {
				type Output = Expr;

				fn $method(self, rhs: i64) -> Expr {
					Expr::binary(BinaryOp::$op, self, Expr::value(rhs))
				}
			}

			impl $trait<f64> for Expr {
				type Output = Expr;

				fn $method(self, rhs: f64) -> Expr {
					Expr::binary(BinaryOp::$op, self, Expr::value(rhs))
				}
			}
		)*
	};
}

arithmetic_ops! {
	Add::add => Add,
	Sub::sub => Sub,
	Mul::mul => Mul,
	Div::div => Div,
	Rem::rem => Rem,
}

/// Value a predicate closure may return
///
/// Either a built expression or a bare boolean field, which stands for
/// `field = true`. Other bare fields are not conditions:
///
/// ```compile_fail
/// use sqlweave_db::backends::PostgresDialect;
/// use sqlweave_db::entity;
/// use sqlweave_db::orm::SqlContext;
/// use std::sync::Arc;
///
/// struct User;
/// entity!(User => "users" { id: i64, age: i32 });
///
/// let ctx = SqlContext::new(Arc::new(PostgresDialect));
/// let _ = ctx.select::<User>().and_then(|s| s.filter(|u| u.age));
/// ```
pub trait Predicate {
	fn into_predicate(self) -> Expr;
}

impl Predicate for Expr {
	fn into_predicate(self) -> Expr {
		self
	}
}

impl<E: Entity> Predicate for Field<E, bool> {
	fn into_predicate(self) -> Expr {
		self.expr()
	}
}

impl<E: Entity> Predicate for Field<E, Option<bool>> {
	fn into_predicate(self) -> Expr {
		self.expr()
	}
}

/// Zero or more field selectors returned from a selection closure
///
/// `()` selects nothing explicitly, which column-list operations expand to
/// every mapped column.
pub trait Selection {
	fn into_exprs(self) -> Vec<Expr>;
}

impl Selection for () {
	fn into_exprs(self) -> Vec<Expr> {
		Vec::new()
	}
}

impl<E: Entity, T> Selection for Field<E, T> {
	fn into_exprs(self) -> Vec<Expr> {
		vec![self.expr()]
	}
}

impl Selection for Expr {
	fn into_exprs(self) -> Vec<Expr> {
		vec![self]
	}
}

impl Selection for Vec<Expr> {
	fn into_exprs(self) -> Vec<Expr> {
		self
	}
}

macro_rules! tuple_selection {
	($($name:ident),+) => {
		impl<$($name: Into<Expr>),+> Selection for ($($name,)+) {
			#[allow(non_snake_case)]
			fn into_exprs(self) -> Vec<Expr> {
				let ($($name,)+) = self;
				vec![$($name.into()),+]
			}
		}
	};
}

tuple_selection!(A);
tuple_selection!(A, B);
tuple_selection!(A, B, C);
tuple_selection!(A, B, C, D);
tuple_selection!(A, B, C, D, F);
tuple_selection!(A, B, C, D, F, G);
tuple_selection!(A, B, C, D, F, G, H);
tuple_selection!(A, B, C, D, F, G, H, I);
