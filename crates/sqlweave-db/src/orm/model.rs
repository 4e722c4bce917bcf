//! Entity metadata and typed field handles
//!
//! An entity is a plain Rust struct whose instances map one-to-one to rows
//! of a table. Its metadata is declared once with [`entity!`](crate::entity)
//! and is immutable afterwards.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

/// One mapped column of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
	/// Rust field name
	pub field: &'static str,
	/// SQL column name when it differs from the field name
	pub alias: Option<&'static str>,
}

impl ColumnDescriptor {
	pub const fn new(field: &'static str) -> Self {
		Self { field, alias: None }
	}

	pub const fn aliased(field: &'static str, alias: &'static str) -> Self {
		Self {
			field,
			alias: Some(alias),
		}
	}

	/// Name of the column in SQL
	///
	/// # Examples
	///
	/// ```
	/// use sqlweave_db::orm::ColumnDescriptor;
	///
	/// assert_eq!(ColumnDescriptor::new("email").column_name(), "email");
	/// assert_eq!(ColumnDescriptor::aliased("name", "user_name").column_name(), "user_name");
	/// ```
	pub fn column_name(&self) -> &'static str {
		self.alias.unwrap_or(self.field)
	}
}

/// Table-level metadata of an entity
#[derive(Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
	pub name: &'static str,
	pub table: &'static str,
	pub schema: Option<&'static str>,
	/// Columns in declaration order
	pub columns: &'static [ColumnDescriptor],
}

impl EntityDescriptor {
	pub fn column(&self, field: &str) -> Option<&'static ColumnDescriptor> {
		self.columns.iter().find(|column| column.field == field)
	}

	pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.columns.iter().map(ColumnDescriptor::column_name)
	}
}

/// Type identity of an entity, used to look up its metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
	pub type_id: TypeId,
	pub type_name: &'static str,
}

impl EntityKey {
	pub fn of<E: Entity>() -> Self {
		Self {
			type_id: TypeId::of::<E>(),
			type_name: std::any::type_name::<E>(),
		}
	}
}

/// Index of the shape a field handle belongs to inside a predicate
///
/// Single-shape predicates only use slot 0; two-shape predicates (joins,
/// cross-entity filters) use 0 for the left shape and 1 for the right one.
pub type Slot = u8;

/// Generated set of field handles of one entity
pub trait FieldSet: Copy {
	fn at_slot(slot: Slot) -> Self;
}

/// A type with registered table metadata
pub trait Entity: 'static {
	type Fields: FieldSet;

	fn descriptor() -> &'static EntityDescriptor;

	/// Field handles for single-shape selectors
	fn fields() -> Self::Fields {
		Self::Fields::at_slot(0)
	}
}

/// Typed handle to one mapped field of `E` holding values of type `T`
pub struct Field<E, T> {
	name: &'static str,
	slot: Slot,
	_marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Field<E, T> {
	pub const fn new(name: &'static str, slot: Slot) -> Self {
		Self {
			name,
			slot,
			_marker: PhantomData,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn slot(&self) -> Slot {
		self.slot
	}
}

impl<E, T> Clone for Field<E, T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<E, T> Copy for Field<E, T> {}

impl<E, T> fmt::Debug for Field<E, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Field")
			.field("entity", &std::any::type_name::<E>())
			.field("name", &self.name)
			.field("slot", &self.slot)
			.finish()
	}
}

/// Declare the table metadata of an existing struct
///
/// Generates a `<Entity>Fields` struct of typed [`Field`] handles, implements
/// [`Entity`], and registers the metadata so the global
/// [`MetadataRegistry`](crate::orm::MetadataRegistry) can resolve it.
/// A `=> "column"` suffix maps a field to a differently named column.
///
/// ```
/// use sqlweave_db::entity;
///
/// pub struct Customer {
///     pub id: i64,
///     pub name: String,
///     pub email: Option<String>,
/// }
///
/// entity!(pub Customer => "sales"."customers" {
///     id: i64,
///     name: String => "full_name",
///     email: Option<String>,
/// });
///
/// use sqlweave_db::orm::Entity;
/// let descriptor = Customer::descriptor();
/// assert_eq!(descriptor.table, "customers");
/// assert_eq!(descriptor.schema, Some("sales"));
/// assert_eq!(descriptor.columns[1].column_name(), "full_name");
/// ```
#[macro_export]
macro_rules! entity {
	($vis:vis $entity:ident => $schema:literal . $table:literal { $($body:tt)* }) => {
		$crate::entity!(@impl $vis $entity, Some($schema), $table, { $($body)* });
	};
	($vis:vis $entity:ident => $table:literal { $($body:tt)* }) => {
		$crate::entity!(@impl $vis $entity, None, $table, { $($body)* });
	};
	(@impl $vis:vis $entity:ident, $schema:expr, $table:literal, {
		$( $field:ident : $ty:ty $(=> $column:literal)? ),* $(,)?
	}) => {
		$crate::paste::paste! {
			#[doc = concat!("Typed field handles of `", stringify!($entity), "`")]
			#[derive(Debug, Clone, Copy)]
			$vis struct [<$entity Fields>] {
				$( pub $field: $crate::orm::Field<$entity, $ty>, )*
			}

			impl $crate::orm::FieldSet for [<$entity Fields>] {
				#[allow(unused_variables)]
				fn at_slot(slot: $crate::orm::Slot) -> Self {
					Self {
						$( $field: $crate::orm::Field::new(stringify!($field), slot), )*
					}
				}
			}

			impl $crate::orm::Entity for $entity {
				type Fields = [<$entity Fields>];

				fn descriptor() -> &'static $crate::orm::EntityDescriptor {
					static DESCRIPTOR: $crate::orm::EntityDescriptor = $crate::orm::EntityDescriptor {
						name: stringify!($entity),
						table: $table,
						schema: $schema,
						columns: &[
							$( $crate::orm::ColumnDescriptor {
								field: stringify!($field),
								alias: $crate::entity!(@alias $($column)?),
							}, )*
						],
					};
					&DESCRIPTOR
				}
			}

			$crate::inventory::submit! {
				$crate::orm::EntityRegistration::of::<$entity>()
			}
		}
	};
	(@alias) => { None };
	(@alias $column:literal) => { Some($column) };
}
