//! Entity metadata registry
//!
//! Metadata is registered statically by the [`entity!`](crate::entity) macro
//! through `inventory` and collected into the global registry the first time
//! it is used. Separate registries can be assembled by hand, which is mostly
//! useful in tests.

use super::error::{QueryError, Result};
use super::model::{Entity, EntityDescriptor, EntityKey};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Static registration record submitted by [`entity!`](crate::entity)
pub struct EntityRegistration {
	type_id: fn() -> TypeId,
	descriptor: fn() -> &'static EntityDescriptor,
}

impl EntityRegistration {
	pub const fn of<E: Entity>() -> Self {
		Self {
			type_id: TypeId::of::<E>,
			descriptor: E::descriptor,
		}
	}
}

inventory::collect!(EntityRegistration);

static GLOBAL_REGISTRY: Lazy<Arc<MetadataRegistry>> =
	Lazy::new(|| Arc::new(MetadataRegistry::from_inventory()));

/// Type identity to table metadata lookup
///
/// Read-mostly: registrations happen at startup, lookups afterwards may come
/// from any number of threads.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
	entries: RwLock<HashMap<TypeId, &'static EntityDescriptor>>,
}

impl MetadataRegistry {
	/// Create an empty registry
	///
	/// # Examples
	///
	/// ```
	/// use sqlweave_db::orm::MetadataRegistry;
	///
	/// let registry = MetadataRegistry::new();
	/// assert!(registry.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a registry from every `entity!` declaration linked into the binary
	pub fn from_inventory() -> Self {
		let registry = Self::new();
		for registration in inventory::iter::<EntityRegistration> {
			registry.insert((registration.type_id)(), (registration.descriptor)());
		}
		tracing::debug!(entities = registry.len(), "collected entity metadata");
		registry
	}

	/// Shared registry holding all statically declared entities
	pub fn global() -> Arc<MetadataRegistry> {
		Arc::clone(&GLOBAL_REGISTRY)
	}

	/// Register the metadata of `E`
	pub fn register<E: Entity>(&self) -> &Self {
		self.insert(TypeId::of::<E>(), E::descriptor());
		self
	}

	/// Register an explicit descriptor for a type
	pub fn register_descriptor(&self, type_id: TypeId, descriptor: &'static EntityDescriptor) {
		self.insert(type_id, descriptor);
	}

	fn insert(&self, type_id: TypeId, descriptor: &'static EntityDescriptor) {
		let previous = self.entries.write().insert(type_id, descriptor);
		if let Some(previous) = previous {
			if !std::ptr::eq(previous, descriptor) {
				tracing::warn!(
					entity = descriptor.name,
					table = descriptor.table,
					"replacing previously registered entity metadata"
				);
			}
		}
	}

	pub fn get(&self, type_id: TypeId) -> Option<&'static EntityDescriptor> {
		self.entries.read().get(&type_id).copied()
	}

	/// Look up metadata, failing when the entity was never registered
	pub fn resolve(&self, key: EntityKey) -> Result<&'static EntityDescriptor> {
		self.get(key.type_id)
			.ok_or_else(|| QueryError::MissingMetadata {
				entity: key.type_name.to_string(),
			})
	}

	pub fn contains<E: Entity>(&self) -> bool {
		self.entries.read().contains_key(&TypeId::of::<E>())
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}
