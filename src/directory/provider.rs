//! Provider directory trait and in-memory implementation
//!
//! `lock_if_available` is the concurrency linchpin: it must be a single
//! atomic conditional update (check availability, flip it, return the new
//! record), never a read-then-write pair. Implementations backed by real
//! stores must map it onto that store's compare-and-swap primitive.

use crate::error::{DispatchError, Result};
use crate::types::{ProviderId, ProviderProfile, UserId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Directory operations over provider profiles
pub trait ProviderDirectory: Send + Sync {
    /// All currently available providers whose service type is in the given
    /// pool, in registration order.
    fn find_available(&self, service_types: &[String]) -> Result<Vec<ProviderProfile>>;

    /// Atomically transition availability true -> false and return the
    /// updated record. Returns `None` without mutation if the provider is
    /// absent, already engaged, or (when `required_service_types` is given)
    /// offers a different service.
    fn lock_if_available(
        &self,
        provider_id: ProviderId,
        required_service_types: Option<&[String]>,
    ) -> Result<Option<ProviderProfile>>;

    /// Unconditionally mark a provider available again
    fn release(&self, provider_id: ProviderId) -> Result<()>;

    /// Manual self-service toggle; no precondition, idempotent at the flag
    /// level. Returns the updated record, or `None` if the provider is absent.
    fn set_availability(
        &self,
        provider_id: ProviderId,
        available: bool,
    ) -> Result<Option<ProviderProfile>>;

    /// Look up a provider by id
    fn get(&self, provider_id: ProviderId) -> Result<Option<ProviderProfile>>;

    /// Look up the provider profile owned by a user, if any
    fn find_by_owner(&self, user_id: &UserId) -> Result<Option<ProviderProfile>>;

    /// Register a new provider profile
    fn insert(&self, profile: ProviderProfile) -> Result<()>;

    /// Total number of registered providers
    fn provider_count(&self) -> Result<usize>;
}

struct DirectoryInner {
    providers: HashMap<ProviderId, ProviderProfile>,
    /// Registration order, the stable tie-break for equal distances
    order: Vec<ProviderId>,
}

/// In-memory provider directory
pub struct InMemoryProviderDirectory {
    inner: RwLock<DirectoryInner>,
}

impl InMemoryProviderDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(DirectoryInner {
                providers: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    fn read_inner(&self) -> Result<std::sync::RwLockReadGuard<'_, DirectoryInner>> {
        self.inner.read().map_err(|_| {
            DispatchError::Internal {
                message: "Failed to acquire directory read lock".to_string(),
            }
            .into()
        })
    }

    fn write_inner(&self) -> Result<std::sync::RwLockWriteGuard<'_, DirectoryInner>> {
        self.inner.write().map_err(|_| {
            DispatchError::Internal {
                message: "Failed to acquire directory write lock".to_string(),
            }
            .into()
        })
    }
}

impl Default for InMemoryProviderDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderDirectory for InMemoryProviderDirectory {
    fn find_available(&self, service_types: &[String]) -> Result<Vec<ProviderProfile>> {
        let inner = self.read_inner()?;

        let available = inner
            .order
            .iter()
            .filter_map(|id| inner.providers.get(id))
            .filter(|profile| {
                profile.availability && service_types.contains(&profile.service_type)
            })
            .cloned()
            .collect();

        Ok(available)
    }

    fn lock_if_available(
        &self,
        provider_id: ProviderId,
        required_service_types: Option<&[String]>,
    ) -> Result<Option<ProviderProfile>> {
        let mut inner = self.write_inner()?;

        let Some(profile) = inner.providers.get_mut(&provider_id) else {
            return Ok(None);
        };

        if !profile.availability {
            return Ok(None);
        }

        if let Some(required) = required_service_types {
            if !required.contains(&profile.service_type) {
                return Ok(None);
            }
        }

        profile.availability = false;
        Ok(Some(profile.clone()))
    }

    fn release(&self, provider_id: ProviderId) -> Result<()> {
        let mut inner = self.write_inner()?;

        if let Some(profile) = inner.providers.get_mut(&provider_id) {
            profile.availability = true;
        }

        Ok(())
    }

    fn set_availability(
        &self,
        provider_id: ProviderId,
        available: bool,
    ) -> Result<Option<ProviderProfile>> {
        let mut inner = self.write_inner()?;

        let Some(profile) = inner.providers.get_mut(&provider_id) else {
            return Ok(None);
        };

        profile.availability = available;
        Ok(Some(profile.clone()))
    }

    fn get(&self, provider_id: ProviderId) -> Result<Option<ProviderProfile>> {
        let inner = self.read_inner()?;
        Ok(inner.providers.get(&provider_id).cloned())
    }

    fn find_by_owner(&self, user_id: &UserId) -> Result<Option<ProviderProfile>> {
        let inner = self.read_inner()?;

        Ok(inner
            .providers
            .values()
            .find(|profile| profile.owner.as_ref() == Some(user_id))
            .cloned())
    }

    fn insert(&self, profile: ProviderProfile) -> Result<()> {
        let mut inner = self.write_inner()?;

        if !inner.providers.contains_key(&profile.id) {
            inner.order.push(profile.id);
        }
        inner.providers.insert(profile.id, profile);

        Ok(())
    }

    fn provider_count(&self) -> Result<usize> {
        let inner = self.read_inner()?;
        Ok(inner.providers.len())
    }
}
