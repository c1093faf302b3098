//! # Discovery registry: name → identity.
//!
//! [`Discovery`] is the lookup seam identities use to find each other;
//! [`MemoryDiscovery`] is the in-process implementation the supervisor
//! creates for each launch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::DiscoveryError;

use super::identity::Identity;
use super::message::Address;

/// Shared handle to a registry.
pub type DiscoveryRef = Arc<dyn Discovery>;

/// Registration and lookup of identities.
pub trait Discovery: Send + Sync + 'static {
    /// Declares an identity. Fails if its name is empty or already taken.
    fn register(&self, identity: Arc<dyn Identity>) -> Result<(), DiscoveryError>;

    /// Returns the inbound address of the identity called `name`.
    fn find(&self, name: &str) -> Result<Address, DiscoveryError>;
}

/// In-memory registry guarded by a single mutex.
#[derive(Default)]
pub struct MemoryDiscovery {
    ids: Mutex<HashMap<String, Arc<dyn Identity>>>,
}

impl MemoryDiscovery {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry behind a [`DiscoveryRef`].
    pub fn shared() -> DiscoveryRef {
        Arc::new(Self::new())
    }

    /// Returns sorted list of registered names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn Identity>>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Discovery for MemoryDiscovery {
    fn register(&self, identity: Arc<dyn Identity>) -> Result<(), DiscoveryError> {
        let name = identity.name();
        if name.is_empty() {
            return Err(DiscoveryError::InvalidName);
        }

        let mut ids = self.lock();
        if ids.contains_key(name) {
            return Err(DiscoveryError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        ids.insert(name.to_string(), identity);
        Ok(())
    }

    fn find(&self, name: &str) -> Result<Address, DiscoveryError> {
        if name.is_empty() {
            return Err(DiscoveryError::InvalidName);
        }

        self.lock()
            .get(name)
            .map(|id| id.address())
            .ok_or_else(|| DiscoveryError::NotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{ChannelPools, MemoryIdentity};
    use std::time::Duration;

    fn identity(name: &str) -> Arc<dyn Identity> {
        Arc::new(MemoryIdentity::new(
            name,
            Duration::from_secs(1),
            None,
            ChannelPools::new(),
        ))
    }

    #[test]
    fn test_register_then_find() {
        let ds = MemoryDiscovery::new();
        ds.register(identity("bob")).unwrap();

        let addr = ds.find("bob").unwrap();
        assert!(!addr.is_closed());
        assert_eq!(ds.names(), vec!["bob".to_string()]);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let ds = MemoryDiscovery::new();
        ds.register(identity("bob")).unwrap();

        let err = ds.register(identity("bob")).unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::AlreadyRegistered {
                name: "bob".into()
            }
        );
    }

    #[test]
    fn test_register_rejects_empty_name() {
        let ds = MemoryDiscovery::new();
        assert_eq!(
            ds.register(identity("")).unwrap_err(),
            DiscoveryError::InvalidName
        );
    }

    #[test]
    fn test_find_errors() {
        let ds = MemoryDiscovery::new();
        assert_eq!(ds.find("").unwrap_err(), DiscoveryError::InvalidName);
        assert_eq!(
            ds.find("alice").unwrap_err(),
            DiscoveryError::NotFound {
                name: "alice".into()
            }
        );
    }
}
