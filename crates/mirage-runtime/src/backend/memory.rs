//! In-memory backend holding every container in a handle map.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use mirage_common::config::MirageConfig;
use mirage_common::error::{MirageError, Result};
use mirage_common::types::{Capacity, ContainerSpec, Properties, generate_handle};

use super::Backend;
use crate::container::Container;
use crate::info::ContainerInfoEntry;
use crate::lock;
use crate::metrics::ContainerMetricsEntry;

/// Backend that keeps containers in memory and simulates their processes.
///
/// The handle map sits behind one `RwLock`: create and destroy take the
/// write side for the whole check-then-mutate step, queries take the read
/// side.
#[derive(Debug)]
pub struct InMemoryBackend {
    capacity: Capacity,
    grace_time: Duration,
    containers: RwLock<HashMap<String, Arc<Container>>>,
}

impl InMemoryBackend {
    /// Creates an empty backend advertising `capacity`.
    #[must_use]
    pub fn new(capacity: Capacity, grace_time: Duration) -> Self {
        Self {
            capacity,
            grace_time,
            containers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an empty backend from the runtime configuration.
    #[must_use]
    pub fn from_config(config: &MirageConfig) -> Self {
        Self::new(config.capacity(), config.container_grace_time)
    }

    /// Returns the number of live containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(lock::read(&self.containers, "container registry")?.len())
    }

    /// Returns whether no container is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Backend for InMemoryBackend {
    fn start(&self) -> Result<()> {
        tracing::info!(capacity = ?self.capacity, "backend started");
        Ok(())
    }

    fn stop(&self) {
        tracing::info!("backend stopped");
    }

    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn capacity(&self) -> Capacity {
        self.capacity
    }

    fn create(&self, mut spec: ContainerSpec) -> Result<Arc<Container>> {
        if spec.handle.is_empty() {
            spec.handle = generate_handle();
        }
        let mut containers = lock::write(&self.containers, "container registry")?;
        match containers.entry(spec.handle.clone()) {
            Entry::Occupied(existing) => {
                tracing::info!(handle = %existing.key(), "handle already taken");
                Err(MirageError::AlreadyExists {
                    kind: "container",
                    id: existing.key().clone(),
                })
            }
            Entry::Vacant(slot) => {
                let container = Arc::new(Container::new(spec));
                tracing::info!(handle = %container.handle(), "container created");
                let _ = slot.insert(Arc::clone(&container));
                Ok(container)
            }
        }
    }

    fn destroy(&self, handle: &str) -> Result<()> {
        let removed = lock::write(&self.containers, "container registry")?.remove(handle);
        if removed.is_none() {
            return Err(MirageError::not_found("container", handle));
        }
        tracing::info!(handle, "container destroyed");
        Ok(())
    }

    fn lookup(&self, handle: &str) -> Result<Arc<Container>> {
        lock::read(&self.containers, "container registry")?
            .get(handle)
            .cloned()
            .ok_or_else(|| MirageError::not_found("container", handle))
    }

    fn containers(&self, filter: &Properties) -> Result<Vec<Arc<Container>>> {
        let containers = lock::read(&self.containers, "container registry")?;
        let mut matching = Vec::new();
        for container in containers.values() {
            if container.matches(filter)? {
                matching.push(Arc::clone(container));
            }
        }
        tracing::debug!(?filter, matched = matching.len(), "listed containers");
        Ok(matching)
    }

    fn bulk_info(&self, handles: &[String]) -> Result<HashMap<String, ContainerInfoEntry>> {
        let containers = lock::read(&self.containers, "container registry")?;
        Ok(handles
            .iter()
            .filter_map(|handle| {
                containers
                    .get(handle)
                    .map(|c| (handle.clone(), ContainerInfoEntry::from(c.info())))
            })
            .collect())
    }

    fn bulk_metrics(&self, handles: &[String]) -> Result<HashMap<String, ContainerMetricsEntry>> {
        let containers = lock::read(&self.containers, "container registry")?;
        Ok(handles
            .iter()
            .filter_map(|handle| {
                containers
                    .get(handle)
                    .map(|c| (handle.clone(), ContainerMetricsEntry::from(Ok(c.metrics()))))
            })
            .collect())
    }

    fn grace_time(&self, _container: &Container) -> Duration {
        self.grace_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new(
            Capacity {
                memory_in_bytes: 1 << 30,
                disk_in_bytes: 1 << 34,
                max_containers: 3,
            },
            Duration::from_secs(300),
        )
    }

    fn with_properties(handle: &str, pairs: &[(&str, &str)]) -> ContainerSpec {
        let mut spec = ContainerSpec::with_handle(handle);
        spec.properties = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        spec
    }

    fn filter(pairs: &[(&str, &str)]) -> Properties {
        with_properties("", pairs).properties
    }

    fn handles(containers: &[Arc<Container>]) -> Vec<String> {
        let mut handles: Vec<_> = containers.iter().map(|c| c.handle().to_string()).collect();
        handles.sort();
        handles
    }

    #[test]
    fn boundary_values_are_echoed() {
        let b = backend();
        b.start().unwrap();
        b.ping().unwrap();
        assert_eq!(b.capacity().max_containers, 3);
        let c = b.create(ContainerSpec::with_handle("box1")).unwrap();
        assert_eq!(b.grace_time(&c), Duration::from_secs(300));
        b.stop();
    }

    #[test]
    fn capacity_is_not_enforced() {
        let b = backend();
        for i in 0..5 {
            let _ = b.create(ContainerSpec::with_handle(format!("box{i}"))).unwrap();
        }
        assert_eq!(b.len().unwrap(), 5);
    }

    #[test]
    fn duplicate_create_fails_without_overwriting() {
        let b = backend();
        let first = b.create(with_properties("box1", &[("v", "first")])).unwrap();

        let err = b.create(with_properties("box1", &[("v", "second")])).unwrap_err();
        assert!(err.is_already_exists());

        let found = b.lookup("box1").unwrap();
        assert!(Arc::ptr_eq(&first, &found));
        assert_eq!(found.property("v").unwrap(), "first");
    }

    #[test]
    fn empty_handle_is_generated() {
        let b = backend();
        let a = b.create(ContainerSpec::default()).unwrap();
        let c = b.create(ContainerSpec::default()).unwrap();
        assert!(!a.handle().is_empty());
        assert_ne!(a.handle(), c.handle());
        assert!(b.lookup(a.handle()).is_ok());
    }

    #[test]
    fn destroy_unknown_handle_leaves_registry_unchanged() {
        let b = backend();
        let _ = b.create(ContainerSpec::with_handle("box1")).unwrap();
        assert!(b.destroy("ghost").unwrap_err().is_not_found());
        assert_eq!(b.len().unwrap(), 1);
    }

    #[test]
    fn destroyed_container_is_gone() {
        let b = backend();
        let _ = b.create(ContainerSpec::with_handle("box1")).unwrap();
        b.destroy("box1").unwrap();
        assert!(b.lookup("box1").unwrap_err().is_not_found());
        assert!(b.destroy("box1").unwrap_err().is_not_found());
        assert!(b.is_empty().unwrap());

        // The handle is free again once destroyed.
        let _ = b.create(ContainerSpec::with_handle("box1")).unwrap();
    }

    #[test]
    fn containers_filter_by_property_superset() {
        let b = backend();
        let _ = b.create(with_properties("ab", &[("a", "1"), ("b", "2")])).unwrap();
        let _ = b.create(with_properties("a2", &[("a", "2")])).unwrap();
        let _ = b.create(with_properties("bare", &[])).unwrap();

        assert_eq!(handles(&b.containers(&filter(&[("a", "1")])).unwrap()), vec!["ab"]);
        assert!(b.containers(&filter(&[("a", "1"), ("c", "3")])).unwrap().is_empty());
        assert_eq!(handles(&b.containers(&filter(&[("a", "2")])).unwrap()), vec!["a2"]);
        assert_eq!(
            handles(&b.containers(&Properties::new()).unwrap()),
            vec!["a2", "ab", "bare"]
        );
    }

    #[test]
    fn containers_filter_sees_property_updates() {
        let b = backend();
        let c = b.create(ContainerSpec::with_handle("box1")).unwrap();
        let filter = with_properties("", &[("stage", "ready")]).properties;
        assert!(b.containers(&filter).unwrap().is_empty());

        c.set_property("stage", "ready").unwrap();
        assert_eq!(b.containers(&filter).unwrap().len(), 1);

        c.remove_property("stage").unwrap();
        assert!(b.containers(&filter).unwrap().is_empty());
    }

    #[test]
    fn bulk_queries_omit_unknown_handles() {
        let b = backend();
        let _ = b.create(ContainerSpec::with_handle("real")).unwrap();
        let requested = vec!["real".to_string(), "ghost".to_string()];

        let infos = b.bulk_info(&requested).unwrap();
        assert_eq!(infos.len(), 1);
        let entry = &infos["real"];
        assert!(entry.error.is_none());
        assert_eq!(entry.info.external_ip, "localhost");

        let metrics = b.bulk_metrics(&requested).unwrap();
        assert_eq!(metrics.len(), 1);
        assert!(metrics["real"].error.is_none());
        assert!(!metrics.contains_key("ghost"));
    }

    #[test]
    fn bulk_queries_with_no_handles_are_empty() {
        let b = backend();
        let _ = b.create(ContainerSpec::with_handle("real")).unwrap();
        assert!(b.bulk_info(&[]).unwrap().is_empty());
        assert!(b.bulk_metrics(&[]).unwrap().is_empty());
    }
}
