//! Backend abstraction mounted behind the container API server.

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mirage_common::error::Result;
use mirage_common::types::{Capacity, ContainerSpec, Properties};

use crate::container::Container;
use crate::info::ContainerInfoEntry;
use crate::metrics::ContainerMetricsEntry;

pub use memory::InMemoryBackend;

/// Server-side contract of the container API.
///
/// Implementors own the handle registry; the API server only translates
/// requests into these calls.
pub trait Backend: Send + Sync {
    /// Prepares the backend for serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start.
    fn start(&self) -> Result<()>;

    /// Shuts the backend down.
    fn stop(&self);

    /// Checks that the backend is responsive.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unhealthy.
    fn ping(&self) -> Result<()>;

    /// Returns the advertised capacity.
    fn capacity(&self) -> Capacity;

    /// Creates and registers a container.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::AlreadyExists`](mirage_common::error::MirageError::AlreadyExists)
    /// if the handle is taken.
    fn create(&self, spec: ContainerSpec) -> Result<Arc<Container>>;

    /// Destroys a container and every process it owns.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::NotFound`](mirage_common::error::MirageError::NotFound)
    /// if the handle is unknown.
    fn destroy(&self, handle: &str) -> Result<()>;

    /// Looks up a container by handle.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::NotFound`](mirage_common::error::MirageError::NotFound)
    /// if the handle is unknown.
    fn lookup(&self, handle: &str) -> Result<Arc<Container>>;

    /// Lists containers whose properties include every `filter` entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    fn containers(&self, filter: &Properties) -> Result<Vec<Arc<Container>>>;

    /// Returns info for each known handle; unknown handles are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    fn bulk_info(&self, handles: &[String]) -> Result<HashMap<String, ContainerInfoEntry>>;

    /// Returns metrics for each known handle; unknown handles are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    fn bulk_metrics(&self, handles: &[String]) -> Result<HashMap<String, ContainerMetricsEntry>>;

    /// Returns the idle-destruction timeout for `container`.
    fn grace_time(&self, container: &Container) -> Duration;
}
