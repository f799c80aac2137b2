//! In-memory container backend for the Mirage runtime.
//!
//! Containers and processes never touch the host: a process is a timer
//! replaying the outcome encoded in its spec, and a container is a set of
//! locked maps.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod backend;
pub mod container;
pub mod info;
mod lock;
pub mod metrics;
pub mod process;
