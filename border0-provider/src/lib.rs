//! Border0 Provider
//!
//! Manages Border0 zero-trust entities (sockets, policies, connectors,
//! users, groups, service accounts and their tokens) as declarative
//! resources.
//!
//! ## Module Structure
//!
//! - `config` - Provider block, environment resolution and API access
//! - `resources` - One controller per resource kind
//! - `translators` - Socket configuration blocks to and from upstream objects
//! - `data_sources` - Policy document generators and name to id lookups
//! - `provider` - Registry and the `Provider` implementation

pub mod config;
pub mod data_sources;
pub mod provider;
pub mod resources;
pub mod translators;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, ProviderConfig, ProviderMeta};
pub use provider::{Border0Provider, Registry, host_name, kind_name};
