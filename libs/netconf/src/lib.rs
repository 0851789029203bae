//! # vfnet-netconf
//!
//! Configuration resolution and caching for attaching a container network
//! namespace to an SR-IOV virtual function (VF).
//!
//! ## Lifecycle
//!
//! ```text
//! attach:  raw netconf ──► ConfigResolver ──► VfNetConf ──► ConfigCache::store
//!                              │
//!                              └── HostIntrospection (PF, VF index, netdev, driver)
//!
//! detach:  ConfigCache::load(key) ──► VfNetConf ──► teardown (caller)
//! ```
//!
//! The resolver fails before anything is written, so a record that reaches
//! the cache always satisfies the VF mode and VLAN invariants. The cache
//! hands back the storage address on load; removing the entry once teardown
//! has finished is the caller's job.
//!
//! ## Wire format
//!
//! Records are JSON objects with field-name tags (`deviceID`, `master`,
//! `vfID`, `hostIFNames`, `dpdkMode`, `vlan`, `vlanQoS`). Any other
//! top-level field from the raw netconf is carried through untouched.

mod cache;
mod error;
mod host;
mod resolver;
mod store;
mod types;

pub use cache::{CacheConfig, CacheKey, ConfigCache, DEFAULT_CACHE_DIR, KEY_SEPARATOR};
pub use error::{CacheError, HostError, KeyError, ResolveError};
pub use host::HostIntrospection;
pub use resolver::ConfigResolver;
pub use store::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use types::{
    validate_vlan, NetConfInput, VfNetConf, DERIVED_KEYS, MAX_VLAN_ID, MAX_VLAN_QOS,
};
