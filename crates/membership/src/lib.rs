//! Registry subscription for ring state synchronization.
//!
//! This crate keeps a [`RingAccessor`](corelib::RingAccessor) in step with a
//! service registry:
//! - [`Registry`] / [`Watch`]: the boundary to whatever tracks live instances
//! - [`Subscription`]: the long-lived watch loop with bounded reconnects
//! - [`StaticRegistry`] and [`FileRegistry`]: simple registries for
//!   deployments without a discovery service

pub mod backoff;
pub mod error;
pub mod file_registry;
pub mod registry;
pub mod static_registry;
pub mod subscription;


pub use backoff::Backoff;
pub use error::{RegistryError, SubscriptionError};
pub use file_registry::FileRegistry;
pub use registry::{MembershipEvent, Registry, Watch};
pub use static_registry::StaticRegistry;
pub use subscription::{Subscription, SubscriptionHandle, SubscriptionState};
