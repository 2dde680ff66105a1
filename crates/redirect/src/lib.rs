//! Per-request redirect decisions for device sessions.
//!
//! A request carries a device name. The name is hashed onto the current
//! ring from a [`RingAccessor`](corelib::RingAccessor), and the request is
//! either handled here (this router owns the device) or redirected to the
//! owning node with its path and query intact.
//!
//! - [`DeviceId`]: device name parsing and normalization
//! - [`IdentifierExtractor`] / [`HeaderExtractor`]: where the name comes from
//! - [`Redirector`]: the ownership decision
//! - [`redirect_middleware`] / [`wrap`]: the axum integration

pub mod decision;
pub mod device;
pub mod error;
pub mod extract;
pub mod service;

#[cfg(test)]
mod tests;

pub use decision::{Decision, RedirectStatus, Redirector};
pub use device::{DeviceId, DeviceIdError, Scheme};
pub use error::{ConfigError, RouteError};
pub use extract::{HeaderExtractor, IdentifierExtractor, DEFAULT_DEVICE_HEADER};
pub use service::{redirect_middleware, wrap, RouterState};
