//! Registry supplier interface and an HTTP-backed implementation, composed
//! by a fallback chain that tries each configured supplier in order.

pub mod error;
pub mod http;
pub mod supplier;

pub use error::{RegistryError, RegistryResult};
pub use http::{HttpClientConfig, HttpSupplier};
pub use supplier::{FallbackSupplier, PackageSummary, RegistrySupplier};
