//! Multi-tier package cache, local registration, overrides, and the
//! fetch/store/remove protocols that keep them consistent under
//! concurrent access.

pub mod cache;
pub mod error;
pub mod manager;
pub mod registration;
pub mod tier;

pub use error::{ManagerError, ManagerResult};
pub use manager::{IndexedPackage, PackageManager};
pub use registration::{LocalPackageEntry, OverrideEntry, OverrideTarget};
pub use tier::{Tier, TierRoots};
