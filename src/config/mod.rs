//! Configuration module

mod site;

pub use site::CmsConfig;
pub use site::FallbackMode;
pub use site::ListingConfig;
pub use site::PostConfig;
pub use site::ReadingConfig;
pub use site::SiteConfig;
