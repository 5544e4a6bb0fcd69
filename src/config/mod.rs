//! Configuration module

mod site;

pub use site::SiteConfig;
pub use site::ChainKind;
pub use site::GiteaConfig;
pub use site::MarkdownConfig;
pub use site::ServerConfig;
pub use site::SourceConfig;
pub use site::SourceKind;
pub use site::SourceOverride;
