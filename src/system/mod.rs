pub mod backup;
mod cache;
pub mod executor;
mod service;

pub use backup::{BackupEntry, CopyReport};
pub use cache::{CachedService, TtlCache};
pub use executor::{PackageManager, PackageOp, SystemInfo};
pub use service::{
    create_service, format_command_string, DryrunService, LiveService, ServiceOp, SystemService,
};
