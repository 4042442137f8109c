//! GraphDB Core Library
//!
//! Wire models shared by the GraphDB REST client:
//! - Repository, location, saved query, and server info payloads
//! - Cluster configuration and node status
//! - Security, free access, and ACL rules
//! - Monitoring statistics
//! - Backup, restore, and report payloads
//! - JSON values with server-decided shapes (list-or-mapping, int-or-string)
//! - File-based client configuration

pub mod cluster;
pub mod config;
pub mod models;
pub mod monitoring;
pub mod recovery;
pub mod security;
pub mod shapes;

// Re-export commonly used types
pub use cluster::{ClusterConfig, ClusterProperties, NodeStatus};
pub use config::ClientConfig;
pub use models::*;
pub use recovery::{BackupOptions, ReportState, ReportStatus, RestoreOptions};
pub use security::{AclRule, AclScope, FreeAccess, User, UserDetails};
pub use shapes::{IntOrString, Messages, StringList};
