// API key pool and quota failover
pub mod failover;
pub mod pool;

pub use failover::FailoverController;
pub use pool::{CredentialLease, CredentialPool, CredentialStatus, PoolStats};
