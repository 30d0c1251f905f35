//! Capability gate - which tool families the configured credentials unlock

use serde::Serialize;

use crate::config::Credentials;

/// Capabilities derived once from credential presence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    /// Data API reachable (hostname plus OAuth client)
    pub data_api: bool,
    /// Instance logs reachable (hostname plus user or OAuth client)
    pub log_access: bool,
    /// No instance configured at all
    pub local_mode: bool,
}

/// Derive the capability set from credentials
///
/// Pure function: no I/O, blank values count as absent.
#[must_use]
pub fn derive_capabilities(credentials: &Credentials) -> CapabilitySet {
    let has_host = credentials.hostname().is_some();
    let has_client = credentials.client_id().is_some() && credentials.client_secret().is_some();
    let has_user = credentials.username().is_some() && credentials.password().is_some();

    CapabilitySet {
        data_api: has_host && has_client,
        log_access: has_host && (has_user || has_client),
        local_mode: !has_host,
    }
}
