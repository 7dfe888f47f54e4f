//! Zone and record name normalization
//!
//! Update messages and TSIG names want the dot-terminated form, zone reads
//! want the bare form. Keep the two apart.

use crate::{Error, Result};

/// Marker for the zone apex in record names
pub const APEX: &str = "@";

/// Enforce the trailing dot
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Strip the trailing dot, as used for zone reads
pub fn query_name(zone: &str) -> Result<String> {
    let name = zone.trim().trim_end_matches('.');
    if name.is_empty() {
        return Err(Error::invalid_input("zone name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Dot-terminated zone name, as used in the update message zone section
pub fn update_zone(zone: &str) -> Result<String> {
    query_name(zone).map(|name| fqdn(&name))
}

/// Combine a record name with its zone
///
/// Relative names are resolved against the zone, names ending in a dot are
/// already absolute, and the empty name or `@` denote the apex.
pub fn absolute_name(name: &str, zone: &str) -> Result<String> {
    let zone = update_zone(zone)?;
    let name = name.trim();
    if name.is_empty() || name == APEX {
        return Ok(zone);
    }
    if name.ends_with('.') {
        return Ok(name.to_string());
    }
    Ok(format!("{name}.{zone}"))
}
