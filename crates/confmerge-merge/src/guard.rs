//! The `preserve-network` guard (spec §4.2).
//!
//! The spec names three protected behaviors on the `network` package
//! without defining "management interface" or "default gateway"
//! operationally — those concepts live in the live network stack, not in
//! a package tree. This module resolves that ambiguity the same way for
//! all three: the `lan` interface section stands in for both "the
//! management interface" and "the default gateway," which matches how
//! the router this engine was distilled from is actually configured in
//! practice (LAN-side management, LAN-side DHCP/DNS). See `DESIGN.md` for
//! the recorded decision.

use confmerge_model::Section;

const GUARDED_NETWORK_PACKAGE: &str = "network";
const MANAGEMENT_SECTION_NAME: &str = "lan";
const MANAGEMENT_OPTIONS: &[&str] = &["proto", "ipaddr", "device", "netmask"];
const GUARDED_DNS_LIST: &str = "dns";

fn is_management_section(section: &Section) -> bool {
    section.section_type == "interface" && section.name.as_deref() == Some(MANAGEMENT_SECTION_NAME)
}

/// True if changing `option_name` on `section` within `package` would
/// disturb the management interface's addressing and must be guarded.
pub fn guards_option(package: &str, section: &Section, option_name: &str) -> bool {
    package == GUARDED_NETWORK_PACKAGE
        && is_management_section(section)
        && MANAGEMENT_OPTIONS.contains(&option_name)
}

/// True if shrinking `list_name` on `section` within `package` could drop
/// the default gateway's DNS and must be guarded.
pub fn guards_list(package: &str, section: &Section, list_name: &str) -> bool {
    package == GUARDED_NETWORK_PACKAGE && is_management_section(section) && list_name == GUARDED_DNS_LIST
}

/// True if removing or renaming `section` within `package` would disturb
/// the management interface and must be guarded (used by the
/// orchestrator's `remove-matching` path, which is the only path that can
/// remove a section at all — plain `merge` never does).
pub fn guards_removal(package: &str, section: &Section) -> bool {
    package == GUARDED_NETWORK_PACKAGE && is_management_section(section)
}
