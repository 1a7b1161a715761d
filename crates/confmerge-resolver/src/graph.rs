//! The standard service dependency graph and package-to-service map.
//!
//! Both tables describe the fixed router service topology this engine was
//! distilled from: `network` underlies name resolution and the web UI,
//! `firewall` and name resolution underlie the captive-portal service, and
//! so on. They are exposed as owned `Vec`s so [`crate::Resolver::standard`]
//! and the default resolver behind the free functions can each build their
//! own copy; embedders with a different topology pass their own tables to
//! [`crate::Resolver::new`] instead.

/// `(dependency, dependent)` — `dependency` must be restarted before
/// `dependent` whenever both are in a restart plan.
const EDGES: &[(&str, &str)] = &[
    ("network", "firewall"),
    ("network", "dnsmasq"),
    ("network", "uhttpd"),
    ("firewall", "dnsmasq"),
    ("firewall", "uspot"),
    ("dnsmasq", "uspot"),
    ("uhttpd", "uspot"),
];

/// Config package name -> the service it maps to.
const PACKAGE_SERVICE: &[(&str, &str)] = &[
    ("network", "network"),
    ("wireless", "network"),
    ("dhcp", "dnsmasq"),
    ("firewall", "firewall"),
    ("uhttpd", "uhttpd"),
    ("dropbear", "dropbear"),
    ("system", "log"),
    ("uspot", "uspot"),
];

/// Declared service order, used only to break ties deterministically among
/// services that become ready at the same point in the topological sort.
const DECLARED_ORDER: &[&str] = &["network", "firewall", "dnsmasq", "uhttpd", "dropbear", "log", "uspot"];

pub(crate) fn standard_edges() -> Vec<(String, String)> {
    EDGES.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
}

pub(crate) fn standard_package_map() -> Vec<(String, String)> {
    PACKAGE_SERVICE.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
}

pub(crate) fn standard_declared_order() -> Vec<String> {
    DECLARED_ORDER.iter().map(|s| s.to_string()).collect()
}

/// All known services in the standard topology, in declared order.
pub fn known_services() -> &'static [&'static str] {
    DECLARED_ORDER
}
