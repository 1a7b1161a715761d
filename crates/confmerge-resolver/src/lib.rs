//! Service dependency resolution: which services a set of changed config
//! packages must restart, and in what order (spec §4.3).

mod error;
mod graph;
mod resolver;

pub use error::ResolverError;
pub use graph::known_services;
pub use resolver::Resolver;

use std::collections::BTreeSet;
use std::sync::OnceLock;

static STANDARD: OnceLock<Resolver> = OnceLock::new();

fn standard() -> &'static Resolver {
    STANDARD.get_or_init(Resolver::standard)
}

/// The service a config package maps to under the standard topology, or
/// `None` for an unknown package.
pub fn service_for_package(package: &str) -> Option<String> {
    standard().service_for_package(package).map(|s| s.to_string())
}

/// Plan a restart order for `changed_packages` against the standard
/// topology. Embedders with a custom topology should build their own
/// [`Resolver`] instead.
pub fn plan(changed_packages: &[String]) -> Result<Vec<String>, ResolverError> {
    standard().plan(changed_packages)
}

/// Same as [`plan`] but takes services directly.
pub fn plan_services(services: &BTreeSet<&'static str>) -> Result<Vec<String>, ResolverError> {
    let owned: BTreeSet<String> = services.iter().map(|s| s.to_string()).collect();
    standard().plan_services(&owned)
}

/// A human-readable dump of the standard dependency graph, for diagnostics.
pub fn describe() -> String {
    standard().describe()
}
