use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};

use crate::error::ResolverError;
use crate::graph;

/// A service dependency graph plus the package->service map that drives
/// restart planning. Built from the standard router topology by default,
/// but callers that embed this engine in a different topology can supply
/// their own tables via [`Resolver::new`] instead of being stuck with the
/// hard-coded one (spec §9 open question: the dedup-tag/service-map
/// relationship is meant to be wired by the embedder, not guessed at here).
#[derive(Debug, Clone)]
pub struct Resolver {
    edges: BTreeMap<String, Vec<String>>,
    package_map: BTreeMap<String, String>,
    declared_order: Vec<String>,
}

impl Resolver {
    /// Build a resolver from explicit tables.
    ///
    /// `edges` is `(dependency, dependent)` pairs; `package_map` is
    /// `(package, service)` pairs; `declared_order` breaks ties among
    /// services that become ready simultaneously during the topological
    /// sort (services absent from it sort last, deterministically by name).
    pub fn new(edges: Vec<(String, String)>, package_map: Vec<(String, String)>, declared_order: Vec<String>) -> Self {
        let mut edge_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (dep, dependent) in edges {
            edge_map.entry(dep).or_default().push(dependent);
        }
        Self {
            edges: edge_map,
            package_map: package_map.into_iter().collect(),
            declared_order,
        }
    }

    /// The standard router topology this engine was distilled from.
    pub fn standard() -> Self {
        Self::new(
            graph::standard_edges(),
            graph::standard_package_map(),
            graph::standard_declared_order(),
        )
    }

    pub fn service_for_package(&self, package: &str) -> Option<&str> {
        self.package_map.get(package).map(|s| s.as_str())
    }

    fn declared_rank(&self, service: &str) -> usize {
        self.declared_order.iter().position(|s| s == service).unwrap_or(usize::MAX)
    }

    /// Map `changed_packages` to services and return them in an order that
    /// respects the dependency graph.
    pub fn plan(&self, changed_packages: &[String]) -> Result<Vec<String>, ResolverError> {
        let mut services: BTreeSet<String> = BTreeSet::new();
        for package in changed_packages {
            match self.service_for_package(package) {
                Some(service) => {
                    services.insert(service.to_string());
                }
                None => warn!("package '{package}' has no known service mapping, skipping"),
            }
        }

        debug!("restart plan requested for packages {changed_packages:?} -> services {services:?}");
        self.topo_sort(&services)
    }

    /// Same as [`Self::plan`] but takes services directly.
    pub fn plan_services(&self, services: &BTreeSet<String>) -> Result<Vec<String>, ResolverError> {
        self.topo_sort(services)
    }

    fn topo_sort(&self, services: &BTreeSet<String>) -> Result<Vec<String>, ResolverError> {
        let mut indegree: HashMap<&str, usize> = services.iter().map(|s| (s.as_str(), 0)).collect();
        for (dep, dependents) in &self.edges {
            if !services.contains(dep.as_str()) {
                continue;
            }
            for dependent in dependents {
                if let Some(count) = indegree.get_mut(dependent.as_str()) {
                    *count += 1;
                }
            }
        }

        let mut ready: Vec<&str> = indegree.iter().filter(|(_, &c)| c == 0).map(|(s, _)| *s).collect();
        ready.sort_by_key(|s| self.declared_rank(s));

        let mut order = Vec::with_capacity(services.len());
        let mut remaining = indegree;

        while let Some(next) = ready.first().copied() {
            ready.remove(0);
            remaining.remove(next);
            order.push(next.to_string());

            if let Some(dependents) = self.edges.get(next) {
                for dependent in dependents {
                    if let Some(count) = remaining.get_mut(dependent.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            ready.push(dependent.as_str());
                        }
                    }
                }
            }
            ready.sort_by_key(|s| self.declared_rank(s));
        }

        if order.len() < services.len() {
            let leftover: Vec<String> = remaining.keys().map(|s| s.to_string()).collect();
            return Err(ResolverError::Cycle { remaining: leftover });
        }

        Ok(order)
    }

    /// A human-readable dump of the dependency graph, for diagnostics.
    pub fn describe(&self) -> String {
        let mut services: Vec<&str> = self.declared_order.iter().map(|s| s.as_str()).collect();
        for known in self.edges.keys().chain(self.edges.values().flatten()) {
            if !services.contains(&known.as_str()) {
                services.push(known.as_str());
            }
        }
        services
            .iter()
            .map(|service| match self.edges.get(*service) {
                Some(dependents) => format!("{service} -> {}", dependents.join(", ")),
                None => format!("{service} -> (none)"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
