use confmerge_resolver::ResolverError;

/// Seam over [`confmerge_resolver::plan`] so the orchestrator can be driven
/// by a test double that returns a fixed or faulty plan.
pub trait ServiceResolver {
    fn plan(&self, changed_packages: &[String]) -> Result<Vec<String>, ResolverError>;

    /// The service a config package maps to under this resolver's topology,
    /// or `None` for a package the topology doesn't know about. Used to
    /// expand a restart plan's service order back into a package commit
    /// order (spec §5 "Ordering guarantees").
    fn service_for_package(&self, package: &str) -> Option<String>;
}

/// The real dependency-graph-backed resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticResolver;

impl ServiceResolver for StaticResolver {
    fn plan(&self, changed_packages: &[String]) -> Result<Vec<String>, ResolverError> {
        confmerge_resolver::plan(changed_packages)
    }

    fn service_for_package(&self, package: &str) -> Option<String> {
        confmerge_resolver::service_for_package(package)
    }
}
