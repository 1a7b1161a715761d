/// Errors from planning a restart order.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The dependency graph restricted to the requested services contains a
    /// cycle; `remaining` lists the services that could not be ordered.
    #[error("cannot resolve restart order, cycle among: {remaining:?}")]
    Cycle { remaining: Vec<String> },
}
