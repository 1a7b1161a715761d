/// Errors from driving the init system.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("service '{service}' not recognized by this init system")]
    UnknownService { service: String },

    #[error("init-system invocation failed for '{service}'")]
    Invocation {
        service: String,
        #[source]
        source: confmerge_utils::UtilError,
    },

    #[error("service '{service}' did not reach state {expected} within the grace period")]
    GracePeriodExceeded { service: String, expected: String },
}
