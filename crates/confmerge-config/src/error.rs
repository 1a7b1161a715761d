#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("failed to parse package '{package}': {detail}")]
    Parse { package: String, detail: String },

    #[error("commit failed for package '{0}': {1}")]
    CommitFailed(String, #[source] confmerge_utils::UtilError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
