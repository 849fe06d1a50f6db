#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation Error: {0} should be {1}")]
    Validation(String, String),

    #[error("Mismatched Shape: {0} should be {1}")]
    MismatchedShape(String, String),

    #[error("Missing Dependency: {0} is required")]
    MissingDependency(String),
}
