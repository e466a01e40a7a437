use thiserror::Error;

/// Errors raised while assembling the combined schema at startup
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("field `{root}.{field}` is contributed by both `{first_app}` and `{second_app}`")]
    DuplicateField {
        root: &'static str,
        field: String,
        first_app: String,
        second_app: String,
    },

    #[error("type `{name}` is contributed by both `{first_app}` and `{second_app}`")]
    DuplicateType {
        name: String,
        first_app: String,
        second_app: String,
    },

    #[error("application `{app}` returned a fragment for the wrong root (expected {expected})")]
    WrongRoot { app: String, expected: &'static str },

    #[error("schema rejected: {0}")]
    Schema(String),
}

/// Errors raised while registering applications
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("application `{0}` is already registered")]
    DuplicateApp(String),
}
