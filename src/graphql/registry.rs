//! Application registry
//!
//! Applications contribute GraphQL capabilities by implementing [GraphqlApp]
//! and registering with an [AppRegistry] at startup. The registry is keyed by
//! the application label and preserves registration order, which is also the
//! order in which root fields appear in the combined schema.

use super::fragment::{NamedType, SchemaFragment};
use super::RegistryError;

/// Something that contributes fields to the combined schema.
///
/// Every method except [label](GraphqlApp::label) is optional; an
/// application may contribute only queries, only mutations, or nothing.
pub trait GraphqlApp: Send + Sync + 'static {
    /// Unique application identifier
    fn label(&self) -> &str;

    /// Fields added to the `Query` root
    fn queries(&self) -> Option<SchemaFragment> {
        None
    }

    /// Fields added to the `Mutation` root
    fn mutations(&self) -> Option<SchemaFragment> {
        None
    }

    /// Types returned by this application's fields
    fn types(&self) -> Vec<NamedType> {
        Vec::new()
    }
}

/// Everything the registered applications contribute, in registration order
#[derive(Default)]
pub struct Contributions {
    pub queries: Vec<SchemaFragment>,
    pub mutations: Vec<SchemaFragment>,
    /// `(application label, type)`
    pub types: Vec<(String, NamedType)>,
}

#[derive(Default)]
pub struct AppRegistry {
    apps: Vec<Box<dyn GraphqlApp>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an application. Labels must be unique.
    pub fn register(&mut self, app: impl GraphqlApp) -> Result<&mut Self, RegistryError> {
        if self.apps.iter().any(|a| a.label() == app.label()) {
            return Err(RegistryError::DuplicateApp(app.label().to_string()));
        }
        tracing::debug!(app = app.label(), "Registered GraphQL application");
        self.apps.push(Box::new(app));
        Ok(self)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.apps.iter().map(|a| a.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Ask every application for its fragments and types
    pub fn contributions(&self) -> Contributions {
        let mut out = Contributions::default();

        for app in &self.apps {
            let label = app.label();

            if let Some(fragment) = app.queries() {
                tracing::debug!(app = label, fields = ?fragment.field_names().collect::<Vec<_>>(), "Found queries");
                out.queries.push(fragment.with_app(label));
            }
            if let Some(fragment) = app.mutations() {
                tracing::debug!(app = label, fields = ?fragment.field_names().collect::<Vec<_>>(), "Found mutations");
                out.mutations.push(fragment.with_app(label));
            }
            out.types
                .extend(app.types().into_iter().map(|ty| (label.to_string(), ty)));
        }

        out
    }
}

impl std::fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRegistry")
            .field("apps", &self.labels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    struct Empty(&'static str);

    impl GraphqlApp for Empty {
        fn label(&self) -> &str {
            self.0
        }
    }

    struct OnlyMutations;

    impl GraphqlApp for OnlyMutations {
        fn label(&self) -> &str {
            "writer"
        }

        fn mutations(&self) -> Option<SchemaFragment> {
            // Deliberately labelled differently; the registry label wins
            Some(SchemaFragment::mutation("something-else"))
        }
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut registry = AppRegistry::new();
        registry.register(Empty("blog")).unwrap();

        assert_matches!(
            registry.register(Empty("blog")),
            Err(RegistryError::DuplicateApp(label)) if label == "blog"
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(format!("{:?}", registry), r#"AppRegistry { apps: ["blog"] }"#);
    }

    #[test]
    fn test_apps_without_fragments_are_fine() {
        let mut registry = AppRegistry::new();
        registry.register(Empty("a")).unwrap().register(Empty("b")).unwrap();

        let contributions = registry.contributions();
        assert!(contributions.queries.is_empty());
        assert!(contributions.mutations.is_empty());
        assert!(contributions.types.is_empty());
        assert_eq!(registry.labels(), vec!["a", "b"]);
    }

    #[test]
    fn test_fragments_carry_registry_label() {
        let mut registry = AppRegistry::new();
        registry.register(OnlyMutations).unwrap();

        let contributions = registry.contributions();
        assert!(contributions.queries.is_empty());
        assert_eq!(contributions.mutations.len(), 1);
        assert_eq!(contributions.mutations[0].app(), "writer");
    }
}
