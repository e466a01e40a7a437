//! Schema fragments and the root-type merge
//!
//! Applications describe what they add to the `Query` and `Mutation` roots
//! as a [SchemaFragment]: a list of named [FieldDescriptor]s. The assembler
//! merges the fragments of every application into one [RootType] per root.
//! A field name may only be contributed once per root; a second contribution
//! is rejected with [AssemblyError::DuplicateField].

use async_graphql::dynamic::{Field, FieldFuture, InputValue, Object, ResolverContext, Type, TypeRef};

use super::AssemblyError;

/// Which root type a fragment extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Query,
    Mutation,
}

impl RootKind {
    pub fn type_name(self) -> &'static str {
        match self {
            RootKind::Query => "Query",
            RootKind::Mutation => "Mutation",
        }
    }
}

/// A single root field: its name and its executable definition
pub struct FieldDescriptor {
    name: String,
    field: Field,
}

impl FieldDescriptor {
    pub fn new<F>(name: impl Into<String>, ty: impl Into<TypeRef>, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            field: Field::new(name.clone(), ty, resolver),
            name,
        }
    }

    pub fn argument(mut self, input: InputValue) -> Self {
        self.field = self.field.argument(input);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field = self.field.description(description);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_field(self) -> Field {
        self.field
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

/// An object (or other named) type that fragment fields return
pub struct NamedType {
    name: String,
    ty: Type,
}

impl NamedType {
    pub fn new(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Build an object type named `name`
    pub fn object(name: &str, build: impl FnOnce(Object) -> Object) -> Self {
        Self::new(name, build(Object::new(name)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_type(self) -> Type {
        self.ty
    }
}

/// The fields one application adds to one root type
#[derive(Debug)]
pub struct SchemaFragment {
    app: String,
    kind: RootKind,
    fields: Vec<FieldDescriptor>,
}

impl SchemaFragment {
    pub fn new(app: impl Into<String>, kind: RootKind) -> Self {
        Self {
            app: app.into(),
            kind,
            fields: Vec::new(),
        }
    }

    pub fn query(app: impl Into<String>) -> Self {
        Self::new(app, RootKind::Query)
    }

    pub fn mutation(app: impl Into<String>) -> Self {
        Self::new(app, RootKind::Mutation)
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub(crate) fn with_app(mut self, app: &str) -> Self {
        self.app = app.to_string();
        self
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn kind(&self) -> RootKind {
        self.kind
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescriptor::name)
    }
}

/// A root field together with the application that contributed it
#[derive(Debug)]
pub struct MergedField {
    pub app: String,
    pub field: FieldDescriptor,
}

/// A merged `Query` or `Mutation` root
#[derive(Debug)]
pub struct RootType {
    kind: RootKind,
    fields: Vec<MergedField>,
}

impl RootType {
    pub fn empty(kind: RootKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    pub fn kind(&self) -> RootKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.field.name().to_string()).collect()
    }

    /// Application that contributed `field`
    pub fn owner(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field.name() == field)
            .map(|f| f.app.as_str())
    }

    pub(crate) fn into_object(self) -> Object {
        self.fields
            .into_iter()
            .fold(Object::new(self.kind.type_name()), |object, merged| {
                object.field(merged.field.into_field())
            })
    }
}

/// Merge fragments into a single root of kind `kind`, keeping contribution
/// order. Fragments of the other kind are a caller bug and are rejected.
pub fn merge_fragments(
    kind: RootKind,
    fragments: impl IntoIterator<Item = SchemaFragment>,
) -> Result<RootType, AssemblyError> {
    let mut root = RootType::empty(kind);

    for fragment in fragments {
        if fragment.kind != kind {
            return Err(AssemblyError::WrongRoot {
                app: fragment.app,
                expected: kind.type_name(),
            });
        }

        for field in fragment.fields {
            if let Some(existing) = root.owner(field.name()) {
                return Err(AssemblyError::DuplicateField {
                    root: kind.type_name(),
                    field: field.name().to_string(),
                    first_app: existing.to_string(),
                    second_app: fragment.app.clone(),
                });
            }
            root.fields.push(MergedField {
                app: fragment.app.clone(),
                field,
            });
        }
    }

    Ok(root)
}
