//! Combined schema assembly
//!
//! [assemble] runs once at startup: it collects the fragments of every
//! registered application, merges them into the `Query` and `Mutation`
//! roots and builds an executable dynamic schema. The resulting
//! [CombinedSchema] is immutable and cheap to clone; the HTTP layer holds one
//! in its state and runs every request through [CombinedSchema::execute].

use async_graphql::dynamic::{Field, FieldFuture, Object, Schema, TypeRef};
use async_graphql::extensions::Tracing;
use async_graphql::{Request, Response, Value};

use crate::db::{Database, QueryLog};

use super::auth::CurrentUser;
use super::extensions::{LogWriter, QueryLogger};
use super::fragment::{RootKind, merge_fragments};
use super::loaders::user_loader;
use super::registry::AppRegistry;
use super::AssemblyError;

/// Placeholder field for a `Query` root nobody contributed to; GraphQL
/// requires object types to define at least one field.
pub const EMPTY_QUERY_FIELD: &str = "_empty";

#[derive(Clone)]
pub struct AssemblyOptions {
    /// Attach the [QueryLogger] extension
    pub query_log: bool,
    /// Where the query log is written; stdout when `None`
    pub log_writer: Option<LogWriter>,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            query_log: true,
            log_writer: None,
        }
    }
}

/// The single schema served at `/graphql`
#[derive(Clone)]
pub struct CombinedSchema {
    schema: Schema,
    db: Database,
    query_fields: Vec<String>,
    mutation_fields: Vec<String>,
}

impl CombinedSchema {
    /// Root fields contributed to `Query`, in contribution order
    pub fn query_fields(&self) -> &[String] {
        &self.query_fields
    }

    /// Root fields contributed to `Mutation`, in contribution order
    pub fn mutation_fields(&self) -> &[String] {
        &self.mutation_fields
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// Execute one request as `user`.
    ///
    /// Every request gets its own [QueryLog], a database handle recording
    /// into it and a fresh set of DataLoaders.
    pub async fn execute(&self, request: impl Into<Request>, user: CurrentUser) -> Response {
        self.execute_logged(request, user, QueryLog::new()).await
    }

    /// Like [CombinedSchema::execute], recording into a caller-supplied log.
    pub async fn execute_logged(
        &self,
        request: impl Into<Request>,
        user: CurrentUser,
        log: QueryLog,
    ) -> Response {
        let db = self.db.scoped(log.clone());

        let request = request
            .into()
            .data(user)
            .data(log)
            .data(user_loader(db.clone()))
            .data(db);

        self.schema.execute(request).await
    }
}

impl std::fmt::Debug for CombinedSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedSchema")
            .field("query_fields", &self.query_fields)
            .field("mutation_fields", &self.mutation_fields)
            .finish_non_exhaustive()
    }
}

fn empty_query_root() -> Object {
    Object::new(RootKind::Query.type_name()).field(
        Field::new(EMPTY_QUERY_FIELD, TypeRef::named(TypeRef::BOOLEAN), |_| {
            FieldFuture::new(async move { Ok(None::<Value>) })
        })
        .description("Placeholder; no application contributes queries"),
    )
}

/// Build the combined schema from every application in `registry`.
///
/// Fails if two applications contribute the same root field or type name.
pub fn assemble(
    registry: &AppRegistry,
    db: Database,
    options: AssemblyOptions,
) -> Result<CombinedSchema, AssemblyError> {
    let contributions = registry.contributions();

    let query = merge_fragments(RootKind::Query, contributions.queries)?;
    let mutation = merge_fragments(RootKind::Mutation, contributions.mutations)?;

    let query_fields = query.field_names();
    let mutation_fields = mutation.field_names();

    let mut seen_types: Vec<(String, String)> = Vec::new();
    for (app, ty) in &contributions.types {
        if let Some((_, first_app)) = seen_types.iter().find(|(name, _)| name == ty.name()) {
            return Err(AssemblyError::DuplicateType {
                name: ty.name().to_string(),
                first_app: first_app.clone(),
                second_app: app.clone(),
            });
        }
        seen_types.push((ty.name().to_string(), app.clone()));
    }

    let mutation_name = (!mutation.is_empty()).then(|| RootKind::Mutation.type_name());
    let query_object = if query.is_empty() {
        empty_query_root()
    } else {
        query.into_object()
    };

    let mut builder = Schema::build(RootKind::Query.type_name(), mutation_name, None)
        .register(query_object)
        .extension(Tracing);

    if mutation_name.is_some() {
        builder = builder.register(mutation.into_object());
    }
    if options.query_log {
        builder = builder.extension(match options.log_writer {
            Some(writer) => QueryLogger::with_writer(writer),
            None => QueryLogger::new(),
        });
    }
    for (_, ty) in contributions.types {
        builder = builder.register(ty.into_type());
    }

    let schema = builder
        .finish()
        .map_err(|e| AssemblyError::Schema(e.to_string()))?;

    tracing::info!(
        apps = registry.len(),
        query_fields = query_fields.len(),
        mutation_fields = mutation_fields.len(),
        "GraphQL schema assembled"
    );

    Ok(CombinedSchema {
        schema,
        db,
        query_fields,
        mutation_fields,
    })
}
