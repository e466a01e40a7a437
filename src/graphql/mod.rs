//! GraphQL API
//!
//! The schema served at `/graphql` is not a fixed set of resolvers: it is
//! assembled at startup from the fragments every registered application
//! contributes (see [registry] and [fragment]), then served by [service].

pub mod auth;
mod error;
pub mod extensions;
pub mod fragment;
pub mod loaders;
pub mod registry;
mod schema;
pub mod service;

pub use auth::{AuthExt, AuthMethod, AuthUser, CurrentUser, issue_token, verify_token};
pub use error::{AssemblyError, RegistryError};
pub use extensions::{LogWriter, QueryLogger};
pub use fragment::{FieldDescriptor, NamedType, RootKind, RootType, SchemaFragment, merge_fragments};
pub use loaders::{UserLoader, user_loader};
pub use registry::{AppRegistry, GraphqlApp};
pub use schema::{AssemblyOptions, CombinedSchema, EMPTY_QUERY_FIELD, assemble};
