use async_graphql::Value;
use async_graphql::dynamic::{FieldFuture, TypeRef};

use crate::graphql::{FieldDescriptor, GraphqlApp, SchemaFragment};

/// Liveness and build information
pub struct SystemApp;

impl GraphqlApp for SystemApp {
    fn label(&self) -> &str {
        "system"
    }

    fn queries(&self) -> Option<SchemaFragment> {
        Some(
            SchemaFragment::query(self.label())
                .field(
                    FieldDescriptor::new("health", TypeRef::named_nn(TypeRef::BOOLEAN), |_| {
                        FieldFuture::new(async { Ok(Some(Value::from(true))) })
                    })
                    .description("Health check (no auth required)"),
                )
                .field(
                    FieldDescriptor::new("version", TypeRef::named_nn(TypeRef::STRING), |_| {
                        FieldFuture::new(async { Ok(Some(Value::from(env!("CARGO_PKG_VERSION")))) })
                    })
                    .description("Server version"),
                ),
        )
    }
}
