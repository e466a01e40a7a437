//! User accounts: the current identity and superuser administration

use async_graphql::dataloader::DataLoader;
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, ResolverContext, TypeRef};
use async_graphql::{Error, Result, Value};

use crate::db::{Database, UserRecord};
use crate::graphql::{AuthExt, FieldDescriptor, GraphqlApp, NamedType, SchemaFragment, UserLoader};

const USER_TYPE: &str = "User";

pub struct AccountsApp;

fn user_field(name: &str, ty: TypeRef, get: fn(&UserRecord) -> Value) -> Field {
    Field::new(name, ty, move |ctx| {
        FieldFuture::new(async move {
            let user = ctx
                .parent_value
                .downcast_ref::<UserRecord>()
                .ok_or_else(|| Error::new("expected a User"))?;
            Ok(Some(get(user)))
        })
    })
}

/// Accept `ID` arguments given either as strings or as integers
fn id_arg(ctx: &ResolverContext<'_>, name: &str) -> Result<i64> {
    match ctx.args.try_get(name)?.as_value() {
        Value::String(s) => s
            .parse()
            .map_err(|_| Error::new(format!("Invalid user ID: {}", s))),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::new(format!("Invalid user ID: {}", n))),
        other => Err(Error::new(format!("Invalid user ID: {}", other))),
    }
}

async fn load_user(ctx: &ResolverContext<'_>, id: i64) -> Result<Option<UserRecord>> {
    Ok(ctx.data::<DataLoader<UserLoader>>()?.load_one(id).await?)
}

impl GraphqlApp for AccountsApp {
    fn label(&self) -> &str {
        "accounts"
    }

    fn types(&self) -> Vec<NamedType> {
        vec![NamedType::object(USER_TYPE, |obj| {
            obj.field(user_field("id", TypeRef::named_nn(TypeRef::ID), |u| {
                Value::from(u.id.to_string())
            }))
            .field(user_field("username", TypeRef::named_nn(TypeRef::STRING), |u| {
                Value::from(u.username.clone())
            }))
            .field(user_field("email", TypeRef::named(TypeRef::STRING), |u| {
                u.email.clone().map(Value::from).unwrap_or(Value::Null)
            }))
            .field(user_field("isSuperuser", TypeRef::named_nn(TypeRef::BOOLEAN), |u| {
                Value::from(u.is_superuser)
            }))
        })]
    }

    fn queries(&self) -> Option<SchemaFragment> {
        let me = FieldDescriptor::new("me", TypeRef::named(USER_TYPE), |ctx| {
            FieldFuture::new(async move {
                let Some(user_id) = ctx.try_auth_user().map(|u| u.user_id) else {
                    return Ok(None);
                };
                Ok(load_user(&ctx, user_id).await?.map(FieldValue::owned_any))
            })
        })
        .description("The user this request acts as, or null when anonymous");

        let user = FieldDescriptor::new("user", TypeRef::named(USER_TYPE), |ctx| {
            FieldFuture::new(async move {
                ctx.auth_user()?;
                let id = id_arg(&ctx, "id")?;
                Ok(load_user(&ctx, id).await?.map(FieldValue::owned_any))
            })
        })
        .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)))
        .description("Look up a user by ID");

        let users = FieldDescriptor::new("users", TypeRef::named_nn_list_nn(USER_TYPE), |ctx| {
            FieldFuture::new(async move {
                ctx.superuser()?;
                let records = ctx.data::<Database>()?.users().list_all().await?;
                Ok(Some(FieldValue::list(
                    records.into_iter().map(FieldValue::owned_any),
                )))
            })
        })
        .description("All users (superuser only)");

        Some(
            SchemaFragment::query(self.label())
                .field(me)
                .field(user)
                .field(users),
        )
    }

    fn mutations(&self) -> Option<SchemaFragment> {
        let set_superuser = FieldDescriptor::new("setSuperuser", TypeRef::named(USER_TYPE), |ctx| {
            FieldFuture::new(async move {
                let actor = ctx.superuser()?.user_id;
                let id = id_arg(&ctx, "id")?;
                let value = ctx.args.try_get("value")?.boolean()?;

                let updated = ctx.data::<Database>()?.users().set_superuser(id, value).await?;
                if updated.is_some() {
                    tracing::info!(actor, user_id = id, value, "Changed superuser status");
                }
                Ok(updated.map(FieldValue::owned_any))
            })
        })
        .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)))
        .argument(InputValue::new("value", TypeRef::named_nn(TypeRef::BOOLEAN)))
        .description("Grant or revoke superuser status (superuser only)");

        Some(SchemaFragment::mutation(self.label()).field(set_superuser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::apps::default_registry;
    use crate::db::{CreateUser, QueryLog, schema_sync};
    use crate::graphql::{AssemblyOptions, AuthMethod, AuthUser, CombinedSchema, CurrentUser, assemble};

    async fn setup() -> (CombinedSchema, Database) {
        let db = Database::connect_in_memory().await.unwrap();
        schema_sync::sync_schema(db.pool()).await.unwrap();
        let schema = assemble(
            &default_registry().unwrap(),
            db.clone(),
            AssemblyOptions {
                query_log: false,
                ..Default::default()
            },
        )
        .unwrap();
        (schema, db)
    }

    async fn create(db: &Database, username: &str, is_superuser: bool) -> UserRecord {
        db.users()
            .create(CreateUser {
                username: username.to_string(),
                email: None,
                is_superuser,
            })
            .await
            .unwrap()
    }

    fn acting_as(record: &UserRecord) -> CurrentUser {
        CurrentUser(Some(AuthUser::from_record(record, AuthMethod::ApiKey)))
    }

    #[tokio::test]
    async fn test_sibling_lookups_share_one_query() {
        let (schema, db) = setup().await;
        let root = create(&db, "root", true).await;
        let alice = create(&db, "alice", false).await;

        let log = QueryLog::new();
        let query = format!(
            r#"{{ a: user(id: "{}") {{ username }} b: user(id: "{}") {{ username }} }}"#,
            root.id, alice.id
        );
        let response = schema.execute_logged(query, acting_as(&root), log.clone()).await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "a": { "username": "root" }, "b": { "username": "alice" } })
        );
        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].sql.contains("WHERE id IN"));
    }

    #[tokio::test]
    async fn test_operation_queries_recorded_in_order() {
        let (schema, db) = setup().await;
        let root = create(&db, "root", true).await;
        let alice = create(&db, "alice", false).await;

        let log = QueryLog::new();
        let query = format!(
            r#"mutation {{ setSuperuser(id: "{}", value: true) {{ isSuperuser }} }}"#,
            alice.id
        );
        let response = schema.execute_logged(query, acting_as(&root), log.clone()).await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let statements: Vec<String> = log.entries().into_iter().map(|q| q.sql).collect();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("UPDATE users"));
        assert!(statements[1].starts_with("SELECT"));
    }

    #[tokio::test]
    async fn test_log_printed_once_after_each_operation() {
        let db = Database::connect_in_memory().await.unwrap();
        schema_sync::sync_schema(db.pool()).await.unwrap();
        let output = Arc::new(Mutex::new(Vec::<u8>::new()));
        let schema = assemble(
            &default_registry().unwrap(),
            db.clone(),
            AssemblyOptions {
                query_log: true,
                log_writer: Some(output.clone()),
            },
        )
        .unwrap();
        let root = create(&db, "root", true).await;
        let alice = create(&db, "alice", false).await;
        let printed = || String::from_utf8(output.lock().clone()).unwrap();

        let query = format!(
            r#"mutation {{ setSuperuser(id: "{}", value: true) {{ isSuperuser }} }}"#,
            alice.id
        );
        let response = schema.execute(query, acting_as(&root)).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let first = printed();
        let blocks: Vec<&str> = first.split_terminator("---\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Query: UPDATE users SET is_superuser"));
        assert!(blocks[1].starts_with("Query: SELECT"));
        assert!(blocks.iter().all(|b| b.contains("\nTime: ")));
        assert!(first.ends_with("---\n"));

        // Nothing executed, nothing printed
        schema.execute("{ health }", CurrentUser::anonymous()).await;
        assert_eq!(printed(), first);

        schema.execute("{ users { id } }", acting_as(&root)).await;
        let second = printed();
        let added = &second[first.len()..];
        assert_eq!(added.matches("Query: ").count(), 1);
        assert!(added.starts_with("Query: SELECT id, username"));
        assert!(added.ends_with("---\n"));
    }

    #[tokio::test]
    async fn test_superuser_only_fields() {
        let (schema, db) = setup().await;
        let alice = create(&db, "alice", false).await;

        let response = schema.execute("{ users { id } }", acting_as(&alice)).await;
        assert_eq!(
            response.errors[0].extensions.as_ref().and_then(|e| e.get("code")),
            Some(&Value::from("FORBIDDEN"))
        );

        let response = schema.execute("{ users { id } }", CurrentUser::anonymous()).await;
        assert_eq!(
            response.errors[0].extensions.as_ref().and_then(|e| e.get("code")),
            Some(&Value::from("UNAUTHORIZED"))
        );
    }

    #[tokio::test]
    async fn test_me_is_null_when_anonymous() {
        let (schema, _db) = setup().await;

        let response = schema.execute("{ me { username } }", CurrentUser::anonymous()).await;
        assert!(response.errors.is_empty());
        assert_eq!(response.data.into_json().unwrap(), json!({ "me": null }));
    }
}
