//! Superapp GraphQL server
//!
//! All operations are exposed via GraphQL at /graphql.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use superapp_graphql::app::{AppState, build_app};
use superapp_graphql::apps::default_registry;
use superapp_graphql::cli::{CliOptions, Command, USAGE};
use superapp_graphql::config::Config;
use superapp_graphql::db::{CreateUser, Database, schema_sync};
use superapp_graphql::graphql::{AssemblyOptions, assemble, issue_token};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = match CliOptions::from_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if options.command == Command::Help {
        print!("{}", USAGE);
        return Ok(());
    }

    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "superapp_graphql=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let db = Database::connect(&config.database_url).await?;
    let sync = schema_sync::sync_schema(db.pool()).await?;
    tracing::info!(tables_created = ?sync.tables_created, "Database ready");

    let registry = default_registry()?;
    let schema = assemble(
        &registry,
        db.clone(),
        AssemblyOptions {
            query_log: config.query_log,
            ..Default::default()
        },
    )?;
    tracing::info!(apps = ?registry.labels(), "Applications registered");

    match options.command {
        Command::PrintSchema => {
            println!("{}", schema.sdl());
            return Ok(());
        }
        Command::CreateSuperuser { username, email } => {
            let record = db
                .users()
                .create(CreateUser {
                    username,
                    email,
                    is_superuser: true,
                })
                .await?;
            tracing::info!(user_id = record.id, "Superuser created");
            println!(
                "{}",
                issue_token(&record, &config.jwt_secret, config.session_ttl_seconds)?
            );
            return Ok(());
        }
        Command::Serve | Command::Help => {}
    }

    if config.graphql_api_key.is_none() {
        tracing::warn!("GRAPHQL_API_KEY is not set; requests without a session will be rejected");
    }

    let state = AppState {
        config: config.clone(),
        db,
        schema,
    };
    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let host = config.host.as_deref().unwrap_or("localhost");
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphiQL: http://{}:{}/graphql", host, config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
