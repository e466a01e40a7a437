//! Schema extensions

use std::io::Write;
use std::sync::Arc;

use async_graphql::Response;
use async_graphql::extensions::{Extension, ExtensionContext, ExtensionFactory, NextExecute};
use parking_lot::Mutex;

use crate::db::QueryLog;

/// Destination for query log blocks other than stdout
pub type LogWriter = Arc<Mutex<dyn Write + Send>>;

/// Prints the SQL a request executed once its operation has completed.
///
/// Reads the request's [QueryLog] from the request data; requests without
/// one are left alone. Output goes to stdout unless built with
/// [QueryLogger::with_writer].
#[derive(Clone, Default)]
pub struct QueryLogger {
    writer: Option<LogWriter>,
}

impl QueryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_writer(writer: LogWriter) -> Self {
        Self {
            writer: Some(writer),
        }
    }
}

impl ExtensionFactory for QueryLogger {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(QueryLoggerExtension {
            writer: self.writer.clone(),
        })
    }
}

struct QueryLoggerExtension {
    writer: Option<LogWriter>,
}

impl QueryLoggerExtension {
    fn emit(&self, log: &QueryLog) -> std::io::Result<()> {
        match &self.writer {
            Some(writer) => {
                let mut out = writer.lock();
                log.write_to(&mut *out)?;
                out.flush()
            }
            None => log.print(),
        }
    }
}

#[async_trait::async_trait]
impl Extension for QueryLoggerExtension {
    async fn execute(
        &self,
        ctx: &ExtensionContext<'_>,
        operation_name: Option<&str>,
        next: NextExecute<'_>,
    ) -> Response {
        let response = next.run(ctx, operation_name).await;

        if let Some(log) = ctx.data_opt::<QueryLog>() {
            tracing::debug!(
                operation = operation_name.unwrap_or("<anonymous>"),
                queries = log.len(),
                "GraphQL request finished"
            );
            if let Err(e) = self.emit(log) {
                tracing::warn!(error = %e, "Failed to print query log");
            }
        }

        response
    }
}
