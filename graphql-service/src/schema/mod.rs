//! GraphQL schema.
//!
//! Resolvers read the catalog from the schema data and report failures as
//! GraphQL errors carrying an `extensions.code`.

mod mutation;
mod query;

use std::sync::Arc;

use async_graphql::extensions::Tracing;
use async_graphql::{Context, EmptySubscription, Error, ErrorExtensions, Schema};

use common::errors::AppError;
use common::middleware::RequestId;

use crate::store::CatalogStore;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the schema over the given catalog.
pub fn build_schema(catalog: Arc<dyn CatalogStore>) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(catalog)
        .extension(Tracing)
        .finish()
}

fn catalog<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<dyn CatalogStore>> {
    ctx.data::<Arc<dyn CatalogStore>>()
}

/// Converts an application error into a GraphQL error with its code.
pub fn into_graphql_error(err: AppError) -> Error {
    let code = err.code();
    Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}

/// Like [`into_graphql_error`], also tagging the error with the id of the
/// HTTP request that triggered it.
pub(crate) fn graphql_error(ctx: &Context<'_>, err: AppError) -> Error {
    let request_id = ctx.data_opt::<RequestId>();
    tracing::warn!(
        request_id = request_id.map(RequestId::as_str).unwrap_or("-"),
        code = err.code(),
        error = %err,
        "Resolver failed"
    );
    let error = into_graphql_error(err);
    match request_id {
        Some(id) => {
            let id = id.to_string();
            error.extend_with(|_, ext| ext.set("requestId", id))
        }
        None => error,
    }
}
