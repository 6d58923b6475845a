//! Schema bootstrap.
//!
//! Creates the tables the entities map onto when `auto_migrate` is enabled.
//! Statements are idempotent (`CREATE TABLE IF NOT EXISTS`) and restricted
//! to type names sqlite and postgres both accept; production schema is
//! otherwise managed out of band.

use sea_orm::{ConnectionTrait, Statement};
use tracing::info;

use crate::db::DbPool;
use crate::errors::ServiceError;

const TABLES: [&str; 6] = [
    r#"CREATE TABLE IF NOT EXISTS clients (
        id UUID PRIMARY KEY NOT NULL,
        identity_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS properties (
        id UUID PRIMARY KEY NOT NULL,
        owner_id UUID,
        title TEXT NOT NULL,
        description TEXT,
        price NUMERIC NOT NULL,
        bedrooms INTEGER NOT NULL,
        bathrooms INTEGER NOT NULL,
        square_meters INTEGER NOT NULL,
        year_built INTEGER,
        floor INTEGER,
        property_type TEXT NOT NULL,
        status TEXT NOT NULL,
        address TEXT NOT NULL,
        city TEXT NOT NULL,
        published BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS property_images (
        id UUID PRIMARY KEY NOT NULL,
        property_id UUID NOT NULL,
        file_name TEXT NOT NULL,
        content_type TEXT NOT NULL,
        size_bytes BIGINT NOT NULL,
        url TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS leads (
        id UUID PRIMARY KEY NOT NULL,
        kind TEXT NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        address TEXT,
        property_id UUID,
        message TEXT,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS invoice_requests (
        id UUID PRIMARY KEY NOT NULL,
        client_id UUID NOT NULL,
        invoice_type TEXT NOT NULL,
        amount NUMERIC,
        notes TEXT,
        status TEXT NOT NULL,
        processed_at TIMESTAMPTZ,
        processed_by UUID,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS activity_log (
        id UUID PRIMARY KEY NOT NULL,
        actor TEXT NOT NULL,
        action TEXT NOT NULL,
        entity_type TEXT NOT NULL,
        entity_id UUID NOT NULL,
        detail TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
];

/// Create any missing tables.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), ServiceError> {
    let backend = pool.get_database_backend();
    for sql in TABLES {
        pool.execute(Statement::from_string(backend, sql.to_string()))
            .await?;
    }
    info!("schema bootstrap complete");
    Ok(())
}
