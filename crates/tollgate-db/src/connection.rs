//! Connection to a remote SurrealDB instance.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

/// Where Tollgate keeps its data. Every field has a local-development
/// default, so a config file only needs to name what differs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Host and port of the WebSocket endpoint (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace holding Tollgate's database.
    pub namespace: String,
    /// Database selected within the namespace.
    pub database: String,
    /// Root username used to sign in.
    pub username: String,
    /// Root password used to sign in.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "tollgate".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Authenticated handle scoped to the configured namespace and database.
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );
        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;
        info!(url = %config.url, "SurrealDB session ready");
        Ok(Self { db })
    }

    /// Apply pending schema migrations on this connection.
    pub async fn migrate(&self) -> Result<(), DbError> {
        run_migrations(&self.db).await
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
