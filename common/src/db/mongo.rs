//! MongoDB connector.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Database};

use crate::config::DatabaseConfig;
use crate::errors::ConnectionError;

use super::cache::Connector;

/// Opens a MongoDB client and selects the configured database.
///
/// A `ping` is issued before the handle is returned so that unreachable
/// servers and rejected credentials surface during establishment rather
/// than on the first query.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    app_name: String,
}

impl MongoConnector {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = Database;

    async fn connect(&self, config: &DatabaseConfig) -> Result<Database, ConnectionError> {
        let uri = config.connection_uri();
        let mut options = ClientOptions::parse(uri.as_str()).await?;

        if let Some(user) = &config.user {
            options.credential = Some(
                Credential::builder()
                    .username(user.clone())
                    .password(config.password.clone())
                    .build(),
            );
        }
        options.app_name = Some(self.app_name.clone());
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.database_name);
        database.run_command(doc! { "ping": 1 }).await?;

        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_malformed_target_is_rejected_before_io() {
        let config = DatabaseConfig {
            user: None,
            password: String::new(),
            host: String::new(),
            database_name: "courses".into(),
            use_srv: false,
            uri: Some("not-a-connection-string".into()),
            connect_timeout: Duration::from_secs(1),
        };

        let err = MongoConnector::new("test").connect(&config).await.unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidTarget(_)), "got {err:?}");
    }
}
