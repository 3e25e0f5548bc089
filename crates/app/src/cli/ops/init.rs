use std::path::PathBuf;

use clap::Args;
use object_store::{ObjectStoreConfig, RetryConfig};

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Directory for the local replica store (default: <state dir>/store)
    #[arg(long)]
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = self.store_path.clone().map(|path| AppConfig {
            store: ObjectStoreConfig::Local { path },
            retry: RetryConfig::default(),
        });

        let state = AppState::init(ctx.config_path.clone(), config)?;

        let store = match &state.config.store {
            ObjectStoreConfig::Local { path } => format!("local ({})", path.display()),
            other => format!("{:?}", other),
        };

        Ok(format!(
            "Initialized replica directory at: {}\n\
             - Config: {}\n\
             - Store: {}\n\
             - Max retries: {}",
            state.replica_dir.display(),
            state.config_path.display(),
            store,
            state.config.retry.max_retries,
        ))
    }
}
