use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use object_store::{ObjectStoreReplica, StoreError, TransferEngine};
use tokio::sync::watch;

use crate::state::{AppState, StateError};

#[derive(Clone)]
pub struct OpContext {
    /// Optional custom state directory (defaults to ~/.replica)
    pub config_path: Option<PathBuf>,
    /// Flips to true on SIGINT/SIGTERM
    pub shutdown: watch::Receiver<bool>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            config_path,
            shutdown,
        }
    }

    /// Build a transfer engine from the configured store and retry policy.
    pub async fn engine(&self) -> Result<TransferEngine, EngineError> {
        let state = AppState::load(self.config_path.clone())?;
        let store = ObjectStoreReplica::new(state.config.store).await?;
        Ok(TransferEngine::new(Arc::new(store), state.config.retry)
            .with_shutdown(self.shutdown.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to open replica store: {0}")]
    Store(#[from] StoreError),
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
