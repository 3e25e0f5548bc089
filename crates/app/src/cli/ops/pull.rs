use std::path::PathBuf;

use clap::Args;
use object_store::TransferError;

use crate::cli::op::EngineError;

#[derive(Args, Debug, Clone)]
pub struct Pull {
    /// Logical container (e.g. the owning group)
    #[arg(long)]
    pub container: String,

    /// Content key (e.g. the item id)
    #[arg(long)]
    pub key: String,

    /// Where to write the bag
    pub dest: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum PullError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Pull {
    type Error = PullError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let engine = ctx.engine().await?;
        let content = engine.download(&self.container, &self.key).await?;

        tokio::fs::write(&self.dest, &content.data)
            .await
            .map_err(|source| PullError::Write {
                path: self.dest.clone(),
                source,
            })?;

        let verified = if content.properties.checksum.is_some() {
            "verified"
        } else {
            "no stored checksum"
        };

        Ok(format!(
            "Pulled {}/{} to {} ({} bytes, {})",
            self.container,
            self.key,
            self.dest.display(),
            content.data.len(),
            verified,
        ))
    }
}
