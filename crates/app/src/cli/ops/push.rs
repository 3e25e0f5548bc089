use std::path::PathBuf;

use clap::Args;
use object_store::{TransferError, UploadRequest};

use crate::cli::op::EngineError;

#[derive(Args, Debug, Clone)]
pub struct Push {
    /// Logical container (e.g. the owning group)
    #[arg(long)]
    pub container: String,

    /// Content key (e.g. the item id)
    #[arg(long)]
    pub key: String,

    /// Bag file to upload; removed once the upload is confirmed
    pub file: PathBuf,

    /// Media type (guessed from the file extension when omitted)
    #[arg(long)]
    pub media_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Push {
    type Error = PushError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let engine = ctx.engine().await?;

        let media_type = self.media_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.file)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

        let receipt = engine
            .upload(UploadRequest {
                container: self.container.clone(),
                key: self.key.clone(),
                path: self.file.clone(),
                media_type,
            })
            .await?;

        let mut output = format!(
            "Pushed {}/{} ({} bytes, {})\n\
             - Content id: {}\n\
             - SHA-256: {}\n\
             - Attempts: {}",
            receipt.container,
            receipt.key,
            receipt.length,
            receipt.mode,
            receipt.content_id,
            receipt.checksum,
            receipt.attempts,
        );
        if !receipt.source_removed {
            output.push_str(&format!(
                "\n- Warning: local bag {} was not removed",
                self.file.display()
            ));
        }
        Ok(output)
    }
}
