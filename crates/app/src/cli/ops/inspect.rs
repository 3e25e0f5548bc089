use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use descriptor::{AnyDescriptor, DescriptorError, PolicySubject};

#[derive(Args, Debug, Clone)]
pub struct Inspect {
    /// Descriptor file (metadata.xml, policies.xml or roles.xml)
    pub file: PathBuf,

    /// Print the decoded document as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Inspect {
    type Error = InspectError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bytes = tokio::fs::read(&self.file)
            .await
            .map_err(|source| InspectError::Read {
                path: self.file.clone(),
                source,
            })?;
        let doc = AnyDescriptor::decode(&bytes).map_err(|source| InspectError::Descriptor {
            path: self.file.clone(),
            source,
        })?;

        if self.json {
            return Ok(serde_json::to_string_pretty(&doc)?);
        }
        Ok(summarize(&doc))
    }
}

fn summarize(doc: &AnyDescriptor) -> String {
    let mut out = String::new();
    match doc {
        AnyDescriptor::Metadata(metadata) => {
            let _ = write!(out, "metadata: {} value(s)", metadata.len());
            for value in metadata.iter() {
                let _ = write!(out, "\n  {} = {:?}", value.field(), value.body());
                if let Some(language) = value.language() {
                    let _ = write!(out, " [{}]", language);
                }
            }
        }
        AnyDescriptor::Policies(policies) => {
            let _ = write!(out, "policies: {} rule(s)", policies.len());
            for policy in policies.iter() {
                let subject = match policy.subject() {
                    Some(PolicySubject::Group(id)) => format!("group {}", id),
                    Some(PolicySubject::EPerson(id)) => format!("eperson {}", id),
                    None => match policy.kind() {
                        Some(kind) => format!("no subject, type {}", kind),
                        None => "no subject".to_string(),
                    },
                };
                let _ = write!(out, "\n  {} -> {}", policy.action(), subject);
                if let Some(name) = policy.name() {
                    let _ = write!(out, " ({})", name);
                }
            }
        }
        AnyDescriptor::Roles(graph) => {
            let _ = write!(
                out,
                "roles: {} group(s), {} person(s)",
                graph.groups().count(),
                graph.persons().count()
            );
            for group in graph.groups() {
                let _ = write!(
                    out,
                    "\n  group {} {}: {} member(s), {} member group(s)",
                    group.id(),
                    group.name(),
                    group.members().count(),
                    group.member_groups().count()
                );
            }
        }
    }
    out
}
