//! Rendered deployment documents.

use serde::Deserialize;

use crate::core::package_config::DEPLOY_DESCRIPTOR;
use crate::core::stage::Stage;

/// File stems that pin a template to a specific stage.
///
/// Any template whose stem is not listed here runs in [`Stage::Deploy`].
const RUN_CONDITIONS: &[(&str, Stage)] = &[
    ("pre-deploy", Stage::PreDeploy),
    ("post-deploy", Stage::PostDeploy),
];

/// Classify a template file by name.
///
/// Returns `None` for the deployment descriptor, which lives next to the
/// templates but is never a manifest.
pub fn classify(file_name: &str) -> Option<Stage> {
    if file_name == DEPLOY_DESCRIPTOR {
        return None;
    }

    let stem = file_name.split('.').next().unwrap_or(file_name);
    let stage = RUN_CONDITIONS
        .iter()
        .find(|(pattern, _)| *pattern == stem)
        .map(|(_, stage)| *stage)
        .unwrap_or(Stage::Deploy);

    Some(stage)
}

/// Identity of the object a manifest declares, used for rollout polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentHead {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    metadata: Option<DocumentMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

impl ResourceRef {
    /// Best-effort extraction of `kind`, `metadata.name` and
    /// `metadata.namespace` from a rendered document.
    ///
    /// Only the first document of a multi-document stream is inspected.
    pub fn extract(content: &str) -> Option<ResourceRef> {
        let first = serde_yaml::Deserializer::from_str(content).next()?;
        let head = DocumentHead::deserialize(first).ok()?;
        let metadata = head.metadata?;
        let name = metadata.name.filter(|n| !n.is_empty())?;

        Some(ResourceRef {
            kind: head.kind.filter(|k| !k.is_empty()),
            name,
            namespace: metadata.namespace.filter(|n| !n.is_empty()),
        })
    }
}

/// A single rendered deployment document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Template file name the document was rendered from.
    pub file_name: String,
    pub content: String,
    pub run_condition: Stage,
    pub resource: Option<ResourceRef>,
}

impl Manifest {
    pub fn new(file_name: impl Into<String>, content: String, run_condition: Stage) -> Self {
        let resource = ResourceRef::extract(&content);
        Manifest {
            file_name: file_name.into(),
            content,
            run_condition,
            resource,
        }
    }
}
