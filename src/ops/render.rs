//! Rendering of a package's manifest templates.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::manifest::{classify, Manifest};
use crate::core::package_config::DEPLOY_DIR;
use crate::core::Package;
use crate::util::fs::{glob_files, pattern_under};
use crate::util::template::{self, TemplateError};

/// Pattern of template files inside the deployment directory.
pub const TEMPLATE_PATTERN: &str = "*.yaml";

/// A template file could not be read; nothing was rendered for the package.
#[derive(Debug, Error)]
#[error("failed to read `{}`", path.display())]
pub struct RenderError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A template that was skipped because it failed to render.
#[derive(Debug)]
pub struct SkippedTemplate {
    pub path: PathBuf,
    pub error: TemplateError,
}

/// Result of rendering one package.
#[derive(Debug, Default)]
pub struct Rendered {
    pub manifests: Vec<Manifest>,
    pub skipped: Vec<SkippedTemplate>,
}

/// Template files of the package at `package_path`, in match order.
pub fn template_files(package_path: &Path) -> Vec<PathBuf> {
    glob_files(&pattern_under(&package_path.join(DEPLOY_DIR), TEMPLATE_PATTERN))
}

/// Render every manifest template of `package` against its template context.
///
/// A template that fails to render is skipped and reported in
/// [`Rendered::skipped`]; a file that cannot be read aborts the package.
pub fn render_manifests(package: &Package) -> Result<Rendered, RenderError> {
    let context = package.template_context();
    let mut rendered = Rendered::default();

    for path in template_files(package.path()) {
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let Some(run_condition) = classify(&file_name) else {
            continue;
        };

        let source = std::fs::read_to_string(&path).map_err(|source| RenderError {
            path: path.clone(),
            source,
        })?;

        match template::render(&source, &context) {
            Ok(content) => {
                tracing::debug!("rendered {} as {}", path.display(), run_condition);
                rendered
                    .manifests
                    .push(Manifest::new(file_name, content, run_condition));
            }
            Err(error) => rendered.skipped.push(SkippedTemplate { path, error }),
        }
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::Environment;
    use crate::core::stage::Stage;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn package(dir: &Path) -> Package {
        let env: Environment = Arc::new(BTreeMap::from([("REGION".into(), "eu".into())]));
        Package::new(dir, "abc", env)
            .unwrap()
            .with_image_root("registry.local")
    }

    fn write_kube(dir: &Path, name: &str, contents: &str) {
        std::fs::create_dir_all(dir.join("kube")).unwrap();
        std::fs::write(dir.join("kube").join(name), contents).unwrap();
    }

    #[test]
    fn test_render_and_classify() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api");
        write_kube(&dir, "deployment.yaml", "kind: Deployment\nmetadata:\n  name: {{ .Name }}\n");
        write_kube(&dir, "post-deploy.yaml", "kind: Job\nmetadata:\n  name: {{ .Name }}-migrate\n");
        write_kube(&dir, "pre-deploy.yaml", "region: {{ .Env.REGION }}\n");
        write_kube(&dir, "monokube.yaml", "version: 1.0.0\n");
        write_kube(&dir, "pre-build.sh", "#!/bin/sh\n");

        let rendered = render_manifests(&package(&dir)).unwrap();
        assert!(rendered.skipped.is_empty());

        let files: Vec<_> = rendered
            .manifests
            .iter()
            .map(|m| (m.file_name.as_str(), m.run_condition))
            .collect();
        assert_eq!(
            files,
            vec![
                ("deployment.yaml", Stage::Deploy),
                ("post-deploy.yaml", Stage::PostDeploy),
                ("pre-deploy.yaml", Stage::PreDeploy),
            ]
        );

        let deployment = &rendered.manifests[0];
        assert!(deployment.content.contains("name: api\n"));
        assert_eq!(deployment.resource.as_ref().unwrap().name, "api");
        assert_eq!(rendered.manifests[2].content, "region: eu\n");
    }

    #[test]
    fn test_bad_template_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api");
        write_kube(&dir, "a.yaml", "name: {{ .Name\n");
        write_kube(&dir, "b.yaml", "name: {{ .Unknown }}\n");
        write_kube(&dir, "c.yaml", "name: {{ .Name }}\n");

        let rendered = render_manifests(&package(&dir)).unwrap();
        assert_eq!(rendered.manifests.len(), 1);
        assert_eq!(rendered.manifests[0].file_name, "c.yaml");
        assert_eq!(rendered.skipped.len(), 2);
        assert!(matches!(rendered.skipped[0].error, TemplateError::Syntax { .. }));
        assert!(matches!(rendered.skipped[1].error, TemplateError::Exec { .. }));
    }

    #[test]
    fn test_no_deploy_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api");
        std::fs::create_dir(&dir).unwrap();

        let rendered = render_manifests(&package(&dir)).unwrap();
        assert!(rendered.manifests.is_empty());
    }

    #[test]
    fn test_unreadable_template_aborts_package() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api");
        write_kube(&dir, "a.yaml", "name: {{ .Name }}\n");
        // Invalid UTF-8 cannot be read as a template.
        std::fs::write(dir.join("kube/b.yaml"), [0xff, 0xfe, 0x00]).unwrap();

        let err = render_manifests(&package(&dir)).unwrap_err();
        assert!(err.path.ends_with("b.yaml"));
    }
}
