//! Base template fetcher.
//!
//! Keeps `<work-dir>/templates/<basename>` present: an existing copy is
//! reused unless a re-download is forced.

use std::io::ErrorKind;

use boxes_core::error::Result;
use boxes_core::{BoxContext, TemplateSource};

use crate::gateway::{CommandGateway, HostCommand};

/// Ensures the base template archive exists locally.
pub struct TemplateFetcher<'a> {
    gateway: &'a dyn CommandGateway,
}

impl<'a> TemplateFetcher<'a> {
    pub fn new(gateway: &'a dyn CommandGateway) -> Self {
        Self { gateway }
    }

    /// Make sure the template is present, downloading it when missing.
    ///
    /// With `force_redownload` any existing copy is deleted first so the
    /// download never lands next to a stale file.
    pub async fn ensure(
        &self,
        ctx: &BoxContext,
        source: &TemplateSource,
        force_redownload: bool,
    ) -> Result<()> {
        let templates_dir = ctx.templates_dir();
        tokio::fs::create_dir_all(&templates_dir).await?;

        let local = source.local_path();
        if force_redownload {
            match tokio::fs::remove_file(local).await {
                Ok(()) => {
                    tracing::info!(path = %local.display(), "Removed cached template for re-download")
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if tokio::fs::try_exists(local).await? {
            tracing::info!(path = %local.display(), "Template already present, skipping download");
            return Ok(());
        }

        println!("Downloading {}", source.base());
        self.gateway
            .run_or_fail(
                &HostCommand::Download {
                    url: source.base().to_string(),
                    dest_dir: templates_dir,
                },
                &format!("Could not download template {}", source.base()),
            )
            .await?;

        tracing::info!(base = %source.base(), path = %local.display(), "Template downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::CommandOutput;
    use crate::testing::FakeGateway;
    use boxes_core::{BoxError, BoxesConfig};

    fn setup(work_dir: &std::path::Path) -> (BoxContext, TemplateSource) {
        let ctx = BoxContext::new("development", work_dir).unwrap();
        let source =
            TemplateSource::resolve(&ctx, Some("precise64_base"), &BoxesConfig::default()).unwrap();
        (ctx, source)
    }

    #[tokio::test]
    async fn test_downloads_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, source) = setup(tmp.path());
        let gateway = FakeGateway::new();

        TemplateFetcher::new(&gateway)
            .ensure(&ctx, &source, false)
            .await
            .unwrap();

        assert!(ctx.templates_dir().is_dir());
        assert_eq!(
            gateway.commands(),
            vec![HostCommand::Download {
                url: "http://files.travis-ci.org/openvz-templates/bases/precise64_base.tar.gz"
                    .to_string(),
                dest_dir: ctx.templates_dir(),
            }]
        );
    }

    #[tokio::test]
    async fn test_existing_copy_skips_download() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, source) = setup(tmp.path());
        std::fs::create_dir_all(ctx.templates_dir()).unwrap();
        std::fs::write(source.local_path(), "cached").unwrap();
        let gateway = FakeGateway::new();

        TemplateFetcher::new(&gateway)
            .ensure(&ctx, &source, false)
            .await
            .unwrap();

        assert!(gateway.commands().is_empty());
        assert_eq!(std::fs::read_to_string(source.local_path()).unwrap(), "cached");
    }

    #[tokio::test]
    async fn test_force_deletes_and_refetches() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, source) = setup(tmp.path());
        std::fs::create_dir_all(ctx.templates_dir()).unwrap();
        std::fs::write(source.local_path(), "stale").unwrap();
        let gateway = FakeGateway::new();

        TemplateFetcher::new(&gateway)
            .ensure(&ctx, &source, true)
            .await
            .unwrap();

        assert!(!source.local_path().exists());
        assert_eq!(gateway.commands().len(), 1);
        assert!(matches!(gateway.commands()[0], HostCommand::Download { .. }));
    }

    #[tokio::test]
    async fn test_force_without_existing_copy() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, source) = setup(tmp.path());
        let gateway = FakeGateway::new();

        TemplateFetcher::new(&gateway)
            .ensure(&ctx, &source, true)
            .await
            .unwrap();

        assert_eq!(gateway.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_download_is_external_command_error() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, source) = setup(tmp.path());
        let gateway = FakeGateway::with_responder(|_| CommandOutput::failed(8));

        let err = TemplateFetcher::new(&gateway)
            .ensure(&ctx, &source, false)
            .await
            .unwrap_err();

        match err {
            BoxError::ExternalCommand {
                command, exit_code, ..
            } => {
                assert!(command.starts_with("wget -q "));
                assert_eq!(exit_code, Some(8));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_force_delete_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, source) = setup(tmp.path());
        // A directory where the template file should be cannot be removed
        // with remove_file.
        std::fs::create_dir_all(source.local_path()).unwrap();
        let gateway = FakeGateway::new();

        let err = TemplateFetcher::new(&gateway)
            .ensure(&ctx, &source, true)
            .await
            .unwrap_err();

        assert!(matches!(err, BoxError::IoError(_)));
        assert!(gateway.commands().is_empty());
    }
}
