//! `ImageBuilder` backed by the docker CLI.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ImageBuilder};
use crate::domain::application::ImageAsset;
use crate::infra::cloudformation::EngineTarget;
use crate::infra::command_runner::QUERY_TIMEOUT;

/// Builds with `docker build`, logs in to ECR when the repository is an ECR
/// repository, then pushes.
pub struct DockerImageBuilder<R> {
    runner: R,
    target: EngineTarget,
    timeout: Duration,
}

impl<R: CommandRunner> DockerImageBuilder<R> {
    #[must_use]
    pub fn new(runner: R, target: EngineTarget, timeout: Duration) -> Self {
        Self {
            runner,
            target,
            timeout,
        }
    }

    async fn checked(&self, program: &str, args: &[&str], timeout: Duration) -> Result<Vec<u8>> {
        let output = self.runner.run_with_timeout(program, args, timeout).await?;
        if !output.status.success() {
            anyhow::bail!(
                "{program} {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }

    async fn ecr_login(&self, registry: &str) -> Result<()> {
        let mut args = vec!["ecr".to_string(), "get-login-password".to_string()];
        self.target.push_args(&mut args);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let password = self.checked("aws", &argv, QUERY_TIMEOUT).await?;

        let output = self
            .runner
            .run_with_stdin(
                "docker",
                &["login", "--username", "AWS", "--password-stdin", registry],
                &password,
            )
            .await?;
        if !output.status.success() {
            anyhow::bail!(
                "docker login to {registry} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

impl<R: CommandRunner> ImageBuilder for DockerImageBuilder<R> {
    async fn build_and_push(&self, asset: &ImageAsset, tag: &str) -> Result<String> {
        let uri = asset.image_uri(tag);
        let dockerfile = asset.directory.join(&asset.dockerfile);
        let dockerfile = dockerfile.to_string_lossy();
        let context = asset.directory.to_string_lossy();

        tracing::info!(%uri, "building image");
        self.checked(
            "docker",
            &["build", "--tag", &uri, "--file", &dockerfile, &context],
            self.timeout,
        )
        .await
        .with_context(|| format!("building {uri}"))?;

        if let Some(registry) = ecr_registry(&asset.repository) {
            self.ecr_login(registry).await?;
        }

        tracing::info!(%uri, "pushing image");
        self.checked("docker", &["push", &uri], self.timeout)
            .await
            .with_context(|| format!("pushing {uri}"))?;
        Ok(uri)
    }
}

/// Registry host of an ECR repository URI, e.g.
/// `123456789012.dkr.ecr.eu-west-1.amazonaws.com`.
fn ecr_registry(repository: &str) -> Option<&str> {
    let host = repository.split('/').next()?;
    host.contains(".dkr.ecr.").then_some(host)
}
