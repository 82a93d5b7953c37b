//! Application service: deploy use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use anyhow::{Context, Result};
use chrono::Utc;
use stackweave_common::{DeployReport, GroupKind, StackResult, StackStatus};

use crate::application::ports::{
    ArtifactStore, DirectoryDigester, ImageBuilder, ProgressReporter, ProvisioningEngine,
};
use crate::application::services::synth_service;
use crate::domain::application::{DNS_OUTPUT, ImageSource};
use crate::domain::config::StackConfig;

/// Injected collaborators of [`deploy`].
pub struct DeployPorts<'a, E, B, S, D> {
    pub engine: &'a E,
    pub images: &'a B,
    pub store: &'a S,
    pub digester: &'a D,
}

/// Synthesize every stack and submit them to the engine in dependency order.
///
/// Nothing reaches the engine unless the whole graph composes. The first
/// stack the engine rejects ends the run; stacks already deployed are left
/// in place and later stacks are not attempted.
///
/// # Errors
///
/// Returns composition errors before any engine call, or the first engine
/// or image build failure.
pub async fn deploy<E, B, S, D>(
    ports: DeployPorts<'_, E, B, S, D>,
    config: &StackConfig,
    reporter: &impl ProgressReporter,
) -> Result<DeployReport>
where
    E: ProvisioningEngine,
    B: ImageBuilder,
    S: ArtifactStore,
    D: DirectoryDigester,
{
    let DeployPorts {
        engine,
        images,
        store,
        digester,
    } = ports;

    let outcome = synth_service::synth(config, digester, store)?;
    let synthesis = &outcome.synthesis;
    reporter.success(&format!(
        "synthesized {} stacks into {}",
        synthesis.stacks.len(),
        outcome.out_dir.display()
    ));

    if let ImageSource::Asset(asset) = &config.service.image {
        let tag = outcome
            .image_tag
            .as_deref()
            .context("image asset has no content digest")?;
        reporter.step(&format!("building image from {}", asset.directory.display()));
        let uri = images.build_and_push(asset, tag).await?;
        reporter.success(&format!("pushed {uri}"));
    }

    let mut stacks = Vec::with_capacity(synthesis.stacks.len());
    for stack in &synthesis.stacks {
        reporter.step(&format!("deploying {}", stack.name));
        tracing::info!(stack = %stack.name, group = %stack.group, "deploying stack");
        engine
            .deploy_stack(stack, &store.template_path(stack))
            .await
            .with_context(|| format!("deploying {}", stack.name))?;
        reporter.success(&format!("{} deployed", stack.name));
        stacks.push(StackResult {
            stack: stack.name.clone(),
            group: stack.group,
            status: StackStatus::Deployed,
        });
    }

    let app_stack = synthesis
        .stack(GroupKind::Application)
        .map(|s| s.name.clone())
        .context("synthesis produced no application stack")?;
    let outputs = engine.describe_outputs(&app_stack).await?;
    let load_balancer_dns = outputs.get(DNS_OUTPUT).cloned();
    if load_balancer_dns.is_none() {
        reporter.warn(&format!("{app_stack} reported no {DNS_OUTPUT} output"));
    }

    Ok(DeployReport {
        application: synthesis.manifest.application.clone(),
        environment: synthesis.manifest.environment.clone(),
        stacks,
        load_balancer_dns,
        finished_at: Utc::now(),
    })
}
