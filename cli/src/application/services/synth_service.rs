//! Application service: composition and synthesis use-cases.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{ArtifactStore, DirectoryDigester};
use crate::domain::application::ImageSource;
use crate::domain::config::StackConfig;
use crate::domain::graph::{CompositionContext, DeploymentGraph, Plan, compose};
use crate::domain::synth::{Synthesis, synthesize};

/// Resolve the composition context and compose the full graph.
///
/// A locally built image is tagged with the content digest of its build
/// directory, so unchanged sources resolve to the same task definition.
///
/// # Errors
///
/// Returns the first configuration or composition error, or an error if the
/// image directory cannot be read.
pub fn compose_graph(
    config: &StackConfig,
    digester: &impl DirectoryDigester,
) -> Result<DeploymentGraph> {
    let mut ctx = CompositionContext::resolve(config)?;
    if let ImageSource::Asset(asset) = &config.service.image {
        let digest = digester
            .digest_dir(&asset.directory)
            .with_context(|| format!("hashing image directory {}", asset.directory.display()))?;
        tracing::debug!(directory = %asset.directory.display(), %digest, "image asset digest");
        ctx = ctx.with_image_tag(digest);
    }
    compose(&ctx, config)
}

/// Compose and describe what a deploy would create, without synthesizing.
///
/// # Errors
///
/// Propagates composition errors.
pub fn plan(config: &StackConfig, digester: &impl DirectoryDigester) -> Result<Plan> {
    Ok(compose_graph(config, digester)?.plan())
}

/// Compose and synthesize in memory. Used by `validate`.
///
/// # Errors
///
/// Propagates composition and synthesis errors.
pub fn check(config: &StackConfig, digester: &impl DirectoryDigester) -> Result<Synthesis> {
    let graph = compose_graph(config, digester)?;
    synthesize(&graph)
}

/// Where a synthesis run left its artifacts.
#[derive(Debug)]
pub struct SynthOutcome {
    pub out_dir: PathBuf,
    pub synthesis: Synthesis,
    /// Content digest the image asset was tagged with, if any.
    pub image_tag: Option<String>,
}

/// Compose, synthesize and write every template plus the manifest.
///
/// # Errors
///
/// Propagates composition and synthesis errors, or an error if the
/// artifacts cannot be written.
pub fn synth(
    config: &StackConfig,
    digester: &impl DirectoryDigester,
    store: &impl ArtifactStore,
) -> Result<SynthOutcome> {
    let graph = compose_graph(config, digester)?;
    let synthesis = synthesize(&graph)?;
    let out_dir = store.write_stacks(&synthesis.stacks, &synthesis.manifest)?;
    tracing::info!(
        out_dir = %out_dir.display(),
        stacks = synthesis.stacks.len(),
        "templates written"
    );
    Ok(SynthOutcome {
        out_dir,
        synthesis,
        image_tag: graph.context.image_tag,
    })
}
