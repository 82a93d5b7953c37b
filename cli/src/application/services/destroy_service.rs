//! Application service: destroy use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use stackweave_common::{GroupKind, StackResult, StackStatus};

use crate::application::ports::{ProgressReporter, ProvisioningEngine};
use crate::domain::config::StackConfig;
use crate::domain::graph::CompositionContext;

/// Delete every stack in reverse dependency order.
///
/// Only the application name and environment are needed, so a config that
/// no longer composes can still be torn down. Stacks the engine does not
/// know are reported as absent.
///
/// # Errors
///
/// Returns an error if the name or environment is invalid, or on the first
/// failed deletion. Stacks that depend on the failed one have already been
/// removed; the ones it depends on are left alone.
pub async fn destroy(
    engine: &impl ProvisioningEngine,
    config: &StackConfig,
    reporter: &impl ProgressReporter,
) -> Result<Vec<StackResult>> {
    let ctx = CompositionContext::resolve(config)?;
    let mut results = Vec::with_capacity(GroupKind::ALL.len());

    for group in GroupKind::ALL.into_iter().rev() {
        let stack = ctx.stack_name(group);
        let status = if engine.stack_status(&stack).await?.is_some() {
            reporter.step(&format!("deleting {stack}"));
            tracing::info!(%stack, "deleting stack");
            engine
                .delete_stack(&stack)
                .await
                .with_context(|| format!("deleting {stack}"))?;
            reporter.success(&format!("{stack} deleted"));
            StackStatus::Deleted
        } else {
            tracing::debug!(%stack, "stack absent");
            StackStatus::Absent
        };
        results.push(StackResult {
            stack,
            group,
            status,
        });
    }
    Ok(results)
}
