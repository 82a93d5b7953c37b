//! Application service: stack outputs use-case.

use anyhow::Result;
use stackweave_common::{GroupKind, StackOutputs};

use crate::application::ports::ProvisioningEngine;
use crate::domain::config::StackConfig;
use crate::domain::graph::CompositionContext;

/// Outputs of every deployed stack, in deploy order, or of `only` that one
/// group. Absent stacks are skipped.
///
/// # Errors
///
/// Returns an error if the name or environment is invalid or the engine
/// cannot be queried.
pub async fn outputs(
    engine: &impl ProvisioningEngine,
    config: &StackConfig,
    only: Option<GroupKind>,
) -> Result<Vec<StackOutputs>> {
    let ctx = CompositionContext::resolve(config)?;
    let mut found = Vec::new();
    let groups = GroupKind::ALL
        .into_iter()
        .filter(|g| only.is_none_or(|o| o == *g));
    for group in groups {
        let stack = ctx.stack_name(group);
        if engine.stack_status(&stack).await?.is_none() {
            continue;
        }
        let outputs = engine.describe_outputs(&stack).await?;
        found.push(StackOutputs {
            stack,
            group,
            outputs,
        });
    }
    Ok(found)
}
