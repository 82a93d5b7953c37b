//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;
use stackweave_common::{DeployReport, StackOutputs, StackResult, StackStatus};

use crate::domain::config::{StackConfig, VALID_CONFIG_KEYS, get_config_value};
use crate::domain::graph::Plan;
use crate::domain::network::SubnetKind;
use crate::domain::synth::Synthesis;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    pub fn render_version(&self, version: &str) {
        self.ctx.info(&format!("stackweave v{version}"));
    }

    /// Render the stacks, subnets and access edges a deploy would create.
    pub fn render_plan(&self, plan: &Plan) {
        if self.ctx.quiet {
            return;
        }
        let styles = &self.ctx.styles;
        println!();
        self.ctx
            .header(&format!("Plan for {} ({})", plan.application, plan.environment));
        println!();
        println!("  {}", "Stacks:".style(styles.bold));
        for (idx, stack) in plan.stacks.iter().enumerate() {
            let deps = if stack.depends_on.is_empty() {
                String::new()
            } else {
                format!("  after {}", stack.depends_on.join(", "))
            };
            println!(
                "    {}. {}{}",
                idx + 1,
                stack.stack.style(styles.stack),
                deps.style(styles.dim)
            );
        }

        println!();
        println!("  {}", "Subnets:".style(styles.bold));
        for subnet in &plan.subnets {
            let kind = match subnet.kind {
                SubnetKind::Public => subnet.kind.label().style(styles.public).to_string(),
                SubnetKind::Private => subnet.kind.label().to_string(),
            };
            let nat = subnet
                .nat_gateway
                .as_deref()
                .map(|n| format!("  via {n}"))
                .unwrap_or_default();
            println!(
                "    {:<16} {kind:<8} az{} {:<18}{}",
                subnet.id,
                subnet.zone,
                subnet.cidr,
                nat.style(styles.dim)
            );
        }

        println!();
        println!("  {}", "Access:".style(styles.bold));
        for edge in &plan.access {
            println!("    {edge}");
        }

        println!();
        self.ctx.kv("Image:", &plan.image);
        println!();
    }

    pub fn render_validate(&self, synthesis: &Synthesis) {
        let resources: usize = synthesis
            .stacks
            .iter()
            .map(|s| s.template.resources.len())
            .sum();
        self.ctx.success(&format!(
            "configuration is valid: {} stacks, {resources} resources",
            synthesis.stacks.len()
        ));
    }

    pub fn render_synth(&self, synthesis: &Synthesis, out_dir: &Path) {
        for stack in &synthesis.stacks {
            let path = out_dir.join(stack.file_name());
            self.ctx
                .kv(&format!("{:<28}", stack.name), &path.display().to_string());
        }
        self.ctx.success(&format!(
            "wrote {} templates to {}",
            synthesis.stacks.len(),
            out_dir.display()
        ));
    }

    pub fn render_deploy(&self, report: &DeployReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.success(&format!(
            "{} ({}) deployed: {} stacks",
            report.application,
            report.environment,
            report.stacks.len()
        ));
        match &report.load_balancer_dns {
            Some(dns) => self.ctx.kv("URL:", &format!("http://{dns}")),
            None => self.ctx.warn("load balancer DNS name not available yet"),
        }
    }

    pub fn render_destroy(&self, results: &[StackResult]) {
        for result in results {
            match result.status {
                StackStatus::Deleted => self.ctx.success(&format!("{} deleted", result.stack)),
                StackStatus::Absent => {
                    self.ctx.info(&format!("{} not found, skipped", result.stack));
                }
                StackStatus::Deployed => self.ctx.warn(&format!("{} still deployed", result.stack)),
            }
        }
    }

    pub fn render_outputs(&self, outputs: &[StackOutputs]) {
        if outputs.is_empty() {
            self.ctx.info("No deployed stacks found. Deploy with: stackweave deploy");
            return;
        }
        if self.ctx.quiet {
            return;
        }
        for stack in outputs {
            println!();
            println!("  {}", stack.stack.style(self.ctx.styles.header));
            if stack.outputs.is_empty() {
                println!("    {}", "(no outputs)".style(self.ctx.styles.dim));
            }
            for (key, value) in &stack.outputs {
                println!("    {:<32} {value}", key.style(self.ctx.styles.dim));
            }
        }
        println!();
    }

    /// Render the settable configuration keys and where the file lives.
    pub fn render_config(&self, config: &StackConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in VALID_CONFIG_KEYS {
            let value = get_config_value(config, key).unwrap_or_else(|| "(not set)".to_string());
            println!("  {:<28} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["STACKWEAVE_CONFIG", "STACKWEAVE_ENVIRONMENT", "NO_COLOR"] {
            println!(
                "    {:<24} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}
