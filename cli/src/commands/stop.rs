//! `confab stop`: leave the cluster (servers) and signal the agent.

use anyhow::Result;

use crate::application::services::controller::BootController;
use crate::commands::Invocation;
use crate::infra::clock::TokioClock;
use crate::output::OutputContext;

/// Run `confab stop`.
///
/// # Errors
///
/// Returns an error if no agent is recorded in the pid file or it cannot be
/// signalled.
pub async fn run(ctx: &OutputContext, invocation: Invocation) -> Result<()> {
    let runner = invocation.agent_runner();
    let client = invocation.agent_client()?;
    let clock = TokioClock;

    let controller = BootController::new(&runner, &client, &clock, invocation.params)?;
    controller.stop_agent().await?;
    ctx.success("Agent stopped");
    Ok(())
}
