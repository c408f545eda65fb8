//! `confab start`: boot the agent and wait for the cluster to form.

use anyhow::Result;

use crate::application::services::controller::BootController;
use crate::commands::Invocation;
use crate::domain::params::NodeRole;
use crate::infra::clock::TokioClock;
use crate::output::OutputContext;

/// Run `confab start`.
///
/// Clients boot only; servers boot and then push runtime configuration.
///
/// # Errors
///
/// Returns an error if the agent cannot be started, the cluster does not
/// form within the retry budget, or server configuration fails.
pub async fn run(ctx: &OutputContext, invocation: Invocation) -> Result<()> {
    let runner = invocation.agent_runner();
    let client = invocation.agent_client()?;
    let clock = TokioClock;
    let role = invocation.params.role;
    let expected = invocation.params.expected_members.len();

    let controller = BootController::new(&runner, &client, &clock, invocation.params)?;

    ctx.info(&format!("Starting {role} agent..."));
    let joined = controller.boot_agent().await?;
    ctx.success(&format!(
        "Cluster formed: {expected} expected member(s) present after {} attempt(s)",
        joined.attempts()
    ));

    match role {
        NodeRole::Client => {}
        NodeRole::Server => {
            controller.configure_server(&joined).await?;
            ctx.success("Server configuration applied");
        }
    }
    Ok(())
}
