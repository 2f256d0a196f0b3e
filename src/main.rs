//! NZBGet queue/post-processing extension entry point.
//!
//! Exit codes follow NZBGet's script conventions: 93 success, 94 error,
//! 95 nothing to report.

use std::process::ExitCode;

use nzb_password_detector::context::env_vars;
use nzb_password_detector::{
    Config, Invocation, InvocationContext, Orchestrator, Outcome, Result, ToExitCode, logging,
};
use tracing::{debug, error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();

    let outcome = match run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{e}");
            e.outcome()
        }
    };
    ExitCode::from(outcome.exit_code())
}

async fn run() -> Result<Outcome> {
    let vars = env_vars();

    let ctx = match InvocationContext::from_vars(&vars)? {
        Invocation::Ignored(event) => {
            debug!(event = %event, "ignoring queue event");
            return Ok(Outcome::NoOpinion);
        }
        Invocation::Job(ctx) => ctx,
    };

    let config = Config::from_vars(&vars)?;
    let orchestrator = Orchestrator::from_config(&config)?;
    let report = orchestrator.run(&ctx).await?;
    debug!(state = ?report.state, cleaned = report.cleaned, "run finished");
    Ok(report.outcome())
}
