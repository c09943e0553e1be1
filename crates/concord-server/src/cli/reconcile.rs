use crate::cli::ReconcileArgs;
use crate::config::ConcordConfig;
use crate::serve::open_store;
use anyhow::{Context, Result};
use concord_core::{DisabledOracle, Oracle, ReconciliationRequest};
use std::io::Read;
use std::sync::Arc;

pub async fn run(args: ReconcileArgs, config: ConcordConfig) -> Result<()> {
    let body = if args.file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?
    };

    let request: ReconciliationRequest =
        serde_json::from_str(&body).context("Invalid JSON in request body")?;

    let oracle: Arc<dyn Oracle> = if args.no_oracle {
        Arc::new(DisabledOracle)
    } else {
        config.build_oracle()?
    };
    let orchestrator = config.build_orchestrator(open_store(&config), oracle);

    let response = orchestrator.handle(request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
