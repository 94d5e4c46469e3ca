// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;

use anyhow::{bail, Context};
use flowline::config::{load_and_validate_flow, FlowRuntime};
use flowline::flow::FlowInputs;
use flowline::observability::logging::init_logging;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

fn usage(program: &str) -> String {
    format!(
        "Usage: {} <flow.yaml> <inputs-json> [line_number]\n\
         Example: {} flows/qa.yaml '{{\"question\": \"what is a DAG?\"}}' 0",
        program, program
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!(usage(&args[0]));
    }

    init_logging("info")?;

    let flow_path = &args[1];
    let inputs: FlowInputs = match serde_json::from_str::<Value>(&args[2])
        .with_context(|| format!("inputs are not valid JSON: {}", args[2]))?
    {
        Value::Object(map) => map.into_iter().collect(),
        other => bail!("inputs must be a JSON object, got {}", other),
    };
    let line_number = args
        .get(3)
        .map(|raw| raw.parse::<usize>())
        .transpose()
        .context("line_number must be a non-negative integer")?;

    let config = load_and_validate_flow(flow_path)
        .with_context(|| format!("failed to load flow {}", flow_path))?;
    let runtime = FlowRuntime::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received interrupt, cancelling the running line");
            on_signal.cancel();
        }
    });

    let started = Instant::now();
    let result = runtime.run_line(inputs, line_number, cancel).await?;
    tracing::info!(
        "Line finished in {:.3}s, {} node(s) bypassed",
        started.elapsed().as_secs_f64(),
        result.bypassed_nodes.len()
    );

    let outputs: serde_json::Map<String, Value> = result.outputs.into_iter().collect();
    let report = serde_json::json!({
        "outputs": outputs,
        "bypassed_nodes": result.bypassed_nodes,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
