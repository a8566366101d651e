use crate::cli::args::RunArgs;
use crate::exit_codes;
use patchbench_core::config::{load_config, BenchConfig};
use patchbench_core::providers::llm::build_client;
use patchbench_core::report::console::{console_progress_sink, print_summary};
use patchbench_core::report::{html, json, ReportContext};
use patchbench_core::{BenchError, BenchRunner};

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<i32> {
    match execute(args).await {
        Err(e) => match e.downcast_ref::<BenchError>() {
            Some(err) if err.is_fatal() => {
                eprintln!("error: {err}");
                Ok(exit_codes::CONFIG_ERROR)
            }
            _ => Err(e),
        },
        ok => ok,
    }
}

async fn execute(args: RunArgs) -> anyhow::Result<i32> {
    let mut cfg = load_config(&args.config)?;
    apply_overrides(&mut cfg, &args);
    cfg.validate()?;

    let client = build_client(&cfg, |var| std::env::var(var).ok())?;
    let runner = BenchRunner::from_config(cfg, client);
    // Dropping the run future drops its cleanup guard, which restores the target.
    let summary = tokio::select! {
        res = runner.run(Some(console_progress_sink())) => res?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted; target restored and artifacts removed.");
            return Ok(exit_codes::INTERRUPTED);
        }
    };
    let cfg = &runner.config;

    print_summary(&summary.results);

    let ctx = ReportContext::from_run(cfg, &summary);
    html::write_html(&ctx, &summary.results, &cfg.report.html_path)?;
    eprintln!("\nReport written to {}", cfg.report.html_path.display());
    if let Some(path) = &cfg.report.json_path {
        json::write_json(&ctx, &summary, path)?;
        eprintln!("JSON written to {}", path.display());
    }

    Ok(exit_codes::SUCCESS)
}

fn apply_overrides(cfg: &mut BenchConfig, args: &RunArgs) {
    if let Some(n) = args.iterations {
        cfg.iterations = n;
    }
    if let Some(t) = args.threshold {
        cfg.success_threshold = Some(t);
    }
    if let Some(p) = &args.output {
        cfg.report.html_path = p.clone();
    }
    if let Some(p) = &args.json {
        cfg.report.json_path = Some(p.clone());
    }
}
