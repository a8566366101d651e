use crate::engine::runner::RunSummary;
use crate::report::ReportContext;
use std::path::Path;

pub fn build_json(
    ctx: &ReportContext,
    summary: &RunSummary,
    generated_at: chrono::DateTime<chrono::Utc>,
) -> serde_json::Value {
    serde_json::json!({
        "generated_at": generated_at.to_rfc3339(),
        "task": ctx.title,
        "iterations": ctx.iterations,
        "threshold": summary.threshold,
        "threshold_source": summary.threshold_source,
        "results": summary.results,
    })
}

pub fn write_json(ctx: &ReportContext, summary: &RunSummary, out: &Path) -> anyhow::Result<()> {
    let v = build_json(ctx, summary, chrono::Utc::now());
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, serde_json::to_string_pretty(&v)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::runner::ThresholdSource;
    use crate::model::AggregateResult;
    use chrono::TimeZone;

    #[test]
    fn includes_threshold_and_results() {
        let ctx = ReportContext {
            title: "Secure headers".into(),
            description: String::new(),
            prompt: "p".into(),
            iterations: 2,
            threshold: 3032,
            threshold_source: ThresholdSource::Baseline,
        };
        let summary = RunSummary {
            threshold: 3032,
            threshold_source: ThresholdSource::Baseline,
            results: vec![AggregateResult {
                name: "Llama 3.1 (8B)".into(),
                model: "llama-3.1-8b-instant".into(),
                iterations: 2,
                successes: 1,
                errors: 1,
                consistency_pct: 50.0,
                avg_tokens: 25,
                total_security: 1,
            }],
        };
        let at = chrono::Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let v = build_json(&ctx, &summary, at);

        assert_eq!(v["generated_at"], "2026-01-02T03:04:05+00:00");
        assert_eq!(v["threshold_source"], "baseline");
        assert_eq!(v["results"][0]["avg_tokens"], 25);
        assert_eq!(v["results"][0]["model"], "llama-3.1-8b-instant");
    }
}
