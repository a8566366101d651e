//! Static HTML dashboard.

use crate::engine::runner::ThresholdSource;
use crate::model::AggregateResult;
use crate::report::ReportContext;
use std::path::Path;

const STYLE: &str = r#"
    body { font-family: -apple-system, sans-serif; max-width: 950px; margin: 40px auto; background: #f4f4f9; color: #333; }
    .container { background: white; padding: 40px; border-radius: 12px; box-shadow: 0 4px 20px rgba(0,0,0,0.08); }
    h1 { border-bottom: 2px solid #eee; padding-bottom: 15px; }
    .summary-box { background: #e8f5e9; padding: 20px; border-radius: 8px; color: #2e7d32; border: 1px solid #c8e6c9; margin: 20px 0; }
    .code-box { background: #282c34; color: #abb2bf; padding: 20px; border-radius: 6px; font-family: 'Menlo', 'Monaco', 'Courier New', monospace; font-size: 0.85rem; overflow-x: auto; white-space: pre-wrap; border: 1px solid #181a1f; margin: 20px 0; line-height: 1.4; }
    table { width: 100%; border-collapse: collapse; margin-top: 25px; }
    th { background-color: #f8f9fa; text-align: left; padding: 15px; border-bottom: 2px solid #eee; }
    td { padding: 15px; border-bottom: 1px solid #eee; }
    .pass { color: #27ae60; font-weight: 700; background: #e8f8f5; padding: 4px 8px; border-radius: 4px; }
    .model-id { color: #888; font-size: 0.8rem; }
    .insight { background: #fff8e1; border-left: 4px solid #fbc02d; padding: 20px; margin-top: 30px; }
"#;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the dashboard. Pure: the same input always yields the same bytes.
pub fn render_html(ctx: &ReportContext, results: &[AggregateResult]) -> String {
    let title = escape_html(&ctx.title);
    let threshold_note = match ctx.threshold_source {
        ThresholdSource::Configured => format!(
            "A trial succeeds when at least <strong>{}</strong> tests pass (configured).",
            ctx.threshold
        ),
        ThresholdSource::Baseline => format!(
            "A trial succeeds when at least <strong>{}</strong> tests pass, the count measured on the unmodified target.",
            ctx.threshold
        ),
    };

    let mut html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title} | patchbench report</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="container">
    <h1>{title}</h1>
    <div class="summary-box">
      <strong>Executive Summary:</strong><br>
      Each model was asked for the same patch {iterations} times. Every answer was appended to the
      target file, which was then checked with the project's test suite and a static security scanner.
      {threshold_note}
    </div>
    <h2>1. The Challenge</h2>
    <p>{description}</p>
    <div class="code-box">{prompt}</div>
    <h2>2. Results</h2>
    <table>
      <thead>
        <tr>
          <th>Agent Model</th>
          <th>Consistency Score</th>
          <th>Avg Tokens</th>
          <th>Security Issues</th>
        </tr>
      </thead>
      <tbody>
"#,
        iterations = ctx.iterations,
        description = escape_html(&ctx.description),
        prompt = escape_html(ctx.prompt.trim()),
    );

    for r in results {
        html.push_str(&format!(
            r#"        <tr>
          <td><strong>{name}</strong><br><span class="model-id">{model}</span></td>
          <td><span class="pass">{consistency}</span></td>
          <td>{tokens}</td>
          <td>{security}</td>
        </tr>
"#,
            name = escape_html(&r.name),
            model = escape_html(&r.model),
            consistency = r.consistency_label(),
            tokens = r.avg_tokens,
            security = r.total_security,
        ));
    }

    html.push_str(
        r#"      </tbody>
    </table>
    <div class="insight">
      <h3>Reading the table</h3>
      <p>Consistency is the share of trials whose test run met the bar. Average tokens divides total
      usage by every trial, including ones that errored. Security issues sums the medium and high
      severity findings across all trials. Among models with equal consistency, the one with the
      lowest token footprint is the cheapest to run.</p>
    </div>
  </div>
</body>
</html>
"#,
    );
    html
}

pub fn write_html(
    ctx: &ReportContext,
    results: &[AggregateResult],
    out: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, render_html(ctx, results))?;
    Ok(())
}
