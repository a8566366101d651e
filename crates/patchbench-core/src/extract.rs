//! Pull the code a model meant to hand back out of its raw reply.

use regex::Regex;
use std::sync::OnceLock;

fn think_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("static regex"))
}

fn starts_code(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("def ") || t.starts_with("async def ") || t.starts_with('@')
}

/// Strip fences and reasoning blocks, then keep everything from the first
/// function or decorator line on, minus trailing whitespace. Falls back to the
/// trimmed text when no such line exists. The result is always wrapped in a
/// leading and trailing newline so it can be appended to a source file as-is.
pub fn extract_code(raw: &str) -> String {
    let text = raw.replace("```python", "").replace("```", "");
    let text = think_block().replace_all(&text, "");

    let lines: Vec<&str> = text.split('\n').collect();
    match lines.iter().position(|l| starts_code(l)) {
        Some(start) => format!("\n{}\n", lines[start..].join("\n").trim_end()),
        None => format!("\n{}\n", text.trim()),
    }
}
