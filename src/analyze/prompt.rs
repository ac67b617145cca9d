// src/analyze/prompt.rs
//! Prompt construction: a deterministic, pure rendering of the collected
//! trends plus the topic and the JSON reply contract. No I/O, no state.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::scrape::truncate_chars;
use crate::scrape::types::TrendItem;

/// Per-source cap on rendered trend lines, to bound prompt size.
const MAX_LINES_PER_SOURCE: usize = 10;

/// Description excerpt length per rendered line.
const DESCRIPTION_EXCERPT_CHARS: usize = 100;

/// Metadata keys treated as an engagement score, in preference order.
const SCORE_KEYS: &[&str] = &["stars", "likes", "views"];

/// The reply contract; mirrors the shape the validator enforces.
const RESPONSE_CONTRACT: &str = r#"You MUST respond with a single valid JSON object in exactly this format:
{
  "summary": "2-3 sentence summary of the observed trends",
  "ideas": [
    {
      "title": "idea title",
      "description": "what to build",
      "rationale": "why the observed trends make this worth building now",
      "difficulty": "easy|medium|hard",
      "tags": ["tech-1", "tech-2"],
      "first_step": "the first concrete step"
    }
  ]
}
"#;

/// Render the full request for the generative model.
pub fn build_prompt(items: &[TrendItem], topic: &str) -> String {
    let trends = render_trends(items);
    let mut out = String::with_capacity(2048 + trends.len());

    let _ = write!(
        out,
        "You are a creative idea generator for developers.\n\
         Your job is to analyze current tech trends and suggest creative, practical project ideas related to the topic: \"{topic}\".\n\
         \n\
         Guidelines:\n\
         - All ideas MUST be related to \"{topic}\"\n\
         - Ideas should be buildable in one day (MVP)\n\
         - Be specific and actionable\n\
         - Consider what is trending NOW and why it matters\n\
         - Avoid generic or overdone ideas - be creative!\n\
         - Each idea should leverage current trends in a unique way\n\
         \n"
    );
    out.push_str(RESPONSE_CONTRACT);
    let _ = write!(
        out,
        "\nBased on today's tech trends, suggest 3 project ideas related to \"{topic}\".\n\
         \n\
         ## Today's Trends\n\
         \n\
         {trends}\
         ---\n\
         \n\
         Analyze these trends and suggest 3 creative \"{topic}\" ideas that:\n\
         1. Are inspired by or leverage these trends\n\
         2. Can be built as an MVP in one day\n\
         3. Solve a real problem\n\
         4. Are NOT just clones of existing tools\n\
         \n\
         Respond with valid JSON only. No markdown, no explanation outside the JSON.\n"
    );
    out
}

/// Group trends by source in first-seen order and render a bounded block
/// per source: title, engagement score if present, description excerpt.
fn render_trends(items: &[TrendItem]) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&TrendItem>> = HashMap::new();
    for item in items {
        if !grouped.contains_key(item.source.as_str()) {
            order.push(item.source.as_str());
        }
        grouped.entry(item.source.as_str()).or_default().push(item);
    }

    let mut out = String::new();
    for source in order {
        let _ = writeln!(out, "### {source}");
        for item in grouped[source].iter().take(MAX_LINES_PER_SOURCE) {
            let score = metadata_score(item)
                .map(|(k, v)| format!(" ({k}: {v})"))
                .unwrap_or_default();
            let desc = item
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| format!("\n   {}...", truncate_chars(d, DESCRIPTION_EXCERPT_CHARS)))
                .unwrap_or_default();
            let _ = writeln!(out, "- {}{score}{desc}", item.title);
        }
        out.push('\n');
    }
    out
}

fn metadata_score(item: &TrendItem) -> Option<(&'static str, u64)> {
    for key in SCORE_KEYS {
        if let Some(v) = item.metadata.get(*key).and_then(|v| v.as_u64()) {
            return Some((key, v));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str, title: &str) -> TrendItem {
        TrendItem::new(source, title)
    }

    #[test]
    fn prompt_contains_topic_titles_and_contract() {
        let items = vec![item("GitHub", "foo/bar - Rust"), item("Twitter/X (ai)", "hot take")];
        let p = build_prompt(&items, "AI agent");
        assert!(p.contains("\"AI agent\""));
        assert!(p.contains("foo/bar - Rust"));
        assert!(p.contains("hot take"));
        assert!(p.contains("valid JSON"));
        assert!(p.contains("\"ideas\""));
    }

    #[test]
    fn sources_are_grouped_in_first_seen_order() {
        let items = vec![
            item("B", "b1"),
            item("A", "a1"),
            item("B", "b2"),
        ];
        let block = render_trends(&items);
        let pos_b = block.find("### B").expect("B header");
        let pos_a = block.find("### A").expect("A header");
        assert!(pos_b < pos_a, "first-seen source must render first");
        // b2 stays under the B header even though A was seen in between
        assert!(block.find("b2").unwrap() < pos_a);
    }

    #[test]
    fn per_source_lines_are_capped() {
        let items: Vec<TrendItem> = (0..30).map(|i| item("GitHub", &format!("repo-{i}"))).collect();
        let block = render_trends(&items);
        assert!(block.contains("repo-9"));
        assert!(!block.contains("repo-10"));
    }

    #[test]
    fn score_and_description_render_when_present() {
        let mut it = item("GitHub", "foo/bar - Rust");
        it.metadata.insert("stars".into(), serde_json::json!(420));
        it.description = Some("a".repeat(150));
        let block = render_trends(&[it]);
        assert!(block.contains("(stars: 420)"));
        // excerpt is truncated with a trailing ellipsis
        assert!(block.contains(&format!("{}...", "a".repeat(100))));
        assert!(!block.contains(&"a".repeat(101)));
    }

    #[test]
    fn same_input_renders_identically() {
        let items = vec![item("GitHub", "x"), item("GitHub", "y")];
        assert_eq!(build_prompt(&items, "t"), build_prompt(&items, "t"));
    }
}
