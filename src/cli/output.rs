use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::bulk::{AggregatedSuggestion, RunResult};
use crate::store::{HistoryEntry, SavedKeyword};
use crate::suggest::Source;

/// One source's answer for a query; the shape exposed by `--json`.
#[derive(Serialize)]
struct SuggestionSet<'a> {
    query: &'a str,
    source: Source,
    suggestions: &'a [String],
}

/// One aggregated bulk entry with the variant that produced it.
#[derive(Serialize)]
struct BulkRecord<'a> {
    text: &'a str,
    source: Source,
    query: String,
}

pub fn suggestion_list(query: &str, source: Source, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return format!("No suggestions for \"{query}\" ({source})\n");
    }
    let mut out = format!(
        "{} suggestions for \"{query}\" ({source})\n\n",
        suggestions.len()
    );
    for text in suggestions {
        out.push_str(&format!("  {text}\n"));
    }
    out
}

pub fn grouped_suggestions(query: &str, groups: &[(Source, Vec<String>)]) -> String {
    if groups.is_empty() {
        return format!("No suggestions for \"{query}\": every source failed\n");
    }
    let mut out = String::new();
    for (i, (source, suggestions)) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&suggestion_list(query, *source, suggestions));
    }
    out
}

pub fn bulk_summary(result: &RunResult, query: &str, source: Source) -> String {
    let progress = result.progress;
    let mut out = format!(
        "{} unique suggestions for \"{query}\" ({source}, {}/{} variants)\n",
        result.suggestions.len(),
        progress.completed,
        progress.total
    );
    if progress.completed < progress.total {
        out.push_str("Run was cancelled; results are partial.\n");
    }
    if result.suggestions.is_empty() {
        return out;
    }

    out.push('\n');
    let width = result
        .suggestions
        .iter()
        .map(|item| item.text.chars().count())
        .max()
        .unwrap_or(0);
    for item in &result.suggestions {
        out.push_str(&format!(
            "  {:<width$}  via {}\n",
            item.text,
            item.variant.text()
        ));
    }
    out
}

pub fn saved_list(saved: &[SavedKeyword]) -> String {
    if saved.is_empty() {
        return "No saved keywords.\n".to_string();
    }
    let mut out = format!("{} saved keywords\n\n", saved.len());
    let width = saved
        .iter()
        .map(|k| k.text.chars().count())
        .max()
        .unwrap_or(0);
    for keyword in saved {
        out.push_str(&format!(
            "  {:<width$}  {:<8}  {}\n",
            keyword.text,
            keyword.source.as_str(),
            rfc3339(keyword.saved_at)
        ));
    }
    out
}

pub fn history_list(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No recent searches.\n".to_string();
    }
    let mut out = "Recent searches\n\n".to_string();
    let width = history
        .iter()
        .map(|entry| entry.query.chars().count())
        .max()
        .unwrap_or(0);
    for entry in history {
        out.push_str(&format!(
            "  {:<width$}  {:<8}  {}\n",
            entry.query,
            entry.source,
            rfc3339(entry.timestamp)
        ));
    }
    out
}

pub fn suggestion_set_json(
    query: &str,
    source: Source,
    suggestions: &[String],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&SuggestionSet {
        query,
        source,
        suggestions,
    })
}

pub fn grouped_json(query: &str, groups: &[(Source, Vec<String>)]) -> serde_json::Result<String> {
    let sets: Vec<SuggestionSet> = groups
        .iter()
        .map(|(source, suggestions)| SuggestionSet {
            query,
            source: *source,
            suggestions,
        })
        .collect();
    serde_json::to_string_pretty(&sets)
}

pub fn bulk_json(suggestions: &[AggregatedSuggestion]) -> serde_json::Result<String> {
    let records: Vec<BulkRecord> = suggestions
        .iter()
        .map(|item| BulkRecord {
            text: &item.text,
            source: item.source,
            query: item.variant.text(),
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::{Progress, QueryVariant};

    fn aggregated(text: &str, suffix: char) -> AggregatedSuggestion {
        AggregatedSuggestion {
            text: text.into(),
            source: Source::Google,
            variant: QueryVariant {
                base_query: "shoe".into(),
                suffix,
            },
        }
    }

    #[test]
    fn list_shows_count_and_items() {
        let text = suggestion_list(
            "shoe",
            Source::Google,
            &["shoes".to_string(), "shoe rack".to_string()],
        );
        assert!(text.starts_with("2 suggestions for \"shoe\" (google)"));
        assert!(text.contains("\n  shoes\n"));
        assert!(text.contains("\n  shoe rack\n"));
    }

    #[test]
    fn empty_list_has_friendly_message() {
        let text = suggestion_list("shoe", Source::Amazon, &[]);
        assert_eq!(text, "No suggestions for \"shoe\" (amazon)\n");
    }

    #[test]
    fn grouped_renders_each_source_section() {
        let groups = vec![
            (Source::Google, vec!["shoes".to_string()]),
            (Source::Youtube, vec!["shoe haul".to_string()]),
        ];
        let text = grouped_suggestions("shoe", &groups);
        assert!(text.contains("(google)"));
        assert!(text.contains("(youtube)"));
        assert!(text.contains("shoe haul"));
    }

    #[test]
    fn bulk_summary_lists_provenance() {
        let result = RunResult {
            suggestions: vec![aggregated("shoes", 'a'), aggregated("shoe bag", 'b')],
            progress: Progress {
                completed: 36,
                total: 36,
            },
        };
        let text = bulk_summary(&result, "shoe", Source::Google);
        assert!(text.starts_with("2 unique suggestions for \"shoe\" (google, 36/36 variants)"));
        assert!(text.contains("shoes     via shoea"));
        assert!(text.contains("shoe bag  via shoeb"));
        assert!(!text.contains("cancelled"));
    }

    #[test]
    fn bulk_summary_flags_partial_run() {
        let result = RunResult {
            suggestions: vec![aggregated("shoes", 'a')],
            progress: Progress {
                completed: 5,
                total: 36,
            },
        };
        let text = bulk_summary(&result, "shoe", Source::Google);
        assert!(text.contains("(google, 5/36 variants)"));
        assert!(text.contains("cancelled"));
    }

    #[test]
    fn suggestion_set_json_matches_wire_shape() {
        let json =
            suggestion_set_json("shoe", Source::Google, &["shoes".to_string()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["query"], "shoe");
        assert_eq!(value["source"], "google");
        assert_eq!(value["suggestions"][0], "shoes");
    }

    #[test]
    fn bulk_json_carries_variant_query() {
        let json = bulk_json(&[aggregated("shoes", 'a')]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["text"], "shoes");
        assert_eq!(value[0]["source"], "google");
        assert_eq!(value[0]["query"], "shoea");
    }

    #[test]
    fn saved_and_history_render_empty_states() {
        assert_eq!(saved_list(&[]), "No saved keywords.\n");
        assert_eq!(history_list(&[]), "No recent searches.\n");
    }

    #[test]
    fn history_rows_show_label_and_source() {
        let entries = vec![HistoryEntry {
            query: "shoe (bulk a-z, 0-9)".into(),
            source: "google".into(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }];
        let text = history_list(&entries);
        assert!(text.contains("shoe (bulk a-z, 0-9)"));
        assert!(text.contains("google"));
        assert!(text.contains("1970-01-01T00:00:00Z"));
    }
}
