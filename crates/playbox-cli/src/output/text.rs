//! Table output for stored entries.

use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};

const PREVIEW_CHARS: usize = 60;

/// Shorten a raw payload to one line for table display.
pub fn preview(raw: &str) -> String {
    let single_line = raw.replace('\n', " ");
    let char_count = single_line.chars().count();
    if char_count <= PREVIEW_CHARS {
        return single_line;
    }
    let truncated: String = single_line.chars().take(PREVIEW_CHARS - 3).collect();
    format!("{}...", truncated)
}

fn plain_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.to_vec());
    table
}

/// Render `(namespace, key, raw)` rows.
pub fn entries_table(rows: &[(String, String, String)]) -> String {
    let mut table = plain_table(&["NAMESPACE", "KEY", "VALUE"]);
    for (namespace, key, raw) in rows {
        table.add_row(vec![namespace.clone(), key.clone(), preview(raw)]);
    }
    table.to_string()
}

/// Render `(slug, title, version, keys)` rows for `playbox games`.
pub fn games_table(rows: &[(String, String, Option<u32>, usize)]) -> String {
    let mut table = plain_table(&["GAME", "TITLE", "VERSION", "KEYS"]);
    for (slug, title, version, keys) in rows {
        table.add_row(vec![
            slug.clone(),
            title.clone(),
            version.map_or_else(|| "-".to_string(), |v| v.to_string()),
            keys.to_string(),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_values() {
        let long = "x".repeat(100);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("{\n\"a\": 1\n}"), "{ \"a\": 1 }");
    }

    #[test]
    fn test_entries_table_lists_rows() {
        let rows = vec![("game".to_string(), "score".to_string(), "42".to_string())];
        let rendered = entries_table(&rows);
        assert!(rendered.contains("NAMESPACE"));
        assert!(rendered.contains("score"));
        assert!(rendered.contains("42"));
    }
}
