//! Terminal rendering of search results

use std::io::Write;

use ludex_core::{result_link, GameEntry, Renderer, ResultSet, Severity, Source, Statistics};

/// Prints result cards and notices to stdout.
pub struct TerminalRenderer {
    language: String,
    json: bool,
}

impl TerminalRenderer {
    pub fn new(language: &str, json: bool) -> Self {
        Self {
            language: language.to_string(),
            json,
        }
    }

    /// Format a result envelope as text.
    pub fn format_results(&self, results: &ResultSet) -> String {
        let entries = results.entries();
        if !results.is_success() || entries.is_empty() {
            return "No results found\n".to_string();
        }

        let mut out = format!("{} result(s) found\n", entries.len());
        for (source, entry) in &entries {
            out.push('\n');
            out.push_str(&self.format_card(*source, entry));
        }
        out
    }

    fn format_card(&self, source: Source, entry: &GameEntry) -> String {
        let mut card = format!("  [{}] {}\n", source.as_str(), entry.titulo);

        if !entry.anios.is_empty() {
            card.push_str(&format!("      Years: {}\n", entry.anios.join(", ")));
        }
        if let Some(dev) = entry.desarrollador.as_deref().filter(|d| !d.is_empty()) {
            card.push_str(&format!("      Developer: {}\n", dev));
        }
        if !entry.generos.is_empty() {
            card.push_str(&format!("      Genres: {}\n", entry.generos.join(", ")));
        }

        match result_link(entry.uri.as_deref(), &self.language) {
            Some(link) => {
                card.push_str(&format!("      {}: {}\n", link.label, link.href));
                if let Some(original) = link.original {
                    card.push_str(&format!("      Original: {}\n", original));
                }
            }
            None => card.push_str("      No link available\n"),
        }

        card
    }

    fn emit(&self, text: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = handle.write_all(text.as_bytes());
        let _ = handle.flush();
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, results: &ResultSet) {
        if self.json {
            let text = serde_json::to_string_pretty(results.as_value())
                .unwrap_or_else(|_| results.as_value().to_string());
            self.emit(&format!("{}\n", text));
            return;
        }
        self.emit(&self.format_results(results));
    }

    fn render_notice(&self, message: &str, severity: Severity) {
        self.emit(&format!("[{}] {}\n", severity.as_str(), message));
    }

    fn clear(&self) {
        self.emit("(results cleared)\n");
    }
}

/// Format catalog statistics.
pub fn format_statistics(stats: &Statistics) -> String {
    let mut out = format!("Games in catalog: {}\n", stats.total);
    if !stats.generos_populares.is_empty() {
        out.push_str("\nMost popular genres:\n");
        for genre in &stats.generos_populares {
            out.push_str(&format!("  {:<24} {}\n", genre.nombre, genre.count));
        }
    }
    out
}
