//! Card rendering for citable units, search hits, and catalog entries.

use normindex_core::TextUnit;
use normindex_service::SearchHit;
use normindex_sync::CatalogEntry;

const LABEL_WIDTH: usize = 14;

/// Print stored units as vertical cards grouped under a citation header.
pub fn print_units(units: &[TextUnit]) {
    println!("{} result(s)", units.len());
    for unit in units {
        println!();
        println!("=== {} ===", citation(unit));
        println!("{}", unit.text);
    }
}

/// Print semantic search hits with their cosine distances, closest first.
pub fn print_hits(query: &str, hits: &[SearchHit]) {
    println!("{} hit(s) for '{query}'", hits.len());
    for hit in hits {
        println!();
        println!("=== {} ===", citation(&hit.unit));
        println!("  {:<LABEL_WIDTH$} {:.4}", "distance", hit.distance);
        println!();
        println!("{}", hit.unit.text);
    }
}

/// Print imported codes with their stored unit counts.
pub fn print_codes(codes: &[(String, usize)]) {
    println!("{} code(s) in the store", codes.len());
    for (code, count) in codes {
        println!("  {code:<LABEL_WIDTH$} {count} unit(s)");
    }
}

/// Print catalog entries, optionally truncated.
pub fn print_catalog(entries: &[CatalogEntry], limit: Option<usize>) {
    println!("{} importable code(s)", entries.len());
    let shown = limit.unwrap_or(entries.len()).min(entries.len());
    for entry in &entries[..shown] {
        println!("  {:<LABEL_WIDTH$} {}", entry.code, entry.title);
    }
    if shown < entries.len() {
        println!("  … {} more (raise --limit to see them)", entries.len() - shown);
    }
}

/// Human-readable citation: code, section, and sub-section when present.
fn citation(unit: &TextUnit) -> String {
    let mut out = format!("{} {}", unit.code, unit.section);
    if !unit.sub_section.is_empty() {
        out.push_str(&format!(" ({})", unit.sub_section));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_includes_sub_section_only_when_present() {
        let with = TextUnit {
            text: String::new(),
            code: "bgb".into(),
            section: "§ 1".into(),
            sub_section: "2".into(),
        };
        let without = TextUnit {
            sub_section: String::new(),
            ..with.clone()
        };
        assert_eq!(citation(&with), "bgb § 1 (2)");
        assert_eq!(citation(&without), "bgb § 1");
    }
}
