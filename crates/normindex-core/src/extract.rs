//! Citation extraction: flatten a parsed document into citable text units.
//!
//! One unit is emitted per paragraph of every norm that carries both an
//! `enbez` designation and formatted text. The unit's `code` is always the
//! caller-supplied import code (not the in-document abbreviation) so that
//! later lookups use the same key that triggered the import. When a
//! document yields no unit at all (metadata-only instruments such as
//! international agreements), exactly one synthetic unit points the reader
//! at the externally hosted full text.

use serde::{Deserialize, Serialize};

use crate::norm::{Norm, NormDocument};

/// Section used for the synthetic metadata-only unit.
pub const METADATA_SECTION: &str = "Metadaten";

/// A flat, citable text unit. `(code, section, sub_section)` is the
/// citation key the store deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    pub text: String,
    pub code: String,
    pub section: String,
    pub sub_section: String,
}

/// Externally hosted renditions of a code, linked from the fallback unit.
/// Deterministic from the code; built by the document-source layer.
#[derive(Debug, Clone)]
pub struct SourceLinks {
    pub pdf: String,
    pub html: String,
}

/// Derive the sub-section identifier from a paragraph's leading
/// parenthesized numeral: `"(1) Text"` → `"1"`. A paragraph without one,
/// including a malformed parenthetical with no closing paren, yields `""`.
pub fn sub_section_of(paragraph: &str) -> &str {
    let Some(rest) = paragraph.strip_prefix('(') else {
        return "";
    };
    match rest.find(')') {
        Some(end) => &rest[..end],
        None => "",
    }
}

/// Flatten a document into citable units, in norm order then paragraph
/// order. The ordering is document order, not citation numeric order.
pub fn extract_units(doc: &NormDocument, code: &str, links: &SourceLinks) -> Vec<TextUnit> {
    let mut units = Vec::new();

    for norm in &doc.norms {
        let Some(enbez) = norm.metadata.enbez.as_deref() else {
            continue;
        };
        let Some(formatted) = norm
            .text_data
            .as_ref()
            .and_then(|t| t.text.as_ref())
            .and_then(|t| t.formatted.as_ref())
        else {
            continue;
        };
        for paragraph in &formatted.paragraphs {
            units.push(TextUnit {
                text: paragraph.clone(),
                code: code.to_string(),
                section: enbez.to_string(),
                sub_section: sub_section_of(paragraph).to_string(),
            });
        }
    }

    if units.is_empty()
        && let Some(first) = doc.norms.first()
    {
        units.push(metadata_fallback(first, code, links));
    }

    units
}

/// Compose the metadata-only notice from the first norm: title, citation
/// source, abbreviation, external PDF/HTML links, and any footnote text.
fn metadata_fallback(norm: &Norm, code: &str, links: &SourceLinks) -> TextUnit {
    let meta = &norm.metadata;

    let title = meta
        .long_title
        .clone()
        .or_else(|| meta.short_title.clone())
        .unwrap_or_else(|| code.to_uppercase());
    let jurabk = meta
        .jurabk
        .first()
        .cloned()
        .unwrap_or_else(|| code.to_uppercase());
    let fundstelle = meta
        .fundstellen
        .first()
        .map(|f| format!(" (Fundstelle: {} {})", f.periodikum, f.zitstelle))
        .unwrap_or_default();
    let footnote_text = norm
        .text_data
        .as_ref()
        .and_then(|t| t.footnotes.as_ref())
        .and_then(|f| f.formatted.as_ref())
        .map(|f| f.paragraphs.join(" "))
        .unwrap_or_default();

    let text = format!(
        "[METADATA-ONLY] {title}{fundstelle}\n\
         \n\
         Dieses Gesetz/Abkommen ist nicht als Volltext verfügbar.\n\
         Es handelt sich vermutlich um ein internationales Abkommen, einen Vertrag oder eine ältere Norm.\n\
         \n\
         Offizieller Name: {title}\n\
         Abkürzung: {jurabk}\n\
         \n\
         Volltext verfügbar unter:\n\
         - PDF: {pdf}\n\
         - HTML: {html}\n\
         \n\
         {footnote_text}",
        pdf = links.pdf,
        html = links.html,
    );

    TextUnit {
        text: text.trim().to_string(),
        code: code.to_string(),
        section: METADATA_SECTION.to_string(),
        sub_section: String::new(),
    }
}
