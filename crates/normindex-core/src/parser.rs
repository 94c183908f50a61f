//! Parser for the gii-norm XML dialect.
//!
//! Parsing is purely structural: the only fatal conditions are a byte
//! stream that is not UTF-8 and XML that does not parse at the document
//! level. Every absent or structurally unexpected sub-element degrades to
//! an empty field on the affected norm, never to an error.
//!
//! # Dialect notes
//!
//! - A `norm`'s primary container is `Content` for body text and `TOC` for
//!   a table of contents; both are equivalent paragraph sources.
//! - Rich text (`P`, titles, `standkommentar`) is flattened by a recursive
//!   walk: direct text, `BR` as newline, child text, then tail text. The
//!   result is collapsed line-wise (trim each line, drop empty lines).
//! - `table` elements are captured verbatim so they can be rendered later;
//!   only their `Title` caption is extracted.
//! - `FnR` markers are collected as ids, not resolved.

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::norm::{
    Footnote, FormattedText, Fundstelle, Metadata, Norm, NormDocument, StatusNote, StructuralUnit,
    TableCapture, TextContent, TextData,
};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("invalid XML: {0}")]
    Syntax(#[from] roxmltree::Error),
}

/// Parse a gii-norm byte stream into a [`NormDocument`].
pub fn parse(bytes: &[u8]) -> Result<NormDocument, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let doc = Document::parse(text)?;
    Ok(parse_document(doc.root_element()))
}

fn parse_document(root: Node<'_, '_>) -> NormDocument {
    NormDocument {
        builddate: attr(root, "builddate"),
        doknr: attr(root, "doknr"),
        norms: root
            .children()
            .filter(|n| n.has_tag_name("norm"))
            .map(parse_norm)
            .collect(),
    }
}

fn parse_norm(node: Node<'_, '_>) -> Norm {
    Norm {
        metadata: child(node, "metadaten")
            .map(parse_metadata)
            .unwrap_or_default(),
        text_data: child(node, "textdaten").map(parse_text_data),
        builddate: attr(node, "builddate"),
        doknr: attr(node, "doknr"),
    }
}

fn parse_metadata(node: Node<'_, '_>) -> Metadata {
    let mut meta = Metadata {
        jurabk: node
            .children()
            .filter(|n| n.has_tag_name("jurabk"))
            .filter_map(trimmed_text)
            .collect(),
        amtabk: child_text(node, "amtabk"),
        fundstellen: node
            .children()
            .filter(|n| n.has_tag_name("fundstelle"))
            .filter_map(parse_fundstelle)
            .collect(),
        short_title: child_rich_text(node, "kurzue"),
        long_title: child_rich_text(node, "langue"),
        structure: child(node, "gliederungseinheit").and_then(parse_structural_unit),
        enbez: child_text(node, "enbez"),
        status_notes: node
            .children()
            .filter(|n| n.has_tag_name("standangabe"))
            .filter_map(parse_status_note)
            .collect(),
        ..Default::default()
    };

    if let Some(datum) = child(node, "ausfertigung-datum") {
        meta.issue_date = trimmed_text(datum);
        meta.issue_date_manual = datum.attribute("manuell") == Some("ja");
    }
    if let Some(titel) = child(node, "titel") {
        meta.title = non_empty(collect_text(titel));
        meta.title_format = attr(titel, "format");
    }

    meta
}

/// A `fundstelle` without both `periodikum` and `zitstelle` is skipped.
fn parse_fundstelle(node: Node<'_, '_>) -> Option<Fundstelle> {
    let periodikum = child(node, "periodikum")?;
    let zitstelle = child(node, "zitstelle")?;

    let mut fundstelle = Fundstelle {
        periodikum: periodikum.text().unwrap_or_default().trim().to_string(),
        zitstelle: zitstelle.text().unwrap_or_default().trim().to_string(),
        kind: attr(node, "typ"),
        ..Default::default()
    };

    if let Some(anlage) = child(node, "anlageabgabe") {
        fundstelle.enclosure_date = child_text(anlage, "anlagedat");
        fundstelle.dokst = child_text(anlage, "dokst");
        fundstelle.issue_date = child_text(anlage, "abgabedat");
    }

    Some(fundstelle)
}

fn parse_structural_unit(node: Node<'_, '_>) -> Option<StructuralUnit> {
    let kennzahl = child_text(node, "gliederungskennzahl")?;
    Some(StructuralUnit {
        kennzahl,
        label: child_text(node, "gliederungsbez"),
        title: child_rich_text(node, "gliederungstitel"),
    })
}

fn parse_status_note(node: Node<'_, '_>) -> Option<StatusNote> {
    let standtyp = child(node, "standtyp")?;
    let kommentar = child(node, "standkommentar")?;
    Some(StatusNote {
        kind: standtyp.text().unwrap_or_default().trim().to_string(),
        comment: collect_text(kommentar),
        checked: attr(node, "checked"),
    })
}

fn parse_text_data(node: Node<'_, '_>) -> TextData {
    TextData {
        text: child(node, "text").map(parse_text_content),
        footnotes: child(node, "fussnoten").map(parse_text_content),
    }
}

fn parse_text_content(node: Node<'_, '_>) -> TextContent {
    // Content (body text) and TOC (table of contents) are equivalent
    // paragraph sources; Content wins when both are present.
    let container = child(node, "Content").or_else(|| child(node, "TOC"));

    TextContent {
        format: attr(node, "format"),
        formatted: container.map(parse_formatted),
        footnotes: child(node, "Footnotes")
            .map(|fns| {
                fns.children()
                    .filter(|n| n.has_tag_name("Footnote"))
                    .filter_map(parse_footnote)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn parse_formatted(node: Node<'_, '_>) -> FormattedText {
    FormattedText {
        content: collect_text(node),
        paragraphs: node
            .descendants()
            .filter(|n| n.has_tag_name("P"))
            .map(collect_text)
            .filter(|p| !p.is_empty())
            .collect(),
        tables: node
            .descendants()
            .filter(|n| n.has_tag_name("table"))
            .map(parse_table)
            .collect(),
        footnote_refs: node
            .descendants()
            .filter(|n| n.has_tag_name("FnR"))
            .filter_map(|n| attr(n, "ID"))
            .collect(),
    }
}

fn parse_table(node: Node<'_, '_>) -> TableCapture {
    TableCapture {
        caption: child(node, "Title").and_then(|t| non_empty(collect_text(t))),
        raw: node.document().input_text()[node.range()].to_string(),
    }
}

/// A `Footnote` without an `ID` is skipped.
fn parse_footnote(node: Node<'_, '_>) -> Option<Footnote> {
    Some(Footnote {
        id: attr(node, "ID")?,
        content: collect_text(node),
    })
}

// ── Rich text collection ──

/// Flatten the rich text of an element: direct text, `BR` as newline,
/// recursive child text, tail text; then trim each line and drop empties,
/// preserving line order.
fn collect_text(node: Node<'_, '_>) -> String {
    let mut raw = String::new();
    append_text(node, &mut raw);
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn append_text(node: Node<'_, '_>, out: &mut String) {
    for c in node.children() {
        if c.is_text() {
            out.push_str(c.text().unwrap_or_default());
        } else if c.has_tag_name("BR") {
            out.push('\n');
        } else if c.is_element() {
            append_text(c, out);
        }
    }
}

// ── Small node helpers ──

fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|c| c.has_tag_name(name))
}

/// Direct text of `node`, trimmed; `None` when empty.
fn trimmed_text(node: Node<'_, '_>) -> Option<String> {
    non_empty(node.text().unwrap_or_default().trim().to_string())
}

/// Trimmed direct text of the named child; `None` when absent or empty.
fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).and_then(trimmed_text)
}

/// Collected rich text of the named child; `None` when absent or empty.
fn child_rich_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).and_then(|c| non_empty(collect_text(c)))
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
