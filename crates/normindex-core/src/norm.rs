//! Typed document tree for the gii-norm dialect.
//!
//! Every optional element of the dialect maps to an `Option` or an empty
//! collection; the parser never invents values and never rejects a norm
//! because an element is absent. Business rules (e.g. "a citable unit
//! needs an `enbez`") live in [`crate::extract`], not here.

use serde::{Deserialize, Serialize};

/// Root of a parsed document: an ordered run of `norm` elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormDocument {
    pub builddate: Option<String>,
    pub doknr: Option<String>,
    pub norms: Vec<Norm>,
}

/// One structural unit of a statute: metadata plus optional text body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Norm {
    pub metadata: Metadata,
    pub text_data: Option<TextData>,
    pub builddate: Option<String>,
    pub doknr: Option<String>,
}

/// Metadata block (`metadaten`) of a norm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Legal abbreviations (`jurabk`); repeated elements allowed, order kept.
    pub jurabk: Vec<String>,
    /// Official abbreviation (`amtabk`).
    pub amtabk: Option<String>,
    /// Promulgation date (`ausfertigung-datum`), kept as the source string.
    pub issue_date: Option<String>,
    /// True when the date carries `manuell="ja"`.
    pub issue_date_manual: bool,
    /// Citation sources (`fundstelle`), order kept.
    pub fundstellen: Vec<Fundstelle>,
    /// Short title (`kurzue`).
    pub short_title: Option<String>,
    /// Long title (`langue`).
    pub long_title: Option<String>,
    /// Structural-unit descriptor (`gliederungseinheit`).
    pub structure: Option<StructuralUnit>,
    /// Provision designation (`enbez`), e.g. "§ 1" or "Art 3".
    pub enbez: Option<String>,
    /// Provision title (`titel`).
    pub title: Option<String>,
    pub title_format: Option<String>,
    /// Version annotations (`standangabe`), order kept.
    pub status_notes: Vec<StatusNote>,
}

/// Citation source (`fundstelle`): gazette plus locus, e.g. "BGBl I, 42".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fundstelle {
    pub periodikum: String,
    pub zitstelle: String,
    /// `typ` attribute: "amtlich" or "nichtamtlich".
    pub kind: Option<String>,
    pub enclosure_date: Option<String>,
    pub dokst: Option<String>,
    pub issue_date: Option<String>,
}

/// Structural unit (`gliederungseinheit`): book/chapter/title position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuralUnit {
    pub kennzahl: String,
    pub label: Option<String>,
    pub title: Option<String>,
}

/// Version annotation (`standangabe`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusNote {
    pub kind: String,
    pub comment: String,
    pub checked: Option<String>,
}

/// Text body (`textdaten`) of a norm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextData {
    /// Primary text block (`text`).
    pub text: Option<TextContent>,
    /// Footnote block (`fussnoten`).
    pub footnotes: Option<TextContent>,
}

/// One text or footnote section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextContent {
    pub format: Option<String>,
    pub formatted: Option<FormattedText>,
    pub footnotes: Vec<Footnote>,
}

/// Flattened rich text of a `Content` or `TOC` container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormattedText {
    /// Full collected text of the container.
    pub content: String,
    /// Collected text of every `P` descendant, document order.
    pub paragraphs: Vec<String>,
    /// Tables captured verbatim, document order.
    pub tables: Vec<TableCapture>,
    /// `FnR` cross-reference ids, document order, unresolved.
    pub footnote_refs: Vec<String>,
}

/// Opaque table capture: original markup preserved for later rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCapture {
    pub caption: Option<String>,
    pub raw: String,
}

/// A footnote body keyed by its markup id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Footnote {
    pub id: String,
    pub content: String,
}
