//! Core layer: gii-norm dialect tree, parser, and citation extraction.

pub mod extract;
pub mod norm;
pub mod parser;

pub use extract::{SourceLinks, TextUnit, extract_units, sub_section_of};
pub use norm::{
    Footnote, FormattedText, Fundstelle, Metadata, Norm, NormDocument, StatusNote, StructuralUnit,
    TableCapture, TextContent, TextData,
};
pub use parser::{ParseError, parse};
