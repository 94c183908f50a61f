//! Document source: fetches a code's `xml.zip` container and unwraps it.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use normindex_core::SourceLinks;
use thiserror::Error;
use tracing::info;

pub const GII_BASE_URL: &str = "https://www.gesetze-im-internet.de";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("document request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document source returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("document archive unreadable: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("document archive contains no members")]
    EmptyArchive,

    #[error("reading archive member failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote source of statute documents, one container per code.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Raw container bytes for one code. Unwrap with [`xml_from_zip`]
    /// before parsing.
    async fn fetch(&self, code: &str) -> Result<Vec<u8>, SourceError>;

    /// Externally hosted PDF/HTML renditions for one code, linked from the
    /// metadata fallback unit.
    fn links_for(&self, code: &str) -> SourceLinks;
}

/// Document source backed by gesetze-im-internet.de.
pub struct GiiDocumentSource {
    client: reqwest::Client,
    base_url: String,
}

impl GiiDocumentSource {
    /// Create a source for the given base URL (no trailing slash needed).
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DocumentSource for GiiDocumentSource {
    async fn fetch(&self, code: &str) -> Result<Vec<u8>, SourceError> {
        let url = format!("{}/{code}/xml.zip", self.base_url);
        info!(url = %url, "fetching document container");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    fn links_for(&self, code: &str) -> SourceLinks {
        SourceLinks {
            pdf: format!("{}/{code}/{code}.pdf", self.base_url),
            html: format!("{}/{code}/index.html", self.base_url),
        }
    }
}

/// Unwrap the single XML member from a fetched `xml.zip` container.
///
/// The archives carry exactly one member; when more are present the first
/// is taken, matching the source site's layout.
pub fn xml_from_zip(bytes: &[u8]) -> Result<Vec<u8>, SourceError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    if archive.is_empty() {
        return Err(SourceError::EmptyArchive);
    }
    let mut member = archive.by_index(0)?;
    let mut out = Vec::with_capacity(member.size() as usize);
    member.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in members {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn unwraps_first_member() {
        let bytes = zip_with(&[
            ("BJNR001950896.xml", b"<dokumente/>"),
            ("extra.txt", b"ignored"),
        ]);
        assert_eq!(xml_from_zip(&bytes).unwrap(), b"<dokumente/>");
    }

    #[test]
    fn empty_archive_errors() {
        let bytes = zip_with(&[]);
        assert!(matches!(
            xml_from_zip(&bytes),
            Err(SourceError::EmptyArchive)
        ));
    }

    #[test]
    fn garbage_bytes_are_an_archive_error() {
        assert!(matches!(
            xml_from_zip(b"not a zip"),
            Err(SourceError::Archive(_))
        ));
    }

    #[test]
    fn links_are_deterministic_from_the_code() {
        let source = GiiDocumentSource::new("https://www.gesetze-im-internet.de/").unwrap();
        let links = source.links_for("rag_1");
        assert_eq!(
            links.pdf,
            "https://www.gesetze-im-internet.de/rag_1/rag_1.pdf"
        );
        assert_eq!(
            links.html,
            "https://www.gesetze-im-internet.de/rag_1/index.html"
        );
    }
}
