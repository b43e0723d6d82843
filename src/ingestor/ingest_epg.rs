use crate::errors::LoadError;
use crate::models::{MergeReport, MergeWarning, SourceDocument};
use crate::utils::xml_tree::{parse_document, Element};
use std::path::Path;
use tracing::{debug, warn};

const UTF8_BOM: char = '\u{feff}';

/// Loads XMLTV files from disk into element trees
#[derive(Debug, Clone, Default)]
pub struct EpgIngestor;

impl EpgIngestor {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse one input file
    pub fn load(&self, path: &Path) -> Result<SourceDocument, LoadError> {
        if !path.exists() {
            return Err(LoadError::missing(path));
        }

        let bytes =
            std::fs::read(path).map_err(|e| LoadError::unparseable(path, e.to_string()))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| LoadError::unparseable(path, format!("invalid UTF-8: {}", e)))?;

        let root = self.parse_xmltv_content(&content, path)?;
        debug!(
            "Loaded {} ({} bytes, root <{}>)",
            path.display(),
            content.len(),
            root.name
        );

        Ok(SourceDocument::new(path.display().to_string(), root))
    }

    /// Load an input, recording a warning and returning None if it is skipped
    pub fn load_or_warn(&self, path: &Path, report: &mut MergeReport) -> Option<SourceDocument> {
        match self.load(path) {
            Ok(document) => {
                report.inputs_loaded += 1;
                Some(document)
            }
            Err(e) => {
                warn!("Skipping input: {}", e);
                report.inputs_skipped += 1;
                report.warn(match e {
                    LoadError::Missing { path } => MergeWarning::MissingInput { path },
                    LoadError::Unparseable { path, message } => {
                        MergeWarning::UnparseableInput { path, message }
                    }
                });
                None
            }
        }
    }

    fn parse_xmltv_content(
        &self,
        content: &str,
        path: &Path,
    ) -> Result<Element, LoadError> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        parse_document(content).map_err(|e| LoadError::unparseable(path, e.to_string()))
    }
}
