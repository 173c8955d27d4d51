//! File export: the current text view as a downloadable payload.

use crate::sync::{Notation, SyncError, render_text};
use td_core::SchemaDoc;

/// A downloadable blob: filename, MIME type, and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: String,
    pub mime: &'static str,
    pub content: String,
}

/// Render the document in the given notation as `schema.<ext>`.
pub fn export_schema(doc: &SchemaDoc, notation: Notation) -> Result<ExportPayload, SyncError> {
    let content = render_text(doc, notation)?;
    let mime = match notation {
        Notation::Json => "application/json",
        _ => "text/plain",
    };
    Ok(ExportPayload {
        filename: format!("schema.{}", notation.extension()),
        mime,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::model::Table;

    fn doc() -> SchemaDoc {
        let mut doc = SchemaDoc::new();
        doc.add_table(Table::starter("users", 0.0, 0.0));
        doc
    }

    #[test]
    fn filename_tracks_notation() {
        let doc = doc();
        let cases = [
            (Notation::Dbml, "schema.dbml", "text/plain"),
            (Notation::Json, "schema.json", "application/json"),
            (Notation::Mermaid, "schema.mmd", "text/plain"),
            (Notation::Sql, "schema.sql", "text/plain"),
        ];
        for (notation, filename, mime) in cases {
            let payload = export_schema(&doc, notation).unwrap();
            assert_eq!(payload.filename, filename);
            assert_eq!(payload.mime, mime);
            assert!(!payload.content.is_empty());
        }
    }
}
