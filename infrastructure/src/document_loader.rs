use anyhow::{anyhow, bail, Context};
use docx_rs::{read_docx, DocumentChild, Table, TableCellContent, TableChild, TableRowChild};
use shared::types::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("pdf") => DocumentKind::Pdf,
            Some("docx") => DocumentKind::Docx,
            _ => DocumentKind::Text,
        }
    }
}

/// Extracts the plain text of an agreement or statute file.
pub fn load_text(path: &Path) -> Result<String> {
    let text = match DocumentKind::from_path(path) {
        DocumentKind::Pdf => pdf_extract::extract_text(path)
            .map_err(|e| anyhow!("failed to extract text from PDF '{}': {e}", path.display()))?,
        DocumentKind::Docx => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read DOCX '{}'", path.display()))?;
            docx_text(&bytes)
                .with_context(|| format!("failed to parse DOCX '{}'", path.display()))?
        }
        DocumentKind::Text => std::fs::read_to_string(path).with_context(|| {
            format!(
                "cannot read '{}' as text; supported formats are text files, PDF and DOCX",
                path.display()
            )
        })?,
    };
    Ok(text)
}

/// Like [`load_text`] but rejects files with no visible text.
pub fn load_document(path: &Path) -> Result<String> {
    let text = load_text(path)?;
    if text.trim().is_empty() {
        bail!("no text content found in '{}'", path.display());
    }
    Ok(text)
}

fn docx_text(bytes: &[u8]) -> Result<String> {
    let docx = read_docx(bytes).map_err(|e| anyhow!("{e:?}"))?;
    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                text.push_str(&p.raw_text());
                text.push('\n');
            }
            DocumentChild::Table(t) => push_table_text(t, &mut text),
            _ => {}
        }
    }
    Ok(text)
}

/// Cells become tab-separated, rows newline-separated.
#[allow(irrefutable_let_patterns)]
fn push_table_text(table: &Table, out: &mut String) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row else {
            continue;
        };
        let mut cells = Vec::new();
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            let mut cell_text = String::new();
            for content in &cell.children {
                if let TableCellContent::Paragraph(p) = content {
                    if !cell_text.is_empty() {
                        cell_text.push(' ');
                    }
                    cell_text.push_str(&p.raw_text());
                }
            }
            cells.push(cell_text);
        }
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
}
