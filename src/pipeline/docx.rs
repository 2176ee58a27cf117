//! DOCX text extraction via `docx-rs`.
//!
//! Produces the raw-text rendering of the document body: every paragraph,
//! including those inside table cells, contributes its run text followed by
//! a blank line. Tabs and line breaks inside runs are kept. The output is
//! returned as-is, without trimming.

use crate::error::ExtractionError;
use docx_rs::{
    read_docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};

/// Decode a DOCX archive to plain text.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = read_docx(bytes).map_err(|e| ExtractionError::Parse(format!("invalid DOCX: {e}")))?;

    let mut out = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => push_paragraph(&mut out, p),
            DocumentChild::Table(t) => push_table(&mut out, t),
            _ => {}
        }
    }
    Ok(out)
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    for child in &paragraph.children {
        push_paragraph_child(out, child);
    }
    out.push_str("\n\n");
}

fn push_paragraph_child(out: &mut String, child: &ParagraphChild) {
    match child {
        ParagraphChild::Run(run) => push_run(out, run),
        ParagraphChild::Hyperlink(link) => {
            for c in &link.children {
                push_paragraph_child(out, c);
            }
        }
        _ => {}
    }
}

fn push_run(out: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

fn push_table(out: &mut String, table: &Table) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => push_paragraph(out, p),
                    TableCellContent::Table(t) => push_table(out, t),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, TableCell, TableRow};
    use std::io::Cursor;

    fn pack(docx: Docx) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let bytes = pack(
            Docx::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Jane Doe")))
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Rust engineer"))),
        );
        let text = extract_docx_text(&bytes).unwrap();
        assert!(text.starts_with("Jane Doe\n\n"), "got: {text:?}");
        assert!(text.contains("Rust engineer"), "got: {text:?}");
        assert!(text.ends_with("\n\n"), "output must not be trimmed: {text:?}");
    }

    #[test]
    fn table_cells_are_included() {
        let table = Table::new(vec![TableRow::new(vec![
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Skills"))),
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("Tokio"))),
        ])]);
        let bytes = pack(Docx::new().add_table(table));
        let text = extract_docx_text(&bytes).unwrap();
        assert!(text.contains("Skills"), "got: {text:?}");
        assert!(text.contains("Tokio"), "got: {text:?}");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = extract_docx_text(b"not a zip archive").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)), "got {err:?}");
    }
}
