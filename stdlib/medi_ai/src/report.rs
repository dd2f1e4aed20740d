//! Downloadable result reports.
//!
//! [`render_report`] writes a small A4 PDF (Helvetica, WinAnsi encoding)
//! with the title, the requesting user, every input value and the diagnosis.
//! Text the PDF fonts cannot encode switches the whole report to a plain-text
//! document with the same content, so rendering itself never fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use medi_data::InputVector;

const PAGE_WIDTH: f64 = 595.276;
const PAGE_HEIGHT: f64 = 841.89;
const CM: f64 = 28.3465;
/// Characters per printed line.
const LINE_CHARS: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Pdf,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub bytes: Vec<u8>,
}

impl Report {
    pub fn file_extension(&self) -> &'static str {
        match self.kind {
            ReportKind::Pdf => "pdf",
            ReportKind::PlainText => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self.kind {
            ReportKind::Pdf => "application/pdf",
            ReportKind::PlainText => "text/plain; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("character {0:?} has no WinAnsi encoding")]
    Unencodable(char),
}

/// Render a report, falling back to plain text when the PDF cannot be built.
pub fn render_report(
    title: &str,
    requester: &str,
    inputs: &InputVector,
    diagnosis: &str,
) -> Report {
    let lines = input_lines(inputs);
    match render_pdf(title, requester, &lines, diagnosis) {
        Ok(bytes) => Report {
            kind: ReportKind::Pdf,
            bytes,
        },
        Err(e) => {
            log::warn!("pdf report unavailable ({e}); writing plain text");
            Report {
                kind: ReportKind::PlainText,
                bytes: plain_text(title, requester, &lines, diagnosis).into_bytes(),
            }
        }
    }
}

/// One `- name: value` line per input, values printed as entered.
fn input_lines(inputs: &InputVector) -> Vec<String> {
    inputs.entries().map(|(k, v)| format!("- {k}: {v}")).collect()
}

pub fn plain_text(title: &str, requester: &str, lines: &[String], diagnosis: &str) -> String {
    format!(
        "{title}\nUser: {requester}\n\nInputs:\n{}\n\nResult:\n{diagnosis}\n",
        lines.join("\n")
    )
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Lays text out top to bottom, starting a new page near the bottom margin.
struct Pages {
    done: Vec<Vec<u8>>,
    current: Vec<u8>,
    y: f64,
}

impl Pages {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - 2.0 * CM,
        }
    }

    fn text(&mut self, font: Font, size: f64, x: f64, s: &str) -> Result<(), RenderError> {
        self.current.extend_from_slice(
            format!("BT /{} {} Tf {:.2} {:.2} Td (", font.resource(), size, x, self.y).as_bytes(),
        );
        encode_text(s, &mut self.current)?;
        self.current.extend_from_slice(b") Tj ET\n");
        Ok(())
    }

    fn down(&mut self, dy: f64) {
        self.y -= dy;
    }

    fn break_if_low(&mut self) {
        if self.y < 3.0 * CM {
            self.done.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - 2.0 * CM;
        }
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        if !self.current.is_empty() || self.done.is_empty() {
            self.done.push(self.current);
        }
        self.done
    }
}

/// Append `s` as the body of a PDF literal string in WinAnsi encoding.
fn encode_text(s: &str, out: &mut Vec<u8>) -> Result<(), RenderError> {
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            ' '..='~' => out.push(c as u8),
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            _ => return Err(RenderError::Unencodable(c)),
        }
    }
    Ok(())
}

fn chunks(s: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

pub fn render_pdf(
    title: &str,
    requester: &str,
    lines: &[String],
    diagnosis: &str,
) -> Result<Vec<u8>, RenderError> {
    let mut pages = Pages::new();
    pages.text(Font::Bold, 16.0, 2.0 * CM, title)?;
    pages.down(1.0 * CM);
    pages.text(Font::Regular, 11.0, 2.0 * CM, &format!("User: {requester}"))?;
    pages.down(0.7 * CM);
    pages.text(Font::Regular, 11.0, 2.0 * CM, "Inputs:")?;
    pages.down(0.6 * CM);
    for line in lines {
        pages.text(Font::Regular, 11.0, 2.5 * CM, &truncate(line, LINE_CHARS))?;
        pages.down(0.5 * CM);
        pages.break_if_low();
    }
    pages.down(0.3 * CM);
    pages.text(Font::Bold, 12.0, 2.0 * CM, "Result:")?;
    pages.down(0.6 * CM);
    for segment in chunks(diagnosis, LINE_CHARS) {
        pages.text(Font::Regular, 11.0, 2.5 * CM, &segment)?;
        pages.down(0.5 * CM);
        pages.break_if_low();
    }
    Ok(assemble(&pages.finish()))
}

/// Serialize page content streams into a complete PDF file.
fn assemble(streams: &[Vec<u8>]) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3-4 fonts, then a page and its content per page
    let first_page = 5;
    let kids: Vec<String> = (0..streams.len())
        .map(|i| format!("{} 0 R", first_page + 2 * i))
        .collect();

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            streams.len()
        )
        .into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    ];
    for (i, stream) in streams.iter().enumerate() {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.2} {PAGE_HEIGHT:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                first_page + 2 * i + 1
            )
            .into_bytes(),
        );
        let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend_from_slice(stream);
        content.extend_from_slice(b"\nendstream");
        objects.push(content);
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }
    let xref = out.len();
    let header = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    out.extend_from_slice(header.as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}
