//! Writer detection from output file names.

use std::path::Path;

/// Writer used when nothing else determines one.
pub const DEFAULT_WRITER: &str = "html";

/// Writers whose output is binary and cannot be post-processed as text.
pub const BINARY_WRITERS: [&str; 4] = ["odt", "docx", "epub", "epub3"];

/// Output extension to writer name.
const WRITER_BY_EXTENSION: &[(&str, &str)] = &[
    ("", "markdown"),
    ("tex", "latex"),
    ("latex", "latex"),
    ("ltx", "latex"),
    ("context", "context"),
    ("ctx", "context"),
    ("rtf", "rtf"),
    ("rst", "rst"),
    ("s5", "s5"),
    ("native", "native"),
    ("json", "json"),
    ("txt", "markdown"),
    ("text", "markdown"),
    ("md", "markdown"),
    ("markdown", "markdown"),
    ("textile", "textile"),
    ("lhs", "markdown+lhs"),
    ("texi", "texinfo"),
    ("texinfo", "texinfo"),
    ("db", "docbook"),
    ("odt", "odt"),
    ("docx", "docx"),
    ("epub", "epub"),
    ("org", "org"),
    ("asciidoc", "asciidoc"),
    ("pdf", "latex"),
    ("fb2", "fb2"),
    ("opml", "opml"),
];

/// Detect the writer implied by an output file name.
///
/// Returns `None` for extensions the engine does not recognise.
///
/// # Example
/// ```
/// use panstyle::detect::writer_for_output;
///
/// assert_eq!(writer_for_output("paper.tex"), Some("latex"));
/// assert_eq!(writer_for_output("manual.3"), Some("man"));
/// assert_eq!(writer_for_output("photo.jpeg"), None);
/// ```
pub fn writer_for_output<P: AsRef<Path>>(output: P) -> Option<&'static str> {
    let ext = extension(output.as_ref());
    if ext.len() == 1 && matches!(ext.as_bytes()[0], b'1'..=b'9') {
        return Some("man");
    }
    WRITER_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, writer)| *writer)
}

/// Check whether a writer produces binary output.
pub fn is_binary_writer(writer: &str) -> bool {
    BINARY_WRITERS.contains(&writer)
}

/// Check whether an output file name asks for PDF.
pub fn is_pdf_output<P: AsRef<Path>>(output: P) -> bool {
    extension(output.as_ref()) == "pdf"
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
