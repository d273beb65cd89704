//! Reply rendering: content parts to terminal text.

use std::io::{self, Write};

use crate::model::ContentPart;

/// Writes each part in order, then one line break.
///
/// Text is written verbatim with nothing inserted between parts; image references
/// become `<image from ID: {id}>`; unknown parts produce no output.
pub fn render_content<W: Write + ?Sized>(parts: &[ContentPart], out: &mut W) -> io::Result<()> {
    for part in parts {
        match part {
            ContentPart::Text { text } => out.write_all(text.as_bytes())?,
            ContentPart::ImageReference { file_id } => {
                write!(out, "<image from ID: {}>", file_id)?
            }
            ContentPart::Unknown => {}
        }
    }
    writeln!(out)?;
    out.flush()
}

pub fn render_to_string(parts: &[ContentPart]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = render_content(parts, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
