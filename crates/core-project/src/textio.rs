//! Plain-text export and import of canvas content.
//!
//! Export writes the non-empty bounding box as UTF-8 lines padded with
//! spaces, trailing newline, no BOM. Import pastes a text file at a given
//! position, one line per row; spaces map to blank cells and therefore
//! never overwrite underlying content.

use std::path::Path;

use core_canvas::{Canvas, Color};

use crate::ProjectError;

/// Render the canvas bounding box as text. Empty canvas exports as an
/// empty string.
pub fn export_string(canvas: &Canvas) -> String {
    let Some((min_x, min_y, max_x, max_y)) = canvas.bounds() else {
        return String::new();
    };
    let mut out = String::new();
    for y in min_y..=max_y {
        let mut line = String::new();
        for x in min_x..=max_x {
            line.push(canvas.get(x, y).ch);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn export_to_file(canvas: &Canvas, path: &Path) -> Result<usize, ProjectError> {
    let content = export_string(canvas);
    let lines = content.lines().count();
    std::fs::write(path, content)?;
    tracing::info!(target: "io", file = %path.display(), lines, "canvas_exported");
    Ok(lines)
}

/// Write text into the canvas starting at `(x, y)`, one line per row,
/// advancing +x per character. Colors come from the caller (import applies
/// the active drawing colors). Returns the number of rows written.
pub fn import_string(canvas: &mut Canvas, x: i64, y: i64, text: &str, fg: Color, bg: Color) -> usize {
    let mut rows = 0;
    for (dy, line) in text.lines().enumerate() {
        canvas.write_text(x, y + dy as i64, line, fg, bg);
        rows = dy + 1;
    }
    rows
}

pub fn import_from_file(
    canvas: &mut Canvas,
    x: i64,
    y: i64,
    path: &Path,
    fg: Color,
    bg: Color,
) -> Result<usize, ProjectError> {
    let content = std::fs::read_to_string(path)?;
    let rows = import_string(canvas, x, y, &content, fg, bg);
    tracing::info!(target: "io", file = %path.display(), rows, "text_imported");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_canvas::Cell;

    #[test]
    fn export_covers_bounding_box() {
        let mut canvas = Canvas::new();
        canvas.set(3, 2, Cell::new('a'));
        canvas.set(5, 4, Cell::new('b'));
        let text = export_string(&canvas);
        assert_eq!(text, "a\n\n  b\n");
    }

    #[test]
    fn export_empty_canvas() {
        assert_eq!(export_string(&Canvas::new()), String::new());
    }

    #[test]
    fn import_then_export_round_trips() {
        let source = "hello\n  indented\nx\n";
        let mut canvas = Canvas::new();
        import_string(&mut canvas, 0, 0, source, Color::Default, Color::Default);
        assert_eq!(export_string(&canvas), source);
    }

    #[test]
    fn import_at_offset() {
        let mut canvas = Canvas::new();
        let rows = import_string(&mut canvas, 10, 20, "ab\ncd\n", Color::Default, Color::Default);
        assert_eq!(rows, 2);
        assert_eq!(canvas.get(10, 20).ch, 'a');
        assert_eq!(canvas.get(11, 21).ch, 'd');
    }

    #[test]
    fn import_spaces_do_not_erase() {
        let mut canvas = Canvas::new();
        canvas.set(1, 0, Cell::new('U'));
        import_string(&mut canvas, 0, 0, "a c\n", Color::Default, Color::Default);
        assert_eq!(canvas.get(0, 0).ch, 'a');
        assert_eq!(canvas.get(1, 0).ch, 'U');
        assert_eq!(canvas.get(2, 0).ch, 'c');
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.txt");
        let mut canvas = Canvas::new();
        canvas.write_text(0, 0, "box", Color::Default, Color::Default);
        export_to_file(&canvas, &path).unwrap();
        let mut restored = Canvas::new();
        import_from_file(&mut restored, 0, 0, &path, Color::Default, Color::Default).unwrap();
        assert_eq!(export_string(&restored), "box\n");
    }

    #[test]
    fn missing_import_file_is_io_error() {
        let mut canvas = Canvas::new();
        assert!(matches!(
            import_from_file(
                &mut canvas,
                0,
                0,
                Path::new("/no/such/file.txt"),
                Color::Default,
                Color::Default
            ),
            Err(ProjectError::Io(_))
        ));
    }
}
