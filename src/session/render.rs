use crate::classify::{BinKind, ClassificationResult, LabeledImage};
use crate::materializer::PreviewInfo;
use crate::view::{ViewMode, ViewState};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

/// Turns a view state into lines of terminal text
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    last_frame: Vec<String>,
    headless: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps frames in memory instead of drawing them
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Self::default()
        }
    }

    /// The most recently drawn frame
    pub fn last_frame(&self) -> &[String] {
        &self.last_frame
    }

    /// Plain-text rendering of the view
    pub fn render(&self, view: &ViewState) -> Vec<String> {
        let mut lines = Vec::new();

        match view.mode {
            ViewMode::NoImage => {
                lines.push("Choose an image source:".to_string());
                lines.push("  [o] open an image file   [c] use the camera".to_string());
            }
            ViewMode::CameraActive => {
                lines.push("Camera is live.".to_string());
                lines.push("  [space] capture photo   [x] cancel".to_string());
            }
            _ => {}
        }

        if let Some(preview) = &view.preview {
            lines.push(preview_line(preview));
            if view.analyze_enabled() {
                lines.push("  [a] analyze   [d] clear".to_string());
            } else {
                lines.push("  [d] clear".to_string());
            }
        }

        match view.mode {
            ViewMode::Loading => {
                lines.push(String::new());
                lines.push("Analyzing...".to_string());
            }
            ViewMode::ResultReady => {
                if let Some(result) = &view.result {
                    lines.push(String::new());
                    lines.extend(result_lines(result));
                }
            }
            ViewMode::ErrorState => {
                if let Some(error) = &view.error {
                    lines.push(String::new());
                    lines.push(format!("Error: {}", error));
                }
            }
            _ => {}
        }

        if let Some(notice) = &view.capture_notice {
            lines.push(String::new());
            lines.push(format!("Camera unavailable: {}", notice));
        }

        lines
    }

    /// Redraw the terminal; skipped when nothing changed
    pub fn draw(
        &mut self,
        view: &ViewState,
        prompt: Option<&str>,
        status: Option<&str>,
    ) -> io::Result<()> {
        let mut frame = vec!["Trash Sight".to_string(), "-----------".to_string()];
        frame.extend(self.render(view));
        if let Some(status) = status {
            frame.push(String::new());
            frame.push(status.to_string());
        }
        if let Some(prompt) = prompt {
            frame.push(String::new());
            frame.push(format!("Image path: {}", prompt));
        }
        frame.push(String::new());
        frame.push("[q] quit".to_string());

        if frame == self.last_frame {
            return Ok(());
        }
        if self.headless {
            self.last_frame = frame;
            return Ok(());
        }

        let mut stdout = io::stdout();
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        // Raw mode needs explicit carriage returns
        write!(stdout, "{}\r\n", frame.join("\r\n"))?;
        stdout.flush()?;

        self.last_frame = frame;
        Ok(())
    }
}

fn preview_line(preview: &PreviewInfo) -> String {
    let mut line = format!(
        "Image: {} ({}, {}",
        preview.file_name,
        preview.mime_type,
        human_size(preview.byte_len)
    );
    if let Some((width, height)) = preview.dimensions {
        line.push_str(&format!(", {}x{}", width, height));
    }
    line.push(')');
    line
}

fn result_lines(result: &ClassificationResult) -> Vec<String> {
    let mut lines = vec![
        "Analysis Results".to_string(),
        format!("  Detected Object: {}", title_case(&result.detected_object)),
        format!("  Disposal Bin: {}", title_case(&result.disposal_bin)),
    ];

    if let Some(guidance) = BinKind::from_label(&result.disposal_bin).guidance() {
        lines.push(format!("    {}", guidance));
    }

    if let Some(uri) = &result.labeled_image {
        lines.push("Labeled Image".to_string());
        match LabeledImage::from_data_uri(uri) {
            Some(image) => lines.push(format!(
                "  {}, {}",
                image.mime_type,
                human_size(image.bytes.len())
            )),
            None => lines.push(format!("  {}", uri)),
        }
    }

    lines
}

/// Capitalise the first letter of every word
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{} B", bytes)
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{:.1} MiB", bytes_f / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materializer::PreviewId;

    fn view(mode: ViewMode) -> ViewState {
        ViewState {
            mode,
            preview: Some(PreviewInfo {
                id: PreviewId(1),
                file_name: "bottle.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                byte_len: 2048,
                dimensions: Some((640, 480)),
            }),
            result: None,
            error: None,
            capture_notice: None,
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("plastic bottle"), "Plastic Bottle");
        assert_eq!(title_case("  yellow  "), "Yellow");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_preview_line() {
        let lines = TerminalRenderer::new().render(&view(ViewMode::ImageReady));
        assert_eq!(lines[0], "Image: bottle.jpg (image/jpeg, 2.0 KiB, 640x480)");
        assert!(lines[1].contains("[a] analyze"));
    }

    #[test]
    fn test_loading_hides_analyze() {
        let lines = TerminalRenderer::new().render(&view(ViewMode::Loading));
        assert!(lines.iter().any(|line| line == "Analyzing..."));
        assert!(!lines.iter().any(|line| line.contains("[a] analyze")));
    }

    #[test]
    fn test_labeled_image_section() {
        let mut state = view(ViewMode::ResultReady);
        state.result = Some(ClassificationResult {
            detected_object: "coffee cup".to_string(),
            disposal_bin: "purple".to_string(),
            labeled_image: Some("data:image/png;base64,AQIDBA==".to_string()),
        });

        let lines = TerminalRenderer::new().render(&state);
        assert!(lines.contains(&"  Detected Object: Coffee Cup".to_string()));
        assert!(lines.contains(&"    Coffee and mugs".to_string()));
        assert!(lines.contains(&"Labeled Image".to_string()));
        assert!(lines.contains(&"  image/png, 4 B".to_string()));
    }

    #[test]
    fn test_error_text() {
        let mut state = view(ViewMode::ErrorState);
        state.error = Some("No image provided".to_string());

        let lines = TerminalRenderer::new().render(&state);
        assert_eq!(lines.last().unwrap(), "Error: No image provided");
    }

    #[test]
    fn test_capture_notice_under_preview() {
        let mut state = view(ViewMode::ImageReady);
        state.capture_notice = Some("Camera permission denied for mock-camera".to_string());

        let lines = TerminalRenderer::new().render(&state);
        assert_eq!(lines[0], "Image: bottle.jpg (image/jpeg, 2.0 KiB, 640x480)");
        assert_eq!(
            lines.last().unwrap(),
            "Camera unavailable: Camera permission denied for mock-camera"
        );
    }

    #[test]
    fn test_capture_notice() {
        let state = ViewState {
            mode: ViewMode::NoImage,
            preview: None,
            result: None,
            error: None,
            capture_notice: Some("No camera device available: /dev/video0".to_string()),
        };

        let lines = TerminalRenderer::new().render(&state);
        assert_eq!(
            lines.last().unwrap(),
            "Camera unavailable: No camera device available: /dev/video0"
        );
    }
}
