//! Advanced SubStation Alpha document.
//!
//! A document is split into two parts: the header (every section before
//! `[Events]`, kept as raw text) and the event lines. Only `Dialogue:` lines
//! are interpreted, and only far enough to separate the caption text from
//! the timing/style columns in front of it.

use burnsub_common::error::{BurnsubError, BurnsubResult};

/// Column layout used when a script has no `Format:` line in `[Events]`.
pub const DEFAULT_EVENT_FORMAT: &str =
    "Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Header installed when a script has no `[Script Info]` section.
pub const DEFAULT_HEADER: &str = "[Script Info]
; Script generated by burnsub
Title: untitled
ScriptType: v4.00+
PlayDepth: 0
ScaledBorderAndShadow: Yes

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,20,&H00FFFFFF,&H0000FFFF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1";

/// A parsed subtitle script.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtitle {
    /// Raw header text (`[Script Info]`, styles, fonts, ...).
    pub header: String,

    /// Column names from the `[Events]` `Format:` line.
    pub event_format: Vec<String>,

    /// Event lines in document order.
    pub events: Vec<EventLine>,
}

/// One line from the `[Events]` section.
#[derive(Debug, Clone, PartialEq)]
pub enum EventLine {
    /// A displayed caption.
    Dialogue(Dialogue),
    /// Anything else (`Comment:`, blank lines, unknown keys), kept verbatim.
    Other(String),
}

/// A `Dialogue:` event.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialogue {
    /// Every column before the text, still comma-joined.
    pub columns: String,

    /// Caption text. May contain commas and override tags.
    pub text: String,
}

impl Dialogue {
    /// Style column, when the event format names one.
    pub fn style<'a>(&'a self, event_format: &[String]) -> Option<&'a str> {
        let index = event_format
            .iter()
            .position(|c| c.eq_ignore_ascii_case("style"))?;
        self.columns.split(',').nth(index).map(str::trim)
    }
}

impl Subtitle {
    /// Parse an `.ass` script.
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut header_lines = Vec::new();
        let mut event_format: Vec<String> = split_format(DEFAULT_EVENT_FORMAT);
        let mut events = Vec::new();
        let mut in_events = false;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') {
                in_events = trimmed.eq_ignore_ascii_case("[events]");
                if in_events {
                    continue;
                }
            }

            if !in_events {
                header_lines.push(line);
                continue;
            }

            if let Some(format) = strip_key(trimmed, "format") {
                event_format = split_format(format);
            } else if let Some(body) = strip_key(trimmed, "dialogue") {
                let column_count = event_format.len().max(1);
                let mut parts: Vec<&str> = body.splitn(column_count, ',').collect();
                let text = if parts.len() == column_count {
                    parts.pop().unwrap_or_default().to_string()
                } else {
                    String::new()
                };
                events.push(EventLine::Dialogue(Dialogue {
                    columns: parts.join(","),
                    text,
                }));
            } else if !trimmed.is_empty() {
                events.push(EventLine::Other(line.to_string()));
            }
        }

        Self {
            header: header_lines.join("\n").trim_end().to_string(),
            event_format,
            events,
        }
    }

    /// Serialize back to `.ass` text.
    pub fn to_ass(&self) -> String {
        let mut output = String::new();
        output.push_str(self.header.trim_end());
        output.push_str("\n\n[Events]\n");
        output.push_str("Format: ");
        output.push_str(&self.event_format.join(", "));
        output.push('\n');

        for event in &self.events {
            match event {
                EventLine::Dialogue(dialogue) => {
                    output.push_str("Dialogue: ");
                    if !dialogue.columns.is_empty() {
                        output.push_str(&dialogue.columns);
                        output.push(',');
                    }
                    output.push_str(&dialogue.text);
                }
                EventLine::Other(raw) => output.push_str(raw),
            }
            output.push('\n');
        }

        output
    }

    /// Iterate over dialogue events.
    pub fn dialogues(&self) -> impl Iterator<Item = &Dialogue> {
        self.events.iter().filter_map(|e| match e {
            EventLine::Dialogue(d) => Some(d),
            EventLine::Other(_) => None,
        })
    }

    /// Iterate mutably over dialogue events.
    pub fn dialogues_mut(&mut self) -> impl Iterator<Item = &mut Dialogue> {
        self.events.iter_mut().filter_map(|e| match e {
            EventLine::Dialogue(d) => Some(d),
            EventLine::Other(_) => None,
        })
    }

    /// Whether the header carries a `[Script Info]` section.
    pub fn has_script_info(&self) -> bool {
        self.header
            .lines()
            .any(|l| l.trim().eq_ignore_ascii_case("[script info]"))
    }

    /// Install the default header if the script has none a renderer can read.
    pub fn ensure_header(&mut self) {
        if !self.has_script_info() {
            tracing::debug!("Subtitle has no [Script Info]; using default header");
            self.header = DEFAULT_HEADER.to_string();
        }
    }

    /// Rewrite the `Fontsize` column of a style in `[V4+ Styles]`.
    ///
    /// Fails when the styles section, its `Format:` line, or the style itself
    /// is missing.
    pub fn set_style_font_size(&mut self, style_name: &str, font_size: u32) -> BurnsubResult<()> {
        let mut in_styles = false;
        let mut fontsize_index: Option<usize> = None;
        let mut replaced = false;
        let mut lines: Vec<String> = Vec::new();

        for line in self.header.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') {
                in_styles = trimmed.eq_ignore_ascii_case("[v4+ styles]")
                    || trimmed.eq_ignore_ascii_case("[v4 styles]");
            } else if in_styles {
                if let Some(format) = strip_key(trimmed, "format") {
                    fontsize_index = split_format(format)
                        .iter()
                        .position(|c| c.eq_ignore_ascii_case("fontsize"));
                } else if let (Some(body), Some(index)) = (strip_key(trimmed, "style"), fontsize_index) {
                    let mut fields: Vec<String> =
                        body.split(',').map(|f| f.trim().to_string()).collect();
                    let name_matches = fields.first().is_some_and(|n| n == style_name);
                    if name_matches && index < fields.len() {
                        fields[index] = font_size.to_string();
                        lines.push(format!("Style: {}", fields.join(",")));
                        replaced = true;
                        continue;
                    }
                }
            }
            lines.push(line.to_string());
        }

        if fontsize_index.is_none() {
            return Err(BurnsubError::subtitle(
                "No [V4+ Styles] Format line with a Fontsize column",
            ));
        }
        if !replaced {
            return Err(BurnsubError::subtitle(format!(
                "Style '{style_name}' not found in [V4+ Styles]"
            )));
        }

        self.header = lines.join("\n");
        Ok(())
    }
}

/// Strip a case-insensitive `key:` prefix, returning the trimmed remainder.
fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (head, rest) = line.split_once(':')?;
    head.trim()
        .eq_ignore_ascii_case(key)
        .then(|| rest.trim_start())
}

fn split_format(format: &str) -> Vec<String> {
    format.split(',').map(|c| c.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[Script Info]
Title: sample
ScriptType: v4.00+

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,20,&H00FFFFFF,&H0000FFFF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1
Style: Sign,Arial,32,&H00FFFFFF,&H0000FFFF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,8,10,10,10,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,Hello, world
Comment: 0,0:00:03.00,0:00:04.00,Default,,0,0,0,,note to self
Dialogue: 0,0:00:04.00,0:00:06.00,Sign,,0,0,0,,{\\an8}Line one\\NLine two
";

    #[test]
    fn test_parse_splits_header_and_events() {
        let sub = Subtitle::parse(SAMPLE);
        assert!(sub.header.starts_with("[Script Info]"));
        assert!(!sub.header.contains("[Events]"));
        assert_eq!(sub.event_format.len(), 10);
        assert_eq!(sub.events.len(), 3);

        let dialogues: Vec<_> = sub.dialogues().collect();
        assert_eq!(dialogues.len(), 2);
        assert_eq!(dialogues[0].text, "Hello, world");
        assert_eq!(dialogues[0].style(&sub.event_format), Some("Default"));
        assert_eq!(dialogues[1].text, "{\\an8}Line one\\NLine two");
    }

    #[test]
    fn test_serialize_preserves_events() {
        let sub = Subtitle::parse(SAMPLE);
        let text = sub.to_ass();
        assert!(text.contains("\n[Events]\nFormat: Layer, Start, End, Style"));
        assert!(text.contains("Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,Hello, world\n"));
        assert!(text.contains("Comment: 0,0:00:03.00"));

        let reparsed = Subtitle::parse(&text);
        assert_eq!(reparsed, sub);
    }

    #[test]
    fn test_set_style_font_size_only_touches_named_style() {
        let mut sub = Subtitle::parse(SAMPLE);
        sub.set_style_font_size("Default", 48).unwrap();
        assert!(sub.header.contains("Style: Default,Arial,48,&H00FFFFFF"));
        assert!(sub.header.contains("Style: Sign,Arial,32,"));
    }

    #[test]
    fn test_set_style_font_size_missing_style_is_error() {
        let mut sub = Subtitle::parse(SAMPLE);
        let err = sub.set_style_font_size("Karaoke", 30).unwrap_err();
        assert!(err.to_string().contains("Karaoke"));
    }

    #[test]
    fn test_set_style_font_size_without_styles_section_is_error() {
        let mut sub = Subtitle::parse("[Script Info]\nTitle: x\n");
        assert!(sub.set_style_font_size("Default", 30).is_err());
    }

    #[test]
    fn test_ensure_header_installs_default() {
        let mut sub = Subtitle::parse("[Events]\nDialogue: 0,0:00:00.00,0:00:01.00,Default,,0,0,0,,hi\n");
        assert!(!sub.has_script_info());
        sub.ensure_header();
        assert!(sub.has_script_info());
        sub.set_style_font_size("Default", 40).unwrap();
        assert!(sub.header.contains("Style: Default,Arial,40,"));
    }

    #[test]
    fn test_ensure_header_keeps_existing() {
        let mut sub = Subtitle::parse(SAMPLE);
        let before = sub.header.clone();
        sub.ensure_header();
        assert_eq!(sub.header, before);
    }

    #[test]
    fn test_parse_strips_bom() {
        let sub = Subtitle::parse("\u{feff}[Script Info]\nTitle: bom\n");
        assert!(sub.has_script_info());
    }
}
