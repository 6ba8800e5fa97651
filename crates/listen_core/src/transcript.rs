/// Start and end of a transcribed segment, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub start: f64,
    pub end: f64,
}

/// One incremental result from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptUpdate {
    pub text: String,
    pub is_final: bool,
    pub speech_final: bool,
    pub utterance_end: bool,
    pub timing: Option<Timing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Final,
    Interim,
    UtteranceEnd,
    UrlInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

/// Running transcript: a log of every update plus the assembled final text,
/// where a single trailing interim segment is replaced by each new interim
/// result and dropped once a final one arrives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranscriptFeed {
    lines: Vec<TranscriptLine>,
    finals: Vec<String>,
    interim: Option<String>,
}

impl TranscriptFeed {
    pub fn apply(&mut self, update: &TranscriptUpdate) {
        let (kind, tag) = if update.is_final {
            (LineKind::Final, "[Is Final]")
        } else if update.utterance_end {
            (LineKind::UtteranceEnd, "[Utterance End]")
        } else {
            (LineKind::Interim, "[Interim Result]")
        };

        let text = match (&update.timing, kind) {
            (Some(timing), LineKind::Final | LineKind::Interim) => format!(
                "{:.2}-{:.2}   {tag} {}",
                timing.start, timing.end, update.text
            ),
            _ if update.text.is_empty() => tag.to_string(),
            _ => format!("{tag} {}", update.text),
        };
        self.lines.push(TranscriptLine { kind, text });

        match kind {
            LineKind::Final => {
                self.interim = None;
                self.finals.push(update.text.clone());
            }
            LineKind::Interim => self.interim = Some(update.text.clone()),
            LineKind::UtteranceEnd | LineKind::UrlInfo => {}
        }
    }

    pub fn push_url_info(&mut self, text: impl Into<String>) {
        self.lines.push(TranscriptLine {
            kind: LineKind::UrlInfo,
            text: text.into(),
        });
    }

    /// Appends a complete transcript, such as a batch upload result.
    pub fn push_final_text(&mut self, text: impl Into<String>) {
        self.interim = None;
        self.finals.push(text.into());
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn final_text(&self) -> String {
        let mut parts: Vec<&str> = self.finals.iter().map(String::as_str).collect();
        if let Some(interim) = &self.interim {
            parts.push(interim);
        }
        parts.join(" ")
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
