use serde::{Deserialize, Serialize};

/// Finalized speech-to-text segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalTranscript {
    pub text: String,
    /// Engine confidence, clamped to 0..=1.
    pub confidence: f32,
}

impl FinalTranscript {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Listening,
    Stopped,
}

/// Accumulates one recording session.
///
/// Finalized segments are kept in order; interim text is replaced on every
/// update and dropped on `stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSession {
    state: SessionState,
    finalized: Vec<FinalTranscript>,
    interim: Option<String>,
}

impl Default for TranscriptSession {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            finalized: Vec::new(),
            interim: None,
        }
    }
}

impl TranscriptSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Starts (or restarts) listening. Earlier finalized text is kept.
    pub fn start(&mut self) {
        self.state = SessionState::Listening;
        self.interim = None;
    }

    /// Ignored unless listening.
    pub fn push_interim(&mut self, text: &str) {
        if self.state == SessionState::Listening {
            self.interim = Some(text.to_string()).filter(|t| !t.trim().is_empty());
        }
    }

    /// Ignored unless listening. A final segment supersedes the interim text.
    pub fn push_final(&mut self, segment: FinalTranscript) {
        if self.state != SessionState::Listening {
            tracing::debug!("Dropping final transcript outside of a listening session");
            return;
        }
        self.interim = None;
        if !segment.text.trim().is_empty() {
            self.finalized.push(segment);
        }
    }

    /// Stops listening and returns the finalized text.
    pub fn stop(&mut self) -> String {
        self.state = SessionState::Stopped;
        self.interim = None;
        self.final_text()
    }

    pub fn final_text(&self) -> String {
        self.finalized
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text to show while recording: finalized plus current interim.
    pub fn display_text(&self) -> String {
        match &self.interim {
            Some(interim) if self.finalized.is_empty() => interim.trim().to_string(),
            Some(interim) => format!("{} {}", self.final_text(), interim.trim()),
            None => self.final_text(),
        }
    }

    /// Mean confidence of the finalized segments; 0 when empty.
    pub fn confidence(&self) -> f32 {
        if self.finalized.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.finalized.iter().map(|s| s.confidence).sum();
        sum / self.finalized.len() as f32
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
