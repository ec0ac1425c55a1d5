//! Narration of game text

use console::style;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Voice parameters passed to speech engines
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            lang: "es-ES".to_string(),
            rate: 1.0,
            pitch: 1.1,
            volume: 0.8,
        }
    }
}

impl VoiceSettings {
    /// Slower delivery used for puzzle narration
    pub fn calm() -> Self {
        Self {
            rate: 0.8,
            pitch: 1.0,
            volume: 1.0,
            ..Self::default()
        }
    }
}

/// Text-to-speech abstraction
pub trait Narrator: Send + Sync {
    /// Start reading `text`, interrupting anything already being read
    fn speak(&self, text: &str);

    /// Stop reading
    fn stop(&self);

    fn is_speaking(&self) -> bool;
}

impl<N: Narrator + ?Sized> Narrator for Arc<N> {
    fn speak(&self, text: &str) {
        (**self).speak(text)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn is_speaking(&self) -> bool {
        (**self).is_speaking()
    }
}

/// Narrator that says nothing
#[derive(Debug, Default)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn speak(&self, _text: &str) {}

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Prints narration to stderr
#[derive(Debug, Default)]
pub struct ConsoleNarrator {
    voice: VoiceSettings,
    speaking: AtomicBool,
}

impl ConsoleNarrator {
    pub fn new(voice: VoiceSettings) -> Self {
        Self {
            voice,
            speaking: AtomicBool::new(false),
        }
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }
}

impl Narrator for ConsoleNarrator {
    fn speak(&self, text: &str) {
        self.speaking.store(true, Ordering::SeqCst);
        eprintln!("{} {}", style("🔊").dim(), style(text).italic());
    }

    fn stop(&self) {
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// What a [`RecordingNarrator`] was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarratorEvent {
    Spoke(String),
    Stopped,
}

/// Narrator that remembers every call
#[derive(Debug, Default)]
pub struct RecordingNarrator {
    events: Mutex<Vec<NarratorEvent>>,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NarratorEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Texts spoken so far
    pub fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NarratorEvent::Spoke(text) => Some(text),
                NarratorEvent::Stopped => None,
            })
            .collect()
    }

    fn push(&self, event: NarratorEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Narrator for RecordingNarrator {
    fn speak(&self, text: &str) {
        self.push(NarratorEvent::Spoke(text.to_string()));
    }

    fn stop(&self) {
        self.push(NarratorEvent::Stopped);
    }

    fn is_speaking(&self) -> bool {
        matches!(self.events().last(), Some(NarratorEvent::Spoke(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_narrator_tracks_state() {
        let narrator = RecordingNarrator::new();
        assert!(!narrator.is_speaking());

        narrator.speak("hola");
        assert!(narrator.is_speaking());
        narrator.stop();
        assert!(!narrator.is_speaking());
        assert_eq!(narrator.spoken(), vec!["hola"]);
    }

    #[test]
    fn test_voice_presets() {
        assert_eq!(VoiceSettings::default().lang, "es-ES");
        assert_eq!(VoiceSettings::calm().rate, 0.8);
    }
}
