//! Sound effects
//!
//! Effects are described as tones (frequency steps, waveform and a gain
//! envelope) and handed to an [`AudioBackend`]. The engines never talk to
//! an audio device directly.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Length of every effect
pub const EFFECT_DURATION: Duration = Duration::from_millis(300);

/// Time between frequency steps within an effect
pub const STEP_INTERVAL: Duration = Duration::from_millis(100);

const START_GAIN: f32 = 0.3;
const END_GAIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// Feedback sounds played by the games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Correct,
    Incorrect,
    Click,
    Success,
    Error,
    Achievement,
}

impl SoundEffect {
    /// Synthesis parameters for this effect
    pub fn tone(&self) -> Tone {
        let (frequencies, waveform): (&[f32], Waveform) = match self {
            SoundEffect::Correct => (&[523.0, 659.0, 784.0], Waveform::Triangle),
            SoundEffect::Incorrect => (&[220.0, 196.0], Waveform::Sine),
            SoundEffect::Click => (&[400.0], Waveform::Square),
            SoundEffect::Success => (&[800.0, 1000.0], Waveform::Sine),
            SoundEffect::Error => (&[400.0, 300.0], Waveform::Sine),
            SoundEffect::Achievement => (&[600.0, 800.0, 1000.0], Waveform::Sine),
        };
        Tone {
            frequencies: frequencies.to_vec(),
            waveform,
            duration: EFFECT_DURATION,
            start_gain: START_GAIN,
            end_gain: END_GAIN,
        }
    }
}

/// A short synthesized sound
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    /// Frequencies in Hz, each held for [`STEP_INTERVAL`]; the last one holds to the end
    pub frequencies: Vec<f32>,
    pub waveform: Waveform,
    pub duration: Duration,
    pub start_gain: f32,
    /// Gain reached at `duration` along an exponential ramp
    pub end_gain: f32,
}

impl Tone {
    /// Frequency sounding at `t`
    pub fn frequency_at(&self, t: Duration) -> f32 {
        let step = (t.as_millis() / STEP_INTERVAL.as_millis().max(1)) as usize;
        let last = self.frequencies.len().saturating_sub(1);
        self.frequencies.get(step.min(last)).copied().unwrap_or(0.0)
    }

    /// Envelope gain at `t`
    pub fn gain_at(&self, t: Duration) -> f32 {
        if t >= self.duration {
            return self.end_gain;
        }
        let progress = t.as_secs_f32() / self.duration.as_secs_f32();
        self.start_gain * (self.end_gain / self.start_gain).powf(progress)
    }
}

/// Something that can make a sound
pub trait AudioBackend: Send + Sync {
    fn play(&self, effect: SoundEffect, tone: &Tone);
}

impl<B: AudioBackend + ?Sized> AudioBackend for Arc<B> {
    fn play(&self, effect: SoundEffect, tone: &Tone) {
        (**self).play(effect, tone)
    }
}

/// Discards every sound
#[derive(Debug, Default)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn play(&self, _effect: SoundEffect, _tone: &Tone) {}
}

/// Rings the terminal bell for effects that need attention
#[derive(Debug, Default)]
pub struct BellBackend;

impl AudioBackend for BellBackend {
    fn play(&self, effect: SoundEffect, _tone: &Tone) {
        if matches!(effect, SoundEffect::Click) {
            return;
        }
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            tracing::debug!("terminal bell unavailable: {}", e);
        }
    }
}

/// Remembers the effects it was asked to play
#[derive(Debug, Default)]
pub struct RecordingBackend {
    played: Mutex<Vec<SoundEffect>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<SoundEffect> {
        self.played
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl AudioBackend for RecordingBackend {
    fn play(&self, effect: SoundEffect, _tone: &Tone) {
        if let Ok(mut played) = self.played.lock() {
            played.push(effect);
        }
    }
}

/// A backend with an on/off switch
pub struct SoundBoard {
    backend: Box<dyn AudioBackend>,
    enabled: bool,
}

impl SoundBoard {
    pub fn new(backend: impl AudioBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            enabled: true,
        }
    }

    pub fn silent() -> Self {
        Self::new(SilentBackend)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn play(&self, effect: SoundEffect) {
        if self.enabled {
            self.backend.play(effect, &effect.tone());
        }
    }
}

impl Default for SoundBoard {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for SoundBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundBoard")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_tone_steps() {
        let tone = SoundEffect::Correct.tone();
        assert_eq!(tone.waveform, Waveform::Triangle);
        assert_eq!(tone.frequency_at(Duration::ZERO), 523.0);
        assert_eq!(tone.frequency_at(Duration::from_millis(150)), 659.0);
        assert_eq!(tone.frequency_at(Duration::from_millis(250)), 784.0);
    }

    #[test]
    fn test_last_step_holds() {
        let tone = SoundEffect::Incorrect.tone();
        assert_eq!(tone.frequency_at(Duration::from_millis(290)), 196.0);
        assert_eq!(SoundEffect::Click.tone().frequency_at(Duration::from_millis(200)), 400.0);
    }

    #[test]
    fn test_gain_envelope() {
        let tone = SoundEffect::Achievement.tone();
        assert!((tone.gain_at(Duration::ZERO) - 0.3).abs() < 1e-6);
        assert!((tone.gain_at(EFFECT_DURATION) - 0.01).abs() < 1e-6);
        let mid = tone.gain_at(Duration::from_millis(150));
        assert!(mid < 0.3 && mid > 0.01);
    }

    #[test]
    fn test_disabled_board_is_quiet() {
        let recorder = Arc::new(RecordingBackend::new());
        let mut board = SoundBoard::new(recorder.clone());

        board.play(SoundEffect::Success);
        board.set_enabled(false);
        board.play(SoundEffect::Error);

        assert_eq!(recorder.played(), vec![SoundEffect::Success]);
    }
}
