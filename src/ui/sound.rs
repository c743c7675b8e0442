/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_puzzle: Arc<Vec<u8>>,
        sfx_key: Arc<Vec<u8>>,
        sfx_door: Arc<Vec<u8>>,
        sfx_hint: Arc<Vec<u8>>,
        sfx_wrong: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_timeout: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_puzzle: Arc::new(make_wav(&gen_chime())),
                sfx_key: Arc::new(make_wav(&gen_arpeggio(&[1047.0, 1319.0, 1568.0], 0.045))),
                sfx_door: Arc::new(make_wav(&gen_rumble())),
                sfx_hint: Arc::new(make_wav(&gen_sweep(900.0, 500.0, 0.18))),
                sfx_wrong: Arc::new(make_wav(&gen_buzz())),
                sfx_win: Arc::new(make_wav(&gen_fanfare())),
                sfx_timeout: Arc::new(make_wav(&gen_arpeggio(&[440.0, 370.0, 311.0, 261.0], 0.12))),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_puzzle_open(&self) { self.play(&self.sfx_puzzle); }
        pub fn play_key(&self) { self.play(&self.sfx_key); }
        pub fn play_door(&self) { self.play(&self.sfx_door); }
        pub fn play_hint(&self) { self.play(&self.sfx_hint); }
        pub fn play_wrong(&self) { self.play(&self.sfx_wrong); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
        pub fn play_timeout(&self) { self.play(&self.sfx_timeout); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (Vec<f32> mono samples)
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Notes played back to back, sine + 3rd harmonic for a retro edge.
    fn gen_arpeggio(notes: &[f32], note_dur: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = samples_for(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Puzzle opened: two soft bell tones.
    fn gen_chime() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[660.0_f32, 990.0] {
            let n = samples_for(0.12);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (-4.0 * i as f32 / n as f32).exp();
                samples.push((t * freq * TAU).sin() * env * 0.25);
            }
        }
        samples
    }

    /// Linear pitch sweep between two frequencies.
    fn gen_sweep(from: f32, to: f32, duration: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t).powf(0.6) * 0.25
            })
            .collect()
    }

    /// Door opening: low tone over noise, slow fade.
    fn gen_rumble() -> Vec<f32> {
        let n = samples_for(0.5);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * 80.0 * TAU).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.6 + noise * 0.4) * (1.0 - t) * 0.35
            })
            .collect()
    }

    /// Wrong answer: short square-ish buzz.
    fn gen_buzz() -> Vec<f32> {
        let n = samples_for(0.18);
        (0..n)
            .map(|i| {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let s = (ti * 140.0 * TAU).sin();
                let env = 1.0 - i as f32 / n as f32;
                s.signum() * env * 0.15
            })
            .collect()
    }

    /// Goal reached: ascending fanfare with a sustained top note.
    fn gen_fanfare() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[523.0_f32, 659.0, 784.0, 1047.0] {
            let n = samples_for(0.1);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * TAU).sin() * 0.6
                    + (t * freq * 2.0 * TAU).sin() * 0.3
                    + (t * freq * 3.0 * TAU).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        let n = samples_for(0.25);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((t * 1047.0 * TAU).sin() * env * 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let samples = gen_sweep(900.0, 500.0, 0.1);
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn generators_stay_in_range() {
            for s in [gen_chime(), gen_rumble(), gen_buzz(), gen_fanfare()] {
                assert!(!s.is_empty());
                assert!(s.iter().all(|v| v.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_puzzle_open(&self) {}
    pub fn play_key(&self) {}
    pub fn play_door(&self) {}
    pub fn play_hint(&self) {}
    pub fn play_wrong(&self) {}
    pub fn play_win(&self) {}
    pub fn play_timeout(&self) {}
}
