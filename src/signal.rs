//! Stereo sine generation for the sender.
//!
//! Blocks are generated from their index alone, so any block can be
//! regenerated bit-for-bit and consecutive blocks join without a phase jump.

use std::f64::consts::PI;

/// Parameters of the generated tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineParams {
    /// Tone frequency in Hz
    pub frequency: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Peak amplitude as a fraction of full scale
    pub amplitude: f32,
}

impl SineParams {
    /// Phase advance per sample pair, in radians
    pub fn phase_step(&self) -> f64 {
        2.0 * PI * self.frequency / f64::from(self.sample_rate)
    }
}

/// Fill `samples` with block `block_index` of an interleaved stereo sine.
///
/// The left channel carries `amplitude * sin(step * t)` and the right channel
/// its negation, where `t` counts sample pairs from the start of the stream:
/// block `n` starts at `t = n * samples.len() / 2`.
///
/// `samples.len()` must be even; a trailing odd sample is left untouched.
pub fn fill_sine_block(samples: &mut [f32], block_index: usize, params: &SineParams) {
    let pairs = samples.len() / 2;
    let step = params.phase_step();
    let start = (block_index * pairs) as f64;

    for (i, pair) in samples.chunks_exact_mut(2).enumerate() {
        let t = start + i as f64;
        let s = (step * t).sin() as f32 * params.amplitude;
        pair[0] = s;
        pair[1] = -s;
    }
}

/// Generate block `block_index` of `block_len` interleaved stereo samples.
pub fn sine_block(block_index: usize, block_len: usize, params: &SineParams) -> Vec<f32> {
    let mut samples = vec![0.0; block_len];
    fill_sine_block(&mut samples, block_index, params);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: SineParams = SineParams {
        frequency: 440.0,
        sample_rate: 44100,
        amplitude: 0.1,
    };

    #[test]
    fn test_first_sample_is_zero() {
        let block = sine_block(0, 100, &PARAMS);

        assert_eq!(block.len(), 100);
        assert_eq!(block[0], 0.0);
        assert_eq!(block[1], 0.0);
    }

    #[test]
    fn test_right_channel_mirrors_left() {
        for index in [0, 1, 7, 2204] {
            let block = sine_block(index, 100, &PARAMS);
            for pair in block.chunks_exact(2) {
                assert_eq!(pair[1], -pair[0]);
            }
        }
    }

    #[test]
    fn test_amplitude_bounded() {
        let peak = (0..100)
            .flat_map(|index| sine_block(index, 100, &PARAMS))
            .fold(0.0f32, |acc, s| acc.max(s.abs()));

        assert!(peak <= 0.1);
        // 5000 pairs cover 50 periods of a 440 Hz tone
        assert!(peak > 0.099);
    }

    #[test]
    fn test_phase_continues_across_blocks() {
        let step = PARAMS.phase_step();

        for index in [0usize, 1, 100, 2203] {
            let current = sine_block(index, 100, &PARAMS);
            let next = sine_block(index + 1, 100, &PARAMS);

            let last_t = (index * 50 + 49) as f64;
            let expected_last = ((step * last_t).sin() as f32) * 0.1;
            let expected_next = ((step * (last_t + 1.0)).sin() as f32) * 0.1;

            assert_eq!(current[98], expected_last);
            assert_eq!(next[0], expected_next);
        }
    }

    #[test]
    fn test_blocks_match_one_long_block() {
        let long = sine_block(0, 1000, &PARAMS);
        let stitched: Vec<f32> = (0..10)
            .flat_map(|index| sine_block(index, 100, &PARAMS))
            .collect();

        assert_eq!(long, stitched);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let a = sine_block(1234, 100, &PARAMS);
        let b = sine_block(1234, 100, &PARAMS);

        let bits = |v: &[f32]| v.iter().map(|s| s.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_fill_overwrites_previous_contents() {
        let mut buffer = vec![9.0f32; 100];
        fill_sine_block(&mut buffer, 3, &PARAMS);

        assert_eq!(buffer, sine_block(3, 100, &PARAMS));
    }
}
