//! Behavioral properties of the NLMS canceller over long runs.

use nlms_aec::{AecConfig, NlmsAec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BLOCK: usize = 128;

fn canceller(filter_length: usize, step_size: f32) -> NlmsAec {
    NlmsAec::new(AecConfig {
        filter_length,
        step_size,
        regularization: 1e-10,
    })
    .unwrap()
}

fn noise(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Convolve a signal with a causal FIR impulse response.
fn apply_echo_path(signal: &[f32], path: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0f32; signal.len()];
    for n in 0..signal.len() {
        let mut acc = 0.0;
        for (k, &h) in path.iter().enumerate() {
            if n >= k {
                acc += h * signal[n - k];
            }
        }
        out[n] = acc;
    }
    out
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Run a full mic/reference signal pair through the canceller in
/// fixed-size blocks, collecting the output.
fn run_blocks(aec: &mut NlmsAec, mic: &[f32], reference: &[f32], block: usize) -> Vec<f32> {
    let mut cleaned = vec![0.0f32; mic.len()];
    for ((mic_frame, reference_frame), out) in mic
        .chunks(block)
        .zip(reference.chunks(block))
        .zip(cleaned.chunks_mut(block))
    {
        aec.process_into(mic_frame, Some(reference_frame), out)
            .unwrap();
    }
    cleaned
}

#[test]
fn converges_on_pure_echo() {
    // Pure echo, no near-end signal: a known 4-tap path applied to a noise
    // reference. The residual must decay as the filter identifies the path.
    let n = 16 * 1024;
    let reference = noise(n, 42);
    let path = [0.5, -0.25, 0.125, 0.0625];
    let mic = apply_echo_path(&reference, &path);

    let mut aec = canceller(32, 0.5);
    let cleaned = run_blocks(&mut aec, &mic, &reference, BLOCK);

    let head = rms(&cleaned[..n / 10]);
    let tail = rms(&cleaned[n - n / 10..]);
    let decay_db = 20.0 * (head / tail.max(1e-12)).log10();
    assert!(
        decay_db > 20.0,
        "expected >20 dB echo decay, got {decay_db:.1} dB (head rms {head:.6}, tail rms {tail:.6})"
    );
}

#[test]
fn weights_stay_bounded_on_long_runs() {
    // Independent near-end noise on top of the echo keeps the filter from
    // ever converging exactly; the weights must still stay bounded.
    let n = 64 * 1024;
    let reference = noise(n, 7);
    let near_end = noise(n, 8);
    let echo = apply_echo_path(&reference, &[0.6, 0.2]);
    let mic: Vec<f32> = echo
        .iter()
        .zip(near_end.iter())
        .map(|(&e, &s)| e + 0.5 * s)
        .collect();

    let mut aec = canceller(64, 0.5);
    let cleaned = run_blocks(&mut aec, &mic, &reference, BLOCK);

    assert!(cleaned.iter().all(|&x| x.is_finite()));
    for (k, &w) in aec.weights().iter().enumerate() {
        assert!(w.is_finite(), "weight[{k}] is not finite: {w}");
        assert!(w.abs() < 10.0, "weight[{k}] grew unbounded: {w}");
    }
}

#[test]
fn identically_configured_instances_are_deterministic() {
    let n = 4 * 1024;
    let reference = noise(n, 11);
    let mic = apply_echo_path(&reference, &[0.4, 0.1]);

    let mut first = canceller(16, 0.25);
    let mut second = canceller(16, 0.25);

    let out_first = run_blocks(&mut first, &mic, &reference, BLOCK);
    let out_second = run_blocks(&mut second, &mic, &reference, BLOCK);

    // Same input, same order: bit-identical output and internal state.
    assert_eq!(out_first, out_second);
    assert_eq!(first.weights(), second.weights());
}

#[test]
fn block_order_changes_the_output() {
    let block_a = noise(BLOCK, 21);
    let block_b = noise(BLOCK, 22);
    let mic_a = apply_echo_path(&block_a, &[0.5]);
    let mic_b = apply_echo_path(&block_b, &[0.5]);

    let mut forward = canceller(16, 0.5);
    let mut out_ab = vec![0.0f32; 2 * BLOCK];
    forward
        .process_into(&mic_a, Some(&block_a), &mut out_ab[..BLOCK])
        .unwrap();
    forward
        .process_into(&mic_b, Some(&block_b), &mut out_ab[BLOCK..])
        .unwrap();

    let mut reversed = canceller(16, 0.5);
    let mut out_ba = vec![0.0f32; 2 * BLOCK];
    reversed
        .process_into(&mic_b, Some(&block_b), &mut out_ba[..BLOCK])
        .unwrap();
    reversed
        .process_into(&mic_a, Some(&block_a), &mut out_ba[BLOCK..])
        .unwrap();

    // The filter is stateful: block B processed after A sees different
    // weights than block B processed first.
    assert_ne!(&out_ab[BLOCK..], &out_ba[..BLOCK]);
}

#[test]
fn block_size_does_not_change_the_result() {
    // One 256-sample call and two 128-sample calls must walk the exact same
    // per-sample state sequence.
    let reference = noise(256, 31);
    let mic = apply_echo_path(&reference, &[0.3, -0.2, 0.1]);

    let mut whole = canceller(24, 0.5);
    let out_whole = whole.process(&mic, Some(&reference)).unwrap();

    let mut split = canceller(24, 0.5);
    let out_split = run_blocks(&mut split, &mic, &reference, 128);

    assert_eq!(out_whole, out_split);
    assert_eq!(whole.weights(), split.weights());
}

#[test]
fn passthrough_holds_across_calls_without_reference() {
    let mut aec = canceller(32, 0.5);
    for seed in 0..8 {
        let mic = noise(BLOCK, 100 + seed);
        let cleaned = aec.process(&mic, None).unwrap();
        assert_eq!(cleaned, mic);
    }
    assert!(aec.weights().iter().all(|&w| w == 0.0));
}
