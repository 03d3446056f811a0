//! Offline echo-cancellation simulation.
//!
//! Generates a white-noise reference, contaminates a synthetic microphone
//! signal with a delayed and attenuated copy of it, runs the canceller over
//! the pair block by block, prints the per-segment ERLE, and writes the
//! reference, microphone and cleaned signals as WAV files.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use hound::{SampleFormat, WavSpec, WavWriter};
use nlms_aec::{AecConfig, NlmsAec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BLOCK: usize = 128;
const SEGMENTS: usize = 10;

#[derive(Parser)]
#[command(about = "Simulate acoustic echo cancellation on synthetic signals")]
struct Args {
    /// Length of the simulation in samples.
    #[arg(long, default_value_t = 96_000)]
    samples: usize,

    /// Sample rate written into the WAV headers.
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    /// Adaptive filter length in taps.
    #[arg(long, default_value_t = 256)]
    filter_length: usize,

    /// NLMS step size.
    #[arg(long, default_value_t = 0.5)]
    step_size: f32,

    /// Echo path delay in samples.
    #[arg(long, default_value_t = 24)]
    echo_delay: usize,

    /// Echo path gain.
    #[arg(long, default_value_t = 0.6)]
    echo_gain: f32,

    /// RNG seed for the reference noise.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory the WAV files are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    ensure!(
        args.echo_delay + 3 <= args.filter_length,
        "filter length {} cannot cover an echo delay of {} samples",
        args.filter_length,
        args.echo_delay
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let reference: Vec<f32> = (0..args.samples)
        .map(|_| rng.gen_range(-0.5..0.5))
        .collect();

    // Echo path: delayed main tap plus a short decaying tail.
    let mut path = vec![0.0f32; args.echo_delay + 3];
    path[args.echo_delay] = args.echo_gain;
    path[args.echo_delay + 1] = args.echo_gain * 0.4;
    path[args.echo_delay + 2] = args.echo_gain * 0.15;
    let mic = apply_echo_path(&reference, &path);

    let mut aec = NlmsAec::new(AecConfig {
        filter_length: args.filter_length,
        step_size: args.step_size,
        regularization: 1e-10,
    })?;

    let mut cleaned = vec![0.0f32; mic.len()];
    let mut scratch = vec![0.0f32; BLOCK];
    for (offset, mic_frame) in mic.chunks(BLOCK).enumerate().map(|(i, c)| (i * BLOCK, c)) {
        let reference_frame = &reference[offset..offset + mic_frame.len()];
        let out = &mut scratch[..mic_frame.len()];
        aec.process_into(mic_frame, Some(reference_frame), out)?;
        cleaned[offset..offset + mic_frame.len()].copy_from_slice(out);
    }

    println!(
        "{} samples, {} taps, mu = {}, echo delay {} samples, gain {}",
        args.samples, args.filter_length, args.step_size, args.echo_delay, args.echo_gain
    );
    let segment_len = mic.len() / SEGMENTS;
    for i in 0..SEGMENTS {
        let range = i * segment_len..(i + 1) * segment_len;
        let erle = erle_db(&mic[range.clone()], &cleaned[range]);
        println!("segment {:2}: ERLE {:6.1} dB", i + 1, erle);
    }

    write_wav(&args.out_dir.join("reference.wav"), &reference, args.sample_rate)?;
    write_wav(&args.out_dir.join("mic.wav"), &mic, args.sample_rate)?;
    write_wav(&args.out_dir.join("cleaned.wav"), &cleaned, args.sample_rate)?;
    println!("wrote reference.wav, mic.wav, cleaned.wav to {}", args.out_dir.display());

    Ok(())
}

fn apply_echo_path(signal: &[f32], path: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0f32; signal.len()];
    for n in 0..signal.len() {
        let mut acc = 0.0;
        for (k, &h) in path.iter().enumerate() {
            if h != 0.0 && n >= k {
                acc += h * signal[n - k];
            }
        }
        out[n] = acc;
    }
    out
}

/// Echo Return Loss Enhancement: how much the canceller attenuated the echo.
fn erle_db(mic: &[f32], cleaned: &[f32]) -> f32 {
    let mic_energy: f32 = mic.iter().map(|&x| x * x).sum();
    let residual_energy: f32 = cleaned.iter().map(|&x| x * x).sum();
    10.0 * (mic_energy / residual_energy.max(1e-12)).log10()
}

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
