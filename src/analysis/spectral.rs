//! Dominant periodicities of dense 1D signals
//!
//! Signals are zero-padded to the next power of two and transformed with an
//! in-place radix-2 FFT. Magnitudes are amplitude-scaled against the unpadded
//! length and phases are expressed for a sine basis, so a component can be
//! turned straight back into `magnitude * sin(2*pi*f*t + phase)`.

use crate::session::config::AnalysisConfig;
use serde::Serialize;
use std::f64::consts::PI;

/// A single spectral peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyComponent {
    /// Frequency in Hz
    pub frequency: f64,

    /// Amplitude of the reconstructed sinusoid
    pub magnitude: f64,

    /// Phase in radians, in (-pi, pi]
    pub phase: f64,
}

impl FrequencyComponent {
    /// Reconstructed sinusoid at `t` seconds
    pub fn value_at(&self, t: f64) -> f64 {
        self.magnitude * (2.0 * PI * self.frequency * t + self.phase).sin()
    }

    /// Reconstructed sinusoid mapped to [0,1], 0 for a zero-magnitude component
    pub fn normalized_value_at(&self, t: f64) -> f64 {
        if self.magnitude <= 0.0 {
            return 0.0;
        }
        (self.value_at(t) + self.magnitude) / (2.0 * self.magnitude)
    }
}

#[derive(Debug, Clone, Copy)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }

    fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }
}

impl std::ops::Add for Complex {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl std::ops::Sub for Complex {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl std::ops::Mul for Complex {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// Iterative radix-2 Cooley-Tukey; `data.len()` must be a power of two
fn fft_in_place(data: &mut [Complex]) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two());

    // bit-reversal permutation
    let mut j = 0usize;
    for i in 0..n {
        if i < j {
            data.swap(i, j);
        }
        let mut m = n >> 1;
        while m >= 1 && j >= m {
            j -= m;
            m >>= 1;
        }
        j += m;
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle = -2.0 * PI / len as f64;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let (sin, cos) = (angle * k as f64).sin_cos();
                let u = data[start + k];
                let v = data[start + k + half] * Complex::new(cos, sin);
                data[start + k] = u + v;
                data[start + k + half] = u - v;
            }
        }
        len <<= 1;
    }
}

/// Wrap an angle into (-pi, pi]
fn wrap_phase(phase: f64) -> f64 {
    let wrapped = (phase + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Every bin from DC up to Nyquist, in ascending frequency
pub fn spectrum(signal: &[f64], fps: f64) -> Vec<FrequencyComponent> {
    let len = signal.len();
    if len == 0 {
        return Vec::new();
    }

    let n = len.next_power_of_two();
    let mut data: Vec<Complex> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    data.resize(n, Complex::new(0.0, 0.0));
    fft_in_place(&mut data);

    let bin_width = (fps / 2.0) / (n as f64 / 2.0).max(1.0);
    (0..=n / 2)
        .map(|i| {
            // DC and Nyquist have no mirrored negative-frequency bin
            let scale = if i == 0 || i == n / 2 { 1.0 } else { 2.0 };
            FrequencyComponent {
                frequency: i as f64 * bin_width,
                magnitude: scale * data[i].norm() / len as f64,
                // sine basis: A*sin(wt + p) transforms to phase p - pi/2
                phase: wrap_phase(data[i].arg() + PI / 2.0),
            }
        })
        .collect()
}

/// Ranks the strongest low-frequency components of a signal
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    top_k: usize,
    max_frequency_hz: f64,
}

impl SpectralAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            top_k: config.top_k,
            max_frequency_hz: config.max_frequency_hz,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// The `top_k` highest-magnitude components in (0, max_frequency_hz]
    ///
    /// Sorted descending by magnitude; equal magnitudes keep ascending
    /// frequency order.
    pub fn dominant_frequencies(&self, signal: &[f64], fps: f64) -> Vec<FrequencyComponent> {
        let mut candidates: Vec<FrequencyComponent> = spectrum(signal, fps)
            .into_iter()
            .skip(1)
            .filter(|c| c.frequency <= self.max_frequency_hz)
            .collect();

        candidates.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        candidates.truncate(self.top_k);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: f64 = 30.0;

    fn sine(len: usize, frequency: f64, amplitude: f64, phase: f64) -> Vec<f64> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * frequency * i as f64 / FPS + phase).sin())
            .collect()
    }

    #[test]
    fn test_recovers_single_sinusoid() {
        // bin 20 of a 1024-point transform at 30fps
        let frequency = 20.0 * FPS / 1024.0;
        let signal = sine(1024, frequency, 3.0, 0.7);

        let analyzer = SpectralAnalyzer::new(&AnalysisConfig::new());
        let top = analyzer.dominant_frequencies(&signal, FPS);

        assert_eq!(top.len(), 5);
        let peak = top[0];
        assert!((peak.frequency - frequency).abs() < 1e-9);
        assert!((peak.magnitude - 3.0).abs() < 1e-6);
        assert!((peak.phase - 0.7).abs() < 1e-6);
        assert!(top[1].magnitude < 1e-6);

        // reconstruction matches the input
        for (i, &x) in signal.iter().enumerate().step_by(37) {
            assert!((peak.value_at(i as f64 / FPS) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_recovers_nyquist_sinusoid() {
        // at 4fps the 2 Hz Nyquist bin lies inside the candidate band
        let fps = 4.0;
        let signal: Vec<f64> = (0..64)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();

        let top = SpectralAnalyzer::new(&AnalysisConfig::new()).dominant_frequencies(&signal, fps);

        let peak = top[0];
        assert!((peak.frequency - 2.0).abs() < 1e-9);
        assert!((peak.magnitude - 1.0).abs() < 1e-6);
        for (i, &x) in signal.iter().enumerate().take(8) {
            assert!((peak.value_at(i as f64 / fps) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dc_bin_is_the_mean() {
        let bins = spectrum(&[3.0; 16], FPS);
        assert!((bins[0].magnitude - 3.0).abs() < 1e-12);
        assert!(bins[1..].iter().all(|c| c.magnitude < 1e-12));
    }

    #[test]
    fn test_excludes_dc_and_high_frequencies() {
        let low = 10.0 * FPS / 512.0;
        let high = 100.0 * FPS / 512.0; // ~5.9 Hz
        let signal: Vec<f64> = sine(512, low, 1.0, 0.0)
            .iter()
            .zip(sine(512, high, 4.0, 0.0))
            .map(|(a, b)| 10.0 + a + b)
            .collect();

        let top = SpectralAnalyzer::new(&AnalysisConfig::new())
            .with_top_k(2)
            .dominant_frequencies(&signal, FPS);

        assert_eq!(top.len(), 2);
        assert!((top[0].frequency - low).abs() < 1e-9);
        assert!(top.iter().all(|c| c.frequency > 0.0 && c.frequency <= 2.0));
    }

    #[test]
    fn test_ranked_descending() {
        let a = 8.0 * FPS / 256.0;
        let b = 12.0 * FPS / 256.0;
        let signal: Vec<f64> = sine(256, a, 1.0, 0.0)
            .iter()
            .zip(sine(256, b, 2.0, 1.0))
            .map(|(x, y)| x + y)
            .collect();

        let top = SpectralAnalyzer::new(&AnalysisConfig::new()).dominant_frequencies(&signal, FPS);
        assert!((top[0].frequency - b).abs() < 1e-9);
        assert!((top[1].frequency - a).abs() < 1e-9);
        assert!(top.windows(2).all(|w| w[0].magnitude >= w[1].magnitude));
    }

    #[test]
    fn test_padding_and_empty_input() {
        assert!(spectrum(&[], FPS).is_empty());
        // 300 samples pad to 512 -> 257 bins
        assert_eq!(spectrum(&vec![0.0; 300], FPS).len(), 257);
        assert!(SpectralAnalyzer::new(&AnalysisConfig::new())
            .dominant_frequencies(&[1.0], FPS)
            .is_empty());
    }

    #[test]
    fn test_normalized_reconstruction() {
        let component = FrequencyComponent {
            frequency: 0.5,
            magnitude: 2.0,
            phase: 0.0,
        };
        assert!((component.normalized_value_at(0.0) - 0.5).abs() < 1e-12);
        assert!((component.normalized_value_at(0.5) - 1.0).abs() < 1e-12);
        let silent = FrequencyComponent {
            magnitude: 0.0,
            ..component
        };
        assert_eq!(silent.normalized_value_at(0.3), 0.0);
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_phase(-PI) - PI).abs() < 1e-12);
        assert!((wrap_phase(0.25) - 0.25).abs() < 1e-12);
    }
}
