//! SpO2 estimation strategies
//!
//! The post-processor asks an [`SpO2Estimator`] for a corrected terminal
//! SpO2 reading on every pass. [`NoEstimator`] never offers one;
//! [`MaximEstimator`] runs the MAX3010x reference heart-rate and SpO2
//! algorithm over a sliding five-second window of the optical series.

use tracing::{debug, trace};

use crate::types::Sample;

/// Result the algorithm reports when it cannot produce a value.
pub const NO_RESULT: i64 = -999;

/// Samples per second of the optical channels.
pub const SAMPLE_RATE: usize = 100;
/// Analysis window: five seconds of samples.
pub const WINDOW_LEN: usize = SAMPLE_RATE * 5;
/// New samples taken into the window on each later pass.
pub const WINDOW_STEP: usize = SAMPLE_RATE;

const MA4_SIZE: usize = 4;
const HAMMING_SIZE: usize = 5;
const HAMMING: [i64; HAMMING_SIZE] = [41, 276, 512, 276, 41];
const HAMMING_SUM: i64 = 1146;
const PEAK_MIN_DISTANCE: i64 = 8;
const MAX_PEAKS: usize = 5;
const PEAK_CAPACITY: usize = 15;
const MAX_RATIOS: usize = 5;
const VALLEY_SEARCH_RADIUS: i64 = 5;
const DC_FLOOR: i64 = -16_777_216;
const VALLEY_CEILING: i64 = 16_777_216;

/// SpO2 by AC/DC ratio, `-45.060·r² + 30.354·r + 94.845`, indexed by ratio × 100.
const SPO2_TABLE: [i64; 183] = [
    95, 95, 95, 96, 96, 96, 97, 97, 97, 97, 97, 98, 98, 98, 98, 98, 99, 99, 99, 99,
    99, 99, 99, 99, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 100, 99, 99, 99, 99, 99, 99, 99, 99, 98, 98, 98, 98, 98, 98, 97, 97,
    97, 97, 96, 96, 96, 96, 95, 95, 95, 94, 94, 94, 93, 93, 93, 92, 92, 92, 91, 91,
    90, 90, 89, 89, 89, 88, 88, 87, 87, 86, 86, 85, 85, 84, 84, 83, 82, 82, 81, 81,
    80, 80, 79, 78, 78, 77, 76, 76, 75, 74, 74, 73, 72, 72, 71, 70, 69, 69, 68, 67,
    66, 66, 65, 64, 63, 62, 62, 61, 60, 59, 58, 57, 56, 56, 55, 54, 53, 52, 51, 50,
    49, 48, 47, 46, 45, 44, 43, 42, 41, 40, 39, 38, 37, 36, 35, 34, 33, 31, 30, 29,
    28, 27, 26, 25, 23, 22, 21, 20, 19, 17, 16, 15, 14, 12, 11, 10, 9, 7, 6, 5,
    3, 2, 1,
];

/// One estimator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpO2Reading {
    /// Beats per minute, or the previous value when none could be computed
    pub heart_rate: i64,
    /// Saturation percent, or the previous value when none could be computed
    pub spo2: i64,
}

/// Produces a corrected terminal SpO2 reading from the optical series.
pub trait SpO2Estimator: Send + std::fmt::Debug {
    /// `ir` is the PPG-IR series and `red` the SpO2 series, oldest first.
    /// Both carry valid readings only.
    fn estimate(&mut self, ir: &[Sample], red: &[Sample]) -> Option<SpO2Reading>;

    /// Forget any state carried between passes.
    fn reset(&mut self) {}

    /// A new estimator of the same kind with no carried state.
    fn fresh(&self) -> Box<dyn SpO2Estimator>;
}

/// Never corrects; SpO2 passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEstimator;

impl SpO2Estimator for NoEstimator {
    fn estimate(&mut self, _ir: &[Sample], _red: &[Sample]) -> Option<SpO2Reading> {
        None
    }

    fn fresh(&self) -> Box<dyn SpO2Estimator> {
        Box::new(NoEstimator)
    }
}

/// Sliding-window MAX3010x estimator.
///
/// Needs at least [`WINDOW_LEN`] samples on both channels. The first pass
/// fills the window with the oldest samples, later passes drop the oldest
/// [`WINDOW_STEP`] and append the newest. When the algorithm has no result
/// the previous reading is repeated, starting from the raw terminal values.
#[derive(Debug, Clone, Default)]
pub struct MaximEstimator {
    window: Option<Window>,
    last: Option<SpO2Reading>,
}

#[derive(Debug, Clone)]
struct Window {
    ir: Vec<i64>,
    red: Vec<i64>,
}

impl MaximEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fill_window(&mut self, ir: &[Sample], red: &[Sample]) -> &Window {
        let window = match self.window.take() {
            None => Window {
                ir: ir[..WINDOW_LEN].iter().map(|s| s.raw).collect(),
                red: red[..WINDOW_LEN].iter().map(|s| s.raw).collect(),
            },
            Some(mut window) => {
                window.ir.drain(..WINDOW_STEP);
                window.red.drain(..WINDOW_STEP);
                window.ir.extend(ir[ir.len() - WINDOW_STEP..].iter().map(|s| s.raw));
                window.red.extend(red[red.len() - WINDOW_STEP..].iter().map(|s| s.raw));
                window
            }
        };
        self.window.insert(window)
    }
}

impl SpO2Estimator for MaximEstimator {
    fn estimate(&mut self, ir: &[Sample], red: &[Sample]) -> Option<SpO2Reading> {
        if ir.len() < WINDOW_LEN || red.len() < WINDOW_LEN {
            trace!("Estimator waiting for {} samples (ir={}, red={})", WINDOW_LEN, ir.len(), red.len());
            return None;
        }

        let window = self.fill_window(ir, red);
        let (heart_rate, spo2) = heart_rate_and_spo2(&window.ir, &window.red);

        let previous = self.last.unwrap_or(SpO2Reading {
            heart_rate: ir[ir.len() - 1].raw,
            spo2: red[red.len() - 1].raw,
        });
        let reading = SpO2Reading {
            heart_rate: if heart_rate == NO_RESULT { previous.heart_rate } else { heart_rate },
            spo2: if spo2 == NO_RESULT { previous.spo2 } else { spo2 },
        };
        debug!("SpO2 estimate: hr={} spo2={} (raw hr={} spo2={})", reading.heart_rate, reading.spo2, heart_rate, spo2);
        self.last = Some(reading);
        Some(reading)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn fresh(&self) -> Box<dyn SpO2Estimator> {
        Box::new(Self::new())
    }
}

/// Heart rate and SpO2 for one window, each [`NO_RESULT`] when unavailable.
///
/// `ir` and `red` must both hold [`WINDOW_LEN`] samples.
pub fn heart_rate_and_spo2(ir: &[i64], red: &[i64]) -> (i64, i64) {
    let len = ir.len().min(red.len());
    if len < WINDOW_LEN {
        return (NO_RESULT, NO_RESULT);
    }

    // Remove DC, then 4-point moving average
    let mean = ir[..WINDOW_LEN].iter().sum::<i64>() / WINDOW_LEN as i64;
    let mut x: Vec<i64> = ir[..WINDOW_LEN].iter().map(|v| v - mean).collect();
    moving_average_4(&mut x);

    // Smoothed derivative, inverted through a Hamming window so valleys read as peaks
    let mut dx = vec![0i64; WINDOW_LEN - MA4_SIZE];
    for k in 0..WINDOW_LEN - MA4_SIZE - 1 {
        dx[k] = x[k + 1] - x[k];
    }
    for k in 0..WINDOW_LEN - MA4_SIZE - 2 {
        dx[k] = (dx[k] + dx[k + 1]) / 2;
    }
    for i in 0..WINDOW_LEN - HAMMING_SIZE - MA4_SIZE - 2 {
        let s: i64 = HAMMING.iter().zip(&dx[i..]).map(|(w, d)| -d * w).sum();
        dx[i] = s / HAMMING_SUM;
    }

    let span = WINDOW_LEN - HAMMING_SIZE;
    let threshold = dx[..span].iter().map(|d| d.abs()).sum::<i64>() / span as i64;
    let peaks = find_peaks(&dx, span, threshold, PEAK_MIN_DISTANCE, MAX_PEAKS);

    let heart_rate = if peaks.len() >= 2 {
        let interval = peaks.windows(2).map(|w| w[1] - w[0]).sum::<i64>() / (peaks.len() as i64 - 1);
        (SAMPLE_RATE as i64 * 60).checked_div(interval).unwrap_or(NO_RESULT)
    } else {
        NO_RESULT
    };

    // Refine each valley to the raw IR minimum nearby
    let mut x: Vec<i64> = ir[..WINDOW_LEN].to_vec();
    let mut y: Vec<i64> = red[..WINDOW_LEN].to_vec();
    let mut valleys = Vec::with_capacity(peaks.len());
    for peak in &peaks {
        let m = peak + HAMMING_SIZE as i64 / 2;
        if m + VALLEY_SEARCH_RADIUS >= span as i64 || m - VALLEY_SEARCH_RADIUS <= 0 {
            continue;
        }
        let mut lowest = VALLEY_CEILING;
        let mut location = None;
        for i in m - VALLEY_SEARCH_RADIUS..m + VALLEY_SEARCH_RADIUS {
            if x[i as usize] < lowest {
                lowest = x[i as usize];
                location = Some(i as usize);
            }
        }
        valleys.extend(location);
    }
    if valleys.len() < 2 {
        return (heart_rate, NO_RESULT);
    }

    moving_average_4(&mut x);
    moving_average_4(&mut y);

    // AC/DC ratio of red against IR between consecutive valleys
    let mut ratios = Vec::with_capacity(MAX_RATIOS);
    let (mut x_dc_max_idx, mut y_dc_max_idx) = (0usize, 0usize);
    for pair in valleys.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end - start <= 10 {
            continue;
        }
        let (mut x_dc_max, mut y_dc_max) = (DC_FLOOR, DC_FLOOR);
        for i in start..end {
            if x[i] > x_dc_max {
                x_dc_max = x[i];
                x_dc_max_idx = i;
            }
            if y[i] > y_dc_max {
                y_dc_max = y[i];
                y_dc_max_idx = i;
            }
        }
        let width = (end - start) as i64;

        let y_ac = (y[end] - y[start]) * (y_dc_max_idx as i64 - start as i64);
        let y_ac = y[y_dc_max_idx] - (y[start] + y_ac / width);
        let x_ac = (x[end] - x[start]) * (x_dc_max_idx as i64 - start as i64);
        let x_ac = x[y_dc_max_idx] - (x[start] + x_ac / width);

        let numerator = (y_ac * x_dc_max) >> 7;
        let denominator = (x_ac * y_dc_max) >> 7;
        if denominator > 0 && ratios.len() < MAX_RATIOS && numerator != 0 {
            ratios.push(numerator * 100 / denominator);
        }
    }

    ratios.sort_unstable();
    let middle = ratios.len() / 2;
    let ratio = if middle > 1 {
        (ratios[middle - 1] + ratios[middle]) / 2
    } else {
        ratios.get(middle).copied().unwrap_or(0)
    };

    let spo2 = if ratio > 2 {
        usize::try_from(ratio).ok().and_then(|r| SPO2_TABLE.get(r)).copied().unwrap_or(NO_RESULT)
    } else {
        NO_RESULT
    };
    (heart_rate, spo2)
}

fn moving_average_4(values: &mut [i64]) {
    for k in 0..values.len().saturating_sub(MA4_SIZE) {
        values[k] = values[k..k + MA4_SIZE].iter().sum::<i64>() / MA4_SIZE as i64;
    }
}

/// At most `max_count` peaks above `min_height`, at least `min_distance` apart.
fn find_peaks(x: &[i64], size: usize, min_height: i64, min_distance: i64, max_count: usize) -> Vec<i64> {
    let mut peaks = peaks_above_min_height(x, size, min_height);
    remove_close_peaks(&mut peaks, x, min_distance);
    peaks.truncate(max_count);
    peaks
}

fn peaks_above_min_height(x: &[i64], size: usize, min_height: i64) -> Vec<i64> {
    let mut peaks = Vec::new();
    let mut i = 1;
    while i + 1 < size {
        if x[i] > min_height && x[i] > x[i - 1] {
            // Flat tops report their left edge
            let mut width = 1;
            while i + width < size && x[i] == x[i + width] {
                width += 1;
            }
            if x.get(i + width).is_some_and(|right| x[i] > *right) && peaks.len() < PEAK_CAPACITY {
                peaks.push(i as i64);
                i += width + 1;
            } else {
                i += width;
            }
        } else {
            i += 1;
        }
    }
    peaks
}

fn remove_close_peaks(peaks: &mut Vec<i64>, x: &[i64], min_distance: i64) {
    // Tallest first; stable so equal heights keep their order
    peaks.sort_by_key(|&location| std::cmp::Reverse(x[location as usize]));

    let mut count = peaks.len();
    let mut i: isize = -1;
    while i < count as isize {
        let previous_count = count;
        count = (i + 1) as usize;
        let anchor = if i == -1 { -1 } else { peaks[i as usize] };
        for j in (i + 1) as usize..previous_count {
            let distance = peaks[j] - anchor;
            if distance > min_distance || distance < -min_distance {
                peaks[count] = peaks[j];
                count += 1;
            }
        }
        i += 1;
    }
    peaks.truncate(count);
    peaks.sort_unstable();
}
