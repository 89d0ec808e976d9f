//! Fixed-coefficient EEG smoothing filter
//!
//! A direct-form IIR recurrence over the published coefficient tables. The
//! feed-forward history holds the last `B.len()` inputs and the feedback
//! history the last `A.len() - 1` outputs, newest first, so `B[0]` always
//! weighs the current input.

/// Feedback (denominator) coefficients, `A[0]` is the normalised 1.0.
pub const A: [f32; 79] = [
    1.0000, -3.5492, 16.8245, -43.6363, 121.3232, -250.6864, 520.0144, -897.8167,
    1517.5330, -2255.1962, 3246.3581, -4236.1098, 5329.9675, -6193.3956, 6926.7951, -7241.6800,
    7283.1131, -6903.6272, 6295.6191, -5442.5667, 4528.0239, -3586.2281, 2734.4921, -1991.0084,
    1396.1726, -937.0116, 605.8266, -375.5006, 224.2613, -128.5498, 71.0073, -37.6754,
    19.2621, -9.4643, 4.4800, -2.0385, 0.8933, -0.3763, 0.1526, -0.0594,
    0.0223, -0.0080, 0.0028, -0.0009, 0.0003, -0.0001, 0.0000, -0.0000,
    0.0000, -0.0000, 0.0000, -0.0000, 0.0000, -0.0000, 0.0000, -0.0000,
    0.0000, -0.0000, 0.0000, -0.0000, 0.0000, -0.0000, 0.0000, -0.0000,
    0.0000, -0.0000, 0.0000, -0.0000, 0.0000, -0.0000, 0.0000, -0.0000,
    0.0000, -0.0000, 0.0000, -0.0000, 0.0000, -0.0000, 0.0000,
];

/// Feed-forward (numerator) coefficients.
pub const B: [f32; 79] = [
    2.6926e-19, -2.1002e-17, 8.0859e-16, -2.0484e-14, 3.8408e-13, -5.6844e-12, 6.916e-11, -7.1136e-10,
    6.3133e-09, -4.9104e-08, 3.3882e-07, -2.0945e-06, 1.1694e-05, -5.9371e-05, 0.00027565, -0.0011761,
    0.0046309, -0.016889, 0.057236, -0.18075, 0.5332, -1.4726, 3.8155, -9.2899,
    21.289, -45.985, 93.738, -180.53, 328.83, -566.95, 926.01, -1433.8,
    2105.9, -2935.5, 3885.3, -4884.3, 5834.1, -6622.5, 7145.3, -7328.5,
    7145.3, -6622.5, 5834.1, -4884.3, 3885.3, -2935.5, 2105.9, -1433.8,
    926.01, -566.95, 328.83, -180.53, 93.738, -45.985, 21.289, -9.2899,
    3.8155, -1.4726, 0.5332, -0.18075, 0.057236, -0.016889, 0.0046309, -0.0011761,
    0.00027565, -5.9371e-05, 1.1694e-05, -2.0945e-06, 3.3882e-07, -4.9104e-08, 6.3133e-09, -7.1136e-10,
    6.916e-11, -5.6844e-12, 3.8408e-13, -2.0484e-14, 8.0859e-16, -2.1002e-17, 2.6926e-19,
];

/// Streaming IIR filter state.
#[derive(Debug, Clone)]
pub struct IirFilter {
    inputs: [f32; B.len()],
    outputs: [f32; A.len() - 1],
}

impl Default for IirFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl IirFilter {
    pub const fn new() -> Self {
        Self { inputs: [0.0; B.len()], outputs: [0.0; A.len() - 1] }
    }

    /// Push one input sample and return the filtered output.
    pub fn step(&mut self, input: f32) -> f32 {
        self.inputs.copy_within(..B.len() - 1, 1);
        self.inputs[0] = input;

        let mut y = 0.0f32;
        for (b, x) in B.iter().zip(&self.inputs) {
            y += b * x;
        }
        for (a, previous) in A[1..].iter().zip(&self.outputs) {
            y -= a * previous;
        }

        self.outputs.copy_within(..A.len() - 2, 1);
        self.outputs[0] = y;
        y
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Filter a whole series from a fresh state.
    pub fn filter(series: impl IntoIterator<Item = f32>) -> Vec<f32> {
        let mut filter = Self::new();
        series.into_iter().map(|x| filter.step(x)).collect()
    }
}
