//! Adaptive linear predictor of CCSDS 123.0-B-1, section 4.
//!
//! Every sample is predicted from a local sum of its already coded neighbours
//! and a weighted sum of local differences: the north, west and north-west
//! differences of the current band (full mode only) and the central
//! differences of up to P previous bands. Weights adapt after each sample
//! with a sign algorithm whose step shrinks as coding progresses through the
//! band. The prediction residual is folded into a non-negative mapped residual
//! of at most D bits.

use crate::coding_parameters::{CodingParameters, SampleLimits};
use crate::error::Ccsds123Error;
use crate::sample_window::SampleWindow;
use crate::{CubeInfo, LocalSumMode, PredictionMode, WeightInitMethod};
use std::cmp::min;
use tracing::{debug, trace};

/// Keeps the low `register_size` bits of `value` as a two's complement number.
pub fn mod_r(value: i64, register_size: u32) -> i64 {
    if register_size >= 64 {
        return value;
    }
    let shift = 64 - register_size;
    (value << shift) >> shift
}

/// Maps a prediction residual onto [0, 2^D - 1].
pub fn map_residual(sample: i64, predicted: i64, scaled: i64, limits: &SampleLimits) -> u32 {
    let residual = sample - predicted;
    let theta = min(predicted - limits.minimum, limits.maximum - predicted);
    let magnitude = residual.abs();
    let scaled_even = scaled & 1 == 0;

    let mapped = if magnitude > theta {
        magnitude + theta
    } else if (scaled_even && residual >= 0) || (!scaled_even && residual <= 0) {
        2 * magnitude
    } else {
        2 * magnitude - 1
    };
    mapped as u32
}

/// Inverse of [`map_residual`]: returns the sample.
pub fn unmap_residual(mapped: u32, predicted: i64, scaled: i64, limits: &SampleLimits) -> i64 {
    let mapped = mapped as i64;
    let theta = min(predicted - limits.minimum, limits.maximum - predicted);
    let scaled_even = scaled & 1 == 0;

    let residual = if mapped > 2 * theta {
        if theta == predicted - limits.minimum {
            mapped - theta
        } else {
            theta - mapped
        }
    } else if mapped % 2 == 0 {
        if scaled_even { mapped / 2 } else { -(mapped / 2) }
    } else if scaled_even {
        -((mapped + 1) / 2)
    } else {
        (mapped + 1) / 2
    };
    residual + predicted
}

/// Scaled predicted sample and the predicted sample derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub scaled: i64,
    pub sample: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WeightInitialization {
    Default,
    Custom { resolution: u32, table: Vec<Vec<i32>> },
}

pub struct Predictor {
    columns: usize,
    dynamic_range: u32,
    prediction_bands: usize,
    prediction_mode: PredictionMode,
    local_sum_mode: LocalSumMode,
    register_size: u32,
    weight_resolution: u32,
    weight_update_interval: u32,
    weight_update_initial_exponent: i64,
    weight_update_final_exponent: i64,
    limits: SampleLimits,
    weight_minimum: i64,
    weight_maximum: i64,
    weight_initialization: WeightInitialization,
    weights: Vec<Vec<i64>>,
    differences: Vec<i64>,
    samples_predicted: u64,
}

impl Predictor {
    pub fn new(info: &CubeInfo, parameters: &CodingParameters) -> Result<Self, Ccsds123Error> {
        let predictor = &parameters.predictor;
        let weight_initialization = match predictor.weight_init_method {
            WeightInitMethod::Default => WeightInitialization::Default,
            WeightInitMethod::Custom => {
                let table = predictor
                    .weight_init_table
                    .clone()
                    .ok_or(Ccsds123Error::MissingWeightInitTable)?;
                let shape_matches = table.len() == info.bands as usize
                    && table
                        .iter()
                        .enumerate()
                        .all(|(z, row)| row.len() == predictor.local_difference_count(z as u32));
                if !shape_matches {
                    return Err(Ccsds123Error::InvalidParameterWeightInitTable);
                }
                WeightInitialization::Custom {
                    resolution: predictor.weight_init_resolution,
                    table,
                }
            }
        };

        let weight_limit = 1i64 << (predictor.weight_resolution + 2);
        let central = match predictor.prediction_mode {
            PredictionMode::Full => 3,
            PredictionMode::Reduced => 0,
        };
        Ok(Self {
            columns: info.columns as usize,
            dynamic_range: parameters.dynamic_range,
            prediction_bands: predictor.prediction_bands as usize,
            prediction_mode: predictor.prediction_mode,
            local_sum_mode: predictor.local_sum_mode,
            register_size: predictor.register_size,
            weight_resolution: predictor.weight_resolution,
            weight_update_interval: predictor.weight_update_interval,
            weight_update_initial_exponent: predictor.weight_update_initial_exponent as i64,
            weight_update_final_exponent: predictor.weight_update_final_exponent as i64,
            limits: parameters.sample_limits(info.signed),
            weight_minimum: -weight_limit,
            weight_maximum: weight_limit - 1,
            weight_initialization,
            weights: vec![Vec::new(); info.bands as usize],
            differences: vec![0; central + predictor.prediction_bands as usize],
            samples_predicted: 0,
        })
    }

    fn central_difference_count(&self) -> usize {
        match self.prediction_mode {
            PredictionMode::Full => 3,
            PredictionMode::Reduced => 0,
        }
    }

    fn difference_count(&self, z: usize) -> usize {
        self.central_difference_count() + min(self.prediction_bands, z)
    }

    /// Loads the initial weight vector of band `z`.
    pub fn init_band(&mut self, z: usize) {
        let count = self.difference_count(z);
        let central = self.central_difference_count();
        let mut weights = vec![0i64; count];

        match &self.weight_initialization {
            WeightInitialization::Default => {
                if count > central {
                    weights[central] = 7 << (self.weight_resolution - 3);
                    for i in central + 1..count {
                        weights[i] = weights[i - 1] >> 3;
                    }
                }
            }
            WeightInitialization::Custom { resolution, table } => {
                let exponent = self.weight_resolution as i64 + 2 - *resolution as i64;
                let offset = if exponent < 0 { 0 } else { (1i64 << exponent) - 1 };
                let scale = 1i64 << (exponent + 1);
                for (weight, &entry) in weights.iter_mut().zip(&table[z]) {
                    *weight = scale * entry as i64 + offset;
                }
            }
        }
        trace!(band = z, weights = count, "predictor band start");
        self.weights[z] = weights;
    }

    pub fn weights(&self, z: usize) -> &[i64] {
        &self.weights[z]
    }

    /// Smallest and largest value a weight may take, -2^(omega+2) and 2^(omega+2) - 1.
    pub fn weight_limits(&self) -> (i64, i64) {
        (self.weight_minimum, self.weight_maximum)
    }

    fn local_sum<W: SampleWindow>(&self, window: &W, z: usize, y: usize, x: usize) -> i64 {
        let s = |row: usize, column: usize| window.sample(z, row, column) as i64;
        match self.local_sum_mode {
            LocalSumMode::ColumnOriented => {
                if y > 0 {
                    4 * s(y - 1, x)
                } else {
                    4 * s(y, x - 1)
                }
            }
            LocalSumMode::NeighborOriented => {
                if y == 0 {
                    4 * s(y, x - 1)
                } else if self.columns == 1 {
                    4 * s(y - 1, x)
                } else if x == 0 {
                    2 * (s(y - 1, x) + s(y - 1, x + 1))
                } else if x == self.columns - 1 {
                    s(y, x - 1) + s(y - 1, x - 1) + 2 * s(y - 1, x)
                } else {
                    s(y, x - 1) + s(y - 1, x - 1) + s(y - 1, x) + s(y - 1, x + 1)
                }
            }
        }
    }

    fn compute_differences<W: SampleWindow>(
        &mut self,
        window: &W,
        z: usize,
        y: usize,
        x: usize,
        local_sum: i64,
    ) {
        let central = self.central_difference_count();
        if central > 0 {
            if y == 0 {
                self.differences[..3].fill(0);
            } else {
                let north = 4 * window.sample(z, y - 1, x) as i64 - local_sum;
                if x == 0 {
                    self.differences[..3].fill(north);
                } else {
                    self.differences[0] = north;
                    self.differences[1] = 4 * window.sample(z, y, x - 1) as i64 - local_sum;
                    self.differences[2] = 4 * window.sample(z, y - 1, x - 1) as i64 - local_sum;
                }
            }
        }
        for i in 0..min(self.prediction_bands, z) {
            let band = z - i - 1;
            let sum = self.local_sum(window, band, y, x);
            self.differences[central + i] = 4 * window.sample(band, y, x) as i64 - sum;
        }
    }

    /// Predicts sample (z, y, x). Leaves the local differences in place for
    /// the following weight update.
    pub fn predict<W: SampleWindow>(
        &mut self,
        window: &W,
        z: usize,
        y: usize,
        x: usize,
    ) -> Prediction {
        let scaled = if x == 0 && y == 0 {
            if z == 0 || self.prediction_bands == 0 {
                2 * self.limits.mid
            } else {
                2 * window.sample(z - 1, 0, 0) as i64
            }
        } else {
            let local_sum = self.local_sum(window, z, y, x);
            self.compute_differences(window, z, y, x, local_sum);
            let count = self.difference_count(z);
            let dot: i64 = self.weights[z]
                .iter()
                .zip(&self.differences[..count])
                .map(|(w, d)| w * d)
                .sum();
            let bias = (local_sum - 4 * self.limits.mid) << self.weight_resolution;
            let register = mod_r(dot + bias, self.register_size);
            let value = (register >> (self.weight_resolution + 1)) + 2 * self.limits.mid + 1;
            value.clamp(2 * self.limits.minimum, 2 * self.limits.maximum + 1)
        };
        self.samples_predicted += 1;
        Prediction {
            scaled,
            sample: scaled >> 1,
        }
    }

    fn update_weights(&mut self, z: usize, y: usize, x: usize, sample: i64, scaled: i64) {
        let error = 2 * sample - scaled;
        let position = x as i64 + (y as i64 - 1) * self.columns as i64;
        let exponent = (self.weight_update_initial_exponent
            + (position >> self.weight_update_interval))
            .clamp(
                self.weight_update_initial_exponent,
                self.weight_update_final_exponent,
            )
            + self.dynamic_range as i64
            - self.weight_resolution as i64;

        let count = self.difference_count(z);
        let (minimum, maximum) = self.weight_limits();
        for (weight, &difference) in self.weights[z].iter_mut().zip(&self.differences[..count]) {
            let signed = if error < 0 { -difference } else { difference };
            let step = if exponent < 0 {
                signed << -exponent
            } else {
                signed >> exponent
            };
            *weight = (*weight + ((step + 1) >> 1)).clamp(minimum, maximum);
        }
    }

    /// Predicts the sample at (z, y, x) of `window` and returns its mapped residual.
    pub fn compress<W: SampleWindow>(
        &mut self,
        window: &W,
        z: usize,
        y: usize,
        x: usize,
    ) -> Result<u32, Ccsds123Error> {
        let sample = window.sample(z, y, x) as i64;
        if !self.limits.contains(sample) {
            return Err(Ccsds123Error::SampleOutOfRange);
        }
        if x == 0 && y == 0 {
            self.init_band(z);
        }
        let prediction = self.predict(window, z, y, x);
        if x + y > 0 {
            self.update_weights(z, y, x, sample, prediction.scaled);
        }
        Ok(map_residual(
            sample,
            prediction.sample,
            prediction.scaled,
            &self.limits,
        ))
    }

    /// Rebuilds the sample at (z, y, x) from its mapped residual, stores it in
    /// `window` and returns it.
    pub fn decompress<W: SampleWindow>(
        &mut self,
        window: &mut W,
        z: usize,
        y: usize,
        x: usize,
        mapped: u32,
    ) -> i32 {
        if x == 0 && y == 0 {
            self.init_band(z);
        }
        let prediction = self.predict(window, z, y, x);
        let sample = unmap_residual(mapped, prediction.sample, prediction.scaled, &self.limits);
        window.set_sample(z, y, x, sample as i32);
        if x + y > 0 {
            self.update_weights(z, y, x, sample, prediction.scaled);
        }
        sample as i32
    }

    pub fn end(&self) {
        debug!(samples = self.samples_predicted, "predictor finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::Cube;

    fn parameters(dynamic_range: u32, prediction_bands: u32) -> CodingParameters {
        let mut parameters = CodingParameters {
            dynamic_range,
            ..Default::default()
        };
        parameters.predictor.prediction_bands = prediction_bands;
        parameters
    }

    fn noise_cube(info: CubeInfo, dynamic_range: u32, seed: u64) -> Cube {
        let limits = SampleLimits::new(dynamic_range, info.signed);
        let span = (limits.maximum - limits.minimum + 1) as u64;
        let mut state = seed;
        let mut cube = Cube::new(info);
        for z in 0..info.bands as usize {
            for y in 0..info.rows as usize {
                for x in 0..info.columns as usize {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    // Smooth ramp plus a little noise
                    let ramp = (x * 3 + y * 5 + z * 7) as u64 % span;
                    let value = (ramp + state % 9) % span;
                    cube.set(z, y, x, (limits.minimum + value as i64) as i32);
                }
            }
        }
        cube
    }

    /// Runs the predictor over `cube` in band sequential order and back.
    fn round_trip(cube: &Cube, parameters: &CodingParameters) -> Result<Vec<u32>, Ccsds123Error> {
        let info = cube.info();
        let limits = parameters.sample_limits(info.signed);
        let mut predictor = Predictor::new(&info, parameters)?;
        let (weight_minimum, weight_maximum) = predictor.weight_limits();
        let mut residuals = Vec::new();
        for z in 0..info.bands as usize {
            for y in 0..info.rows as usize {
                for x in 0..info.columns as usize {
                    let mapped = predictor.compress(cube, z, y, x)?;
                    assert!((mapped as i64) <= (1i64 << parameters.dynamic_range) - 1);
                    assert!(
                        predictor
                            .weights(z)
                            .iter()
                            .all(|&w| w >= weight_minimum && w <= weight_maximum)
                    );
                    residuals.push(mapped);
                }
            }
        }

        let mut decoded = Cube::new(info);
        let mut predictor = Predictor::new(&info, parameters)?;
        let mut next = residuals.iter();
        for z in 0..info.bands as usize {
            for y in 0..info.rows as usize {
                for x in 0..info.columns as usize {
                    let mapped = *next.next().ok_or(Ccsds123Error::EndOfStream)?;
                    let sample = predictor.decompress(&mut decoded, z, y, x, mapped);
                    assert!(limits.contains(sample as i64));
                }
            }
        }
        assert_eq!(&decoded, cube);
        Ok(residuals)
    }

    #[test]
    fn test_mod_r() {
        assert_eq!(mod_r(5, 64), 5);
        assert_eq!(mod_r(i64::MIN, 64), i64::MIN);
        assert_eq!(mod_r(1 << 31, 32), -(1 << 31));
        assert_eq!(mod_r(-1, 32), -1);
        assert_eq!(mod_r((1 << 32) + 7, 32), 7);
        assert_eq!(mod_r((1 << 40) - 3, 40), -3);
    }

    #[test]
    fn test_mapping_is_invertible() {
        for &(dynamic_range, signed) in &[(2u32, false), (3, true), (5, false), (4, true)] {
            let limits = SampleLimits::new(dynamic_range, signed);
            for predicted in limits.minimum..=limits.maximum {
                for scaled in [2 * predicted, 2 * predicted + 1] {
                    let mut seen = vec![false; 1 << dynamic_range];
                    for sample in limits.minimum..=limits.maximum {
                        let mapped = map_residual(sample, predicted, scaled, &limits);
                        assert!(!seen[mapped as usize]);
                        seen[mapped as usize] = true;
                        assert_eq!(unmap_residual(mapped, predicted, scaled, &limits), sample);
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_residual_maps_to_zero() {
        let limits = SampleLimits::new(8, false);
        assert_eq!(map_residual(100, 100, 200, &limits), 0);
        assert_eq!(map_residual(100, 100, 201, &limits), 0);
        assert_eq!(map_residual(101, 100, 200, &limits), 2);
        assert_eq!(map_residual(99, 100, 200, &limits), 1);
        assert_eq!(map_residual(101, 100, 201, &limits), 1);
    }

    #[test]
    fn test_prediction_at_origin() -> Result<(), Ccsds123Error> {
        let unsigned = CubeInfo::new(1, 1, 1, false);
        let cube = Cube::from_samples(unsigned, vec![42])?;
        let mut predictor = Predictor::new(&unsigned, &parameters(8, 15))?;
        predictor.init_band(0);
        assert_eq!(predictor.predict(&cube, 0, 0, 0).sample, 128);

        let signed = CubeInfo::new(2, 1, 1, true);
        let cube = Cube::from_samples(signed, vec![-3, 5])?;
        let mut predictor = Predictor::new(&signed, &parameters(4, 0))?;
        predictor.init_band(0);
        assert_eq!(predictor.predict(&cube, 0, 0, 0).sample, 0);
        predictor.init_band(1);
        assert_eq!(predictor.predict(&cube, 1, 0, 0).sample, 0);

        // With prediction bands the previous band seeds the origin
        let mut predictor = Predictor::new(&signed, &parameters(4, 1))?;
        predictor.init_band(1);
        assert_eq!(predictor.predict(&cube, 1, 0, 0).sample, -3);
        Ok(())
    }

    #[test]
    fn test_single_sample_residual() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1, 1, 1, false);
        let cube = Cube::from_samples(info, vec![42])?;
        let mut predictor = Predictor::new(&info, &parameters(8, 15))?;
        // r = -86 with an even scaled prediction
        assert_eq!(predictor.compress(&cube, 0, 0, 0)?, 171);
        Ok(())
    }

    #[test]
    fn test_default_weight_initialization() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(3, 2, 2, false);
        let mut predictor = Predictor::new(&info, &parameters(12, 2))?;
        predictor.init_band(0);
        assert_eq!(predictor.weights(0), &[0, 0, 0]);
        predictor.init_band(2);
        assert_eq!(predictor.weights(2), &[0, 0, 0, 7 << 10, 7 << 7]);

        let mut reduced = parameters(12, 2);
        reduced.predictor.prediction_mode = PredictionMode::Reduced;
        let mut predictor = Predictor::new(&info, &reduced)?;
        predictor.init_band(0);
        assert!(predictor.weights(0).is_empty());
        predictor.init_band(1);
        assert_eq!(predictor.weights(1), &[7 << 10]);
        Ok(())
    }

    #[test]
    fn test_custom_weight_initialization() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(2, 2, 2, false);
        let mut parameters = parameters(12, 1);
        parameters.predictor.weight_init_method = WeightInitMethod::Custom;
        parameters.predictor.weight_init_resolution = 5;
        parameters.predictor.weight_init_table = Some(vec![vec![1, -2, 0], vec![3, 0, -16, 15]]);
        let mut predictor = Predictor::new(&info, &parameters)?;
        predictor.init_band(1);
        // exponent = 13 + 2 - 5 = 10: w = 2^11 * entry + 2^10 - 1
        let expected: Vec<i64> = [3i64, 0, -16, 15]
            .iter()
            .map(|&t| 2048 * t + 1023)
            .collect();
        assert_eq!(predictor.weights(1), expected.as_slice());

        parameters.predictor.weight_init_table = Some(vec![vec![1, -2, 0]]);
        assert!(Predictor::new(&info, &parameters).is_err());
        Ok(())
    }

    #[test]
    fn test_small_cube_full_prediction() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(2, 2, 2, false);
        let cube = Cube::from_samples(info, vec![10, 11, 12, 13, 14, 15, 16, 17])?;
        let parameters = parameters(8, 1);
        round_trip(&cube, &parameters)?;
        Ok(())
    }

    #[test]
    fn test_round_trip_parameter_grid() -> Result<(), Ccsds123Error> {
        let shapes = [(4u32, 5u32, 6u32), (3, 1, 7), (2, 6, 1), (5, 3, 3)];
        for (index, &(bands, rows, columns)) in shapes.iter().enumerate() {
            for &signed in &[false, true] {
                for &mode in &[PredictionMode::Full, PredictionMode::Reduced] {
                    for &sum_mode in &[LocalSumMode::NeighborOriented, LocalSumMode::ColumnOriented] {
                        let info = CubeInfo::new(bands, rows, columns, signed);
                        let dynamic_range = [6u32, 10, 16, 13][index];
                        let mut parameters = parameters(dynamic_range, 3);
                        parameters.predictor.prediction_mode = mode;
                        parameters.predictor.local_sum_mode = sum_mode;
                        let cube = noise_cube(info, dynamic_range, 0x9E37_79B9 + index as u64);
                        round_trip(&cube, &parameters)?;
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_extreme_weight_updates() -> Result<(), Ccsds123Error> {
        // Large jumps with fast adaptation push weights to their limits
        let info = CubeInfo::new(3, 6, 6, false);
        let mut parameters = parameters(16, 2);
        parameters.predictor.weight_resolution = 4;
        parameters.predictor.weight_update_initial_exponent = -6;
        parameters.predictor.weight_update_final_exponent = -6;
        let mut cube = Cube::new(info);
        for z in 0..3 {
            for y in 0..6 {
                for x in 0..6 {
                    let value = if (x + y + z) % 2 == 0 { 65535 } else { 0 };
                    cube.set(z, y, x, value);
                }
            }
        }
        round_trip(&cube, &parameters)?;
        Ok(())
    }

    #[test]
    fn test_out_of_range_sample() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1, 1, 2, false);
        let cube = Cube::from_samples(info, vec![0, 300])?;
        let mut predictor = Predictor::new(&info, &parameters(8, 0))?;
        predictor.compress(&cube, 0, 0, 0)?;
        assert!(matches!(
            predictor.compress(&cube, 0, 0, 1),
            Err(Ccsds123Error::SampleOutOfRange)
        ));
        Ok(())
    }
}
