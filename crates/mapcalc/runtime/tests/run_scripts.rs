// Mapcalc
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Whole-image evaluation scenarios

use mapcalc_common::{Bounds, Image, Raster};
use mapcalc_compiler::{Compiler, CompilerConfig, EvaluationModel, ImageRole, ImageRoles};
use mapcalc_runtime::{MapScript, ProgressListener, Runtime, RuntimeError, UpdateInterval};
use proptest::prelude::*;
use std::sync::Arc;

fn roles(with_source: bool) -> ImageRoles {
    let mut roles: ImageRoles = [("dest".to_string(), ImageRole::Destination)].into_iter().collect();
    if with_source {
        roles.insert("src".to_string(), ImageRole::Source);
    }
    roles
}

fn instance(source: &str, model: EvaluationModel, with_source: bool) -> Box<dyn Runtime> {
    let compiler = Compiler::new(CompilerConfig::for_model(model)).unwrap();
    MapScript::new(source, roles(with_source)).with_compiler(compiler).runtime_instance().unwrap()
}

fn raster(width: u32, height: u32) -> Arc<Raster> {
    Arc::new(Raster::new(Bounds::sized(width, height), 1).unwrap())
}

#[test]
fn test_position_sum_over_100_by_100() {
    for model in [EvaluationModel::Direct, EvaluationModel::Indirect] {
        let mut runtime = instance("dest = x() + y();", model, false);
        let dest = raster(100, 100);
        runtime.bind_destination("dest", dest.clone()).unwrap();
        assert_eq!(runtime.evaluate_all(None).unwrap(), 10_000);
        for y in 0..100 {
            for x in 0..100 {
                assert_eq!(dest.sample(x, y, 0), Some((x + y) as f64));
            }
        }
    }
}

#[test]
fn test_image_scope_counter_follows_scan_order() {
    let (width, height) = (7u32, 5u32);
    let mut runtime = instance("init { n = 0; } dest = n++;", EvaluationModel::Direct, false);
    let dest = Arc::new(Raster::new(Bounds::new(-3, 10, width, height), 1).unwrap());
    runtime.bind_destination("dest", dest.clone()).unwrap();
    runtime.evaluate_all(None).unwrap();
    let expected: Vec<f64> = (0..width * height).map(f64::from).collect();
    assert_eq!(dest.band_values(0), expected);
    assert_eq!(runtime.get_variable("n").unwrap(), f64::from(width * height));
}

#[test]
fn test_outside_value_versus_error() {
    let src = Arc::new(Raster::filled(Bounds::sized(3, 3), 1, 5.0).unwrap());

    let mut runtime = instance("options { outside = 0; } dest = src[-1, -1];", EvaluationModel::Direct, true);
    let dest = raster(3, 3);
    runtime.bind_source("src", src.clone()).unwrap();
    runtime.bind_destination("dest", dest.clone()).unwrap();
    runtime.evaluate_all(None).unwrap();
    assert_eq!(dest.sample(0, 0, 0), Some(0.0));
    assert_eq!(dest.sample(1, 1, 0), Some(5.0));

    let mut runtime = instance("dest = src[-1, -1];", EvaluationModel::Direct, true);
    runtime.bind_source("src", src).unwrap();
    runtime.bind_destination("dest", raster(3, 3)).unwrap();
    assert!(matches!(runtime.evaluate_all(None), Err(RuntimeError::OutOfBounds { .. })));
}

#[test]
fn test_absolute_positions() {
    let src = Arc::new(Raster::from_fn(Bounds::sized(4, 1), 1, |x, _, _| x as f64 * 3.0).unwrap());
    let mut runtime = instance("dest = src[$3, $0];", EvaluationModel::Indirect, true);
    let dest = raster(4, 1);
    runtime.bind_source("src", src).unwrap();
    runtime.bind_destination("dest", dest.clone()).unwrap();
    runtime.evaluate_all(None).unwrap();
    assert_eq!(dest.band_values(0), vec![9.0; 4]);
}

#[test]
fn test_conditional_propagates_null() {
    let src = Arc::new(Raster::from_fn(Bounds::sized(4, 1), 1, |x, _, _| [f64::NAN, 0.0, 2.0, -2.0][x as usize]).unwrap());
    let cases: [(&str, [f64; 4]); 4] = [
        ("dest = if(src);", [f64::NAN, 0.0, 1.0, 1.0]),
        ("dest = if(src, 7);", [f64::NAN, 0.0, 7.0, 7.0]),
        ("dest = if(src, 7, 8);", [f64::NAN, 8.0, 7.0, 7.0]),
        ("dest = con(src, 7, 8, 9);", [f64::NAN, 8.0, 7.0, 9.0]),
    ];
    for (script, expected) in cases {
        let mut runtime = instance(script, EvaluationModel::Direct, true);
        let dest = raster(4, 1);
        runtime.bind_source("src", src.clone()).unwrap();
        runtime.bind_destination("dest", dest.clone()).unwrap();
        runtime.evaluate_all(None).unwrap();
        let values = dest.band_values(0);
        assert!(values[0].is_nan(), "{script}");
        assert_eq!(&values[1..], &expected[1..], "{script}");
    }
}

#[test]
fn test_injected_variable_drives_output() {
    let mut runtime = instance("init { gain = 2; } dest = gain * x();", EvaluationModel::Direct, false);
    let dest = raster(3, 1);
    runtime.set_variable("gain", Some(10.0)).unwrap();
    runtime.bind_destination("dest", dest.clone()).unwrap();
    runtime.evaluate_all(None).unwrap();
    assert_eq!(dest.band_values(0), vec![0.0, 10.0, 20.0]);

    runtime.set_variable("gain", None).unwrap();
    runtime.evaluate_all(None).unwrap();
    assert_eq!(dest.band_values(0), vec![0.0, 2.0, 4.0]);
}

#[derive(Default)]
struct Counting {
    updates: Vec<u64>,
    started: bool,
    finished: bool,
}

impl ProgressListener for Counting {
    fn update_interval(&self) -> UpdateInterval {
        UpdateInterval::Proportion(0.5)
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn update(&mut self, done: u64) {
        self.updates.push(done);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn test_progress_is_reported() {
    let mut runtime = instance("dest = 1;", EvaluationModel::Direct, false);
    runtime.bind_destination("dest", raster(5, 2)).unwrap();
    let mut progress = Counting::default();
    runtime.evaluate_all(Some(&mut progress)).unwrap();
    assert!(progress.started && progress.finished);
    assert_eq!(progress.updates, vec![5, 10]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn copy_reproduces_source(width in 1u32..12, height in 1u32..12, seed in 0u64..1000) {
        let src = Arc::new(Raster::from_fn(Bounds::sized(width, height), 1, |x, y, _| ((x * 31 + y * 17) as u64 ^ seed) as f64).unwrap());
        let mut runtime = instance("dest = src;", EvaluationModel::Direct, true);
        let dest = raster(width, height);
        runtime.bind_source("src", src.clone()).unwrap();
        runtime.bind_destination("dest", dest.clone()).unwrap();
        runtime.evaluate_all(None).unwrap();
        prop_assert_eq!(dest.band_values(0), src.band_values(0));
    }

    #[test]
    fn logic_with_null_is_null(value in -100.0f64..100.0) {
        let src = Arc::new(Raster::filled(Bounds::sized(1, 1), 1, f64::NAN).unwrap());
        for op in ["&&", "||", "^|", ">", ">=", "<", "<=", "==", "!="] {
            let script = format!("dest = src {op} {value};");
            let mut runtime = instance(&script, EvaluationModel::Indirect, true);
            let dest = raster(1, 1);
            runtime.bind_source("src", src.clone()).unwrap();
            runtime.bind_destination("dest", dest.clone()).unwrap();
            runtime.evaluate_all(None).unwrap();
            prop_assert!(dest.sample(0, 0, 0).unwrap().is_nan(), "{}", script);
        }
    }
}
