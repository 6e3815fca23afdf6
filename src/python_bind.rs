use nalgebra::Point2;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::config::Config;
use crate::entry;
use crate::error::ProfileError;
use crate::outline::profiler::create_profile;
use crate::outline::Outline;
use crate::processing;
use crate::profile::{Landmark, Profile, Segment, SegmentId, SegmentedProfile};

impl From<ProfileError> for PyErr {
    fn from(err: ProfileError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn parse_landmark(name: &str) -> PyResult<Landmark> {
    Ok(name.parse::<Landmark>()?)
}

#[pyclass]
#[derive(Debug, Clone)]
pub struct PyOutline {
    inner: Outline,
}

#[pymethods]
impl PyOutline {
    #[new]
    fn new(points: Vec<(f64, f64)>) -> PyResult<Self> {
        let points = points.into_iter().map(|(x, y)| Point2::new(x, y)).collect();
        Ok(Self {
            inner: Outline::new(points)?,
        })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        let com = self.inner.centre_of_mass();
        format!(
            "Outline(points={}, com=({:.2}, {:.2}))",
            self.inner.len(),
            com.x,
            com.y
        )
    }

    fn points(&self) -> Vec<(f64, f64)> {
        self.inner.points().iter().map(|p| (p.x, p.y)).collect()
    }

    fn centre_of_mass(&self) -> (f64, f64) {
        let com = self.inner.centre_of_mass();
        (com.x, com.y)
    }

    fn area(&self) -> f64 {
        self.inner.area()
    }

    fn perimeter(&self) -> f64 {
        self.inner.perimeter()
    }

    /// Profile values for `kind` ("angle", "radius" or "diameter").
    #[pyo3(signature = (kind = "angle", window = 5))]
    fn profile(&self, kind: &str, window: usize) -> PyResult<Vec<f64>> {
        let profile = create_profile(&self.inner, kind.parse()?, window)?;
        Ok(profile.values().to_vec())
    }

    fn resample(&self, n: usize) -> PyResult<PyOutline> {
        Ok(Self {
            inner: processing::interpolate_outline(&self.inner, n)?,
        })
    }
}

#[pyclass]
#[derive(Debug, Clone)]
pub struct PySegmentedProfile {
    inner: SegmentedProfile,
}

impl From<SegmentedProfile> for PySegmentedProfile {
    fn from(inner: SegmentedProfile) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl PySegmentedProfile {
    /// `segments` are `(id, start, end)` with `id` a UUID string; an empty
    /// list gives an unsegmented profile.
    #[new]
    #[pyo3(signature = (values, segments = Vec::new(), landmarks = HashMap::new()))]
    fn new(
        values: Vec<f64>,
        segments: Vec<(String, usize, usize)>,
        landmarks: HashMap<String, usize>,
    ) -> PyResult<Self> {
        let profile = Profile::new(values)?;
        let len = profile.len();
        let landmarks = landmarks
            .iter()
            .map(|(name, index)| Ok((parse_landmark(name)?, *index)))
            .collect::<PyResult<Vec<_>>>()?;

        let inner = if segments.is_empty() {
            let mut sp = SegmentedProfile::unsegmented(profile)?;
            for (lm, index) in landmarks {
                sp.set_landmark(lm, index)?;
            }
            sp
        } else {
            let segments = segments
                .into_iter()
                .map(|(id, start, end)| {
                    let id = id
                        .parse::<SegmentId>()
                        .map_err(|e| PyValueError::new_err(format!("bad segment id {:?}: {}", id, e)))?;
                    Ok(Segment::new(id, start, end, len)?)
                })
                .collect::<PyResult<Vec<_>>>()?;
            SegmentedProfile::new(profile, segments, landmarks)?
        };
        Ok(Self { inner })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "SegmentedProfile(length={}, segments={}, landmarks={})",
            self.inner.len(),
            self.inner.segment_count(),
            self.inner.landmarks().len()
        )
    }

    fn values(&self) -> Vec<f64> {
        self.inner.profile().values().to_vec()
    }

    fn segments(&self) -> Vec<(String, usize, usize)> {
        self.inner
            .segments()
            .iter()
            .map(|s| (s.id.to_string(), s.start(), s.end()))
            .collect()
    }

    fn landmarks(&self) -> HashMap<String, usize> {
        self.inner
            .landmarks()
            .iter()
            .map(|(lm, i)| (lm.to_string(), *i))
            .collect()
    }

    fn set_landmark(&mut self, name: &str, index: usize) -> PyResult<Option<usize>> {
        Ok(self.inner.set_landmark(parse_landmark(name)?, index)?)
    }

    fn validate(&self) -> PyResult<()> {
        Ok(self.inner.validate()?)
    }

    fn start_from(&self, index: usize) -> PyResult<PySegmentedProfile> {
        Ok(self.inner.start_from(index)?.into())
    }

    fn reverse(&self) -> PyResult<PySegmentedProfile> {
        Ok(self.inner.reverse()?.into())
    }
}

#[pyfunction]
fn interpolate(sp: &PySegmentedProfile, new_len: usize) -> PyResult<PySegmentedProfile> {
    Ok(processing::interpolate(&sp.inner, new_len)?.into())
}

/// Returns the new index, or `None` when nothing could be matched.
#[pyfunction]
fn snap_landmark(
    mut sp: PyRefMut<'_, PySegmentedProfile>,
    outline: &PyOutline,
    landmark: &str,
    x: f64,
    y: f64,
) -> PyResult<Option<usize>> {
    let outcome = processing::snap_landmark(
        &mut sp.inner,
        &outline.inner,
        parse_landmark(landmark)?,
        Point2::new(x, y),
    )?;
    Ok(outcome.map(|o| o.index))
}

/// Returns `(target id, source id)` pairs.
#[pyfunction]
fn remap(
    source: &PySegmentedProfile,
    mut target: PyRefMut<'_, PySegmentedProfile>,
) -> PyResult<Vec<(String, String)>> {
    let report = processing::remap(&source.inner, &mut target.inner)?;
    Ok(report
        .mapping
        .iter()
        .map(|(t, s)| (t.to_string(), s.to_string()))
        .collect())
}

fn load_config(path: Option<&str>) -> PyResult<Config> {
    match path {
        Some(p) => Config::load(p).map_err(|e| PyRuntimeError::new_err(format!("{:#}", e))),
        None => Ok(Config::default()),
    }
}

/// Returns `(remapped, unmatched, failed)`.
#[pyfunction]
#[pyo3(signature = (source_path, target_path, output_path, config_path = None))]
fn run_migration_py(
    source_path: &str,
    target_path: &str,
    output_path: &str,
    config_path: Option<&str>,
) -> PyResult<(usize, usize, usize)> {
    let config = load_config(config_path)?;
    let summary = entry::run_migration(source_path, target_path, output_path, &config)
        .map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))?;
    Ok((summary.remapped, summary.unmatched, summary.failed))
}

/// Returns `(applied, unmatched, failed)`.
#[pyfunction]
#[pyo3(signature = (dataset_path, landmark_path, output_path, config_path = None))]
fn run_landmark_import_py(
    dataset_path: &str,
    landmark_path: &str,
    output_path: &str,
    config_path: Option<&str>,
) -> PyResult<(usize, usize, usize)> {
    let config = load_config(config_path)?;
    let summary = entry::run_landmark_import(dataset_path, landmark_path, output_path, &config)
        .map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))?;
    Ok((summary.applied, summary.unmatched, summary.failed))
}

#[pyfunction]
#[pyo3(signature = (dataset_path, output_path, config_path = None))]
fn run_export_py(dataset_path: &str, output_path: &str, config_path: Option<&str>) -> PyResult<usize> {
    let config = load_config(config_path)?;
    entry::run_export(dataset_path, output_path, &config)
        .map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))
}

/// This is the module importable from Python:
///
/// ```python
/// import nucleoprofile as npf
/// sp = npf.PySegmentedProfile(values, [(id_a, 10, 55), (id_b, 55, 10)], {"REFERENCE": 10})
/// short = npf.interpolate(sp, 50)
/// ```
#[pymodule]
fn nucleoprofile(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_function(wrap_pyfunction!(interpolate, m)?)?;
    m.add_function(wrap_pyfunction!(snap_landmark, m)?)?;
    m.add_function(wrap_pyfunction!(remap, m)?)?;
    m.add_function(wrap_pyfunction!(run_migration_py, m)?)?;
    m.add_function(wrap_pyfunction!(run_landmark_import_py, m)?)?;
    m.add_function(wrap_pyfunction!(run_export_py, m)?)?;

    m.add_class::<PyOutline>()?;
    m.add_class::<PySegmentedProfile>()?;
    Ok(())
}
