//! Evaluator backed by a Python model object.

use numpy::PyArray1;
use pyo3::prelude::*;

use crate::error::EvaluatorError;
use crate::nn::{EncodedState, Evaluator, Inference, TrainingConfig};
use crate::training::TrainingExample;

use super::py_nn::{PyTrainingConfig, PyTrainingExample};

/// Wraps a Python object exposing:
///
/// - `infer(tensor: np.ndarray, shape: list[int]) -> (list[float], float)`
/// - `train(examples: list[TrainingExample], config: TrainingConfig) -> model | None`
///
/// `train` may return a new model object or `None` to keep training in
/// place on the same object.
#[pyclass(name = "Evaluator", frozen)]
pub struct PyEvaluator {
    model: PyObject,
    action_space_size: usize,
}

#[pymethods]
impl PyEvaluator {
    #[new]
    fn new(model: PyObject, action_space_size: usize) -> Self {
        Self {
            model,
            action_space_size,
        }
    }

    #[getter]
    fn action_space_size(&self) -> usize {
        self.action_space_size
    }

    /// The wrapped Python model.
    #[getter]
    fn model(&self, py: Python<'_>) -> PyObject {
        self.model.clone_ref(py)
    }

    fn __repr__(&self) -> String {
        format!("Evaluator(action_space_size={})", self.action_space_size)
    }
}

impl Evaluator for PyEvaluator {
    fn infer(&self, state: &EncodedState) -> Result<Inference, EvaluatorError> {
        Python::with_gil(|py| {
            let tensor = PyArray1::from_slice_bound(py, &state.tensor);
            let output = self
                .model
                .call_method1(py, "infer", (tensor, state.shape.clone()))
                .map_err(|e| EvaluatorError::InferenceFailed(e.to_string()))?;
            let (policy, value): (Vec<f32>, f32) = output
                .extract(py)
                .map_err(|e| EvaluatorError::InferenceFailed(e.to_string()))?;
            Ok(Inference { policy, value })
        })
    }

    fn train(&self, examples: &[TrainingExample], config: &TrainingConfig) -> Result<Self, EvaluatorError> {
        Python::with_gil(|py| {
            let batch: Vec<PyTrainingExample> = examples.iter().cloned().map(PyTrainingExample).collect();
            let output = self
                .model
                .call_method1(py, "train", (batch, PyTrainingConfig(config.clone())))
                .map_err(|e| EvaluatorError::TrainingFailed(e.to_string()))?;

            let model = if output.is_none(py) {
                self.model.clone_ref(py)
            } else {
                output
            };
            Ok(Self {
                model,
                action_space_size: self.action_space_size,
            })
        })
    }
}
