//! Tensor and training-data bindings for Python.

use numpy::{PyArray1, PyArray2, PyArrayMethods};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::nn::{EncodedState, TrainingConfig};
use crate::training::TrainingExample;

/// Python wrapper for EncodedState.
#[pyclass(name = "EncodedState")]
#[derive(Clone, Debug)]
pub struct PyEncodedState(pub EncodedState);

#[pymethods]
impl PyEncodedState {
    /// Create a new encoded state from tensor data and shape.
    #[new]
    fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        Self(EncodedState::new(tensor, shape))
    }

    #[getter]
    fn shape(&self) -> Vec<usize> {
        self.0.shape.clone()
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }

    /// Flat tensor as a numpy array.
    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f32>> {
        PyArray1::from_slice_bound(py, &self.0.tensor)
    }

    fn __repr__(&self) -> String {
        format!("EncodedState(shape={:?}, len={})", self.0.shape, self.0.len())
    }
}

/// Python wrapper for TrainingExample.
#[pyclass(name = "TrainingExample")]
#[derive(Clone, Debug)]
pub struct PyTrainingExample(pub TrainingExample);

#[pymethods]
impl PyTrainingExample {
    #[getter]
    fn state(&self) -> PyEncodedState {
        PyEncodedState(self.0.state.clone())
    }

    /// Target policy (tempered visit distribution).
    #[getter]
    fn policy(&self) -> Vec<f32> {
        self.0.policy.clone()
    }

    /// Outcome from the mover's perspective.
    #[getter]
    fn value(&self) -> f32 {
        self.0.value
    }

    fn state_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f32>> {
        PyArray1::from_slice_bound(py, &self.0.state.tensor)
    }

    fn policy_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f32>> {
        PyArray1::from_slice_bound(py, &self.0.policy)
    }

    fn __repr__(&self) -> String {
        format!(
            "TrainingExample(value={:.2}, state_dim={}, actions={})",
            self.0.value,
            self.0.state.len(),
            self.0.policy.len()
        )
    }
}

/// Python view of the training hyperparameters handed to `train`.
#[pyclass(name = "TrainingConfig")]
#[derive(Clone, Debug)]
pub struct PyTrainingConfig(pub TrainingConfig);

#[pymethods]
impl PyTrainingConfig {
    #[new]
    #[pyo3(signature = (
        batch_size = 32,
        epochs = 30,
        learning_rate = 0.001,
        gradient_accumulation_steps = 1,
        max_grad_norm = 1.0
    ))]
    fn new(
        batch_size: usize,
        epochs: u32,
        learning_rate: f32,
        gradient_accumulation_steps: u32,
        max_grad_norm: f32,
    ) -> Self {
        Self(
            TrainingConfig::default()
                .with_batch_size(batch_size)
                .with_epochs(epochs)
                .with_learning_rate(learning_rate)
                .with_gradient_accumulation_steps(gradient_accumulation_steps)
                .with_max_grad_norm(max_grad_norm),
        )
    }

    #[getter]
    fn batch_size(&self) -> usize {
        self.0.batch_size
    }

    #[getter]
    fn epochs(&self) -> u32 {
        self.0.epochs
    }

    #[getter]
    fn learning_rate(&self) -> f32 {
        self.0.learning_rate
    }

    #[getter]
    fn gradient_accumulation_steps(&self) -> u32 {
        self.0.gradient_accumulation_steps
    }

    #[getter]
    fn max_grad_norm(&self) -> f32 {
        self.0.max_grad_norm
    }

    fn __repr__(&self) -> String {
        format!(
            "TrainingConfig(batch_size={}, epochs={}, lr={})",
            self.0.batch_size, self.0.epochs, self.0.learning_rate
        )
    }
}

/// Stack examples into `(states [N, S], policies [N, A], values [N])`.
#[pyfunction]
pub fn examples_to_numpy<'py>(
    py: Python<'py>,
    examples: Vec<PyTrainingExample>,
) -> PyResult<(
    Bound<'py, PyArray2<f32>>,
    Bound<'py, PyArray2<f32>>,
    Bound<'py, PyArray1<f32>>,
)> {
    let Some(first) = examples.first() else {
        return Ok((
            PyArray2::zeros_bound(py, [0, 0], false),
            PyArray2::zeros_bound(py, [0, 0], false),
            PyArray1::zeros_bound(py, [0], false),
        ));
    };

    let n = examples.len();
    let state_dim = first.0.state.len();
    let policy_dim = first.0.policy.len();

    let mut states = Vec::with_capacity(n * state_dim);
    let mut policies = Vec::with_capacity(n * policy_dim);
    let mut values = Vec::with_capacity(n);

    for (i, example) in examples.iter().enumerate() {
        let example = &example.0;
        if example.state.len() != state_dim || example.policy.len() != policy_dim {
            return Err(PyValueError::new_err(format!(
                "example {i} has shape ({}, {}), expected ({state_dim}, {policy_dim})",
                example.state.len(),
                example.policy.len()
            )));
        }
        states.extend_from_slice(&example.state.tensor);
        policies.extend_from_slice(&example.policy);
        values.push(example.value);
    }

    let states = PyArray1::from_vec_bound(py, states)
        .reshape([n, state_dim])
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let policies = PyArray1::from_vec_bound(py, policies)
        .reshape([n, policy_dim])
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let values = PyArray1::from_vec_bound(py, values);

    Ok((states, policies, values))
}
