//! Python bindings.
//!
//! A Python model drives search through `Evaluator`; self-play and arena
//! matches run in Rust with the GIL released.
//!
//! # Quick Start
//!
//! ```python
//! import alphazero as az
//!
//! class Model:
//!     def infer(self, tensor, shape):
//!         return [1.0 / 7] * 7, 0.0
//!
//!     def train(self, examples, config):
//!         return None
//!
//! evaluator = az.Evaluator(Model(), action_space_size=7)
//! examples = az.self_play_connect4(evaluator, num_workers=2, simulations=50)
//! states, policies, values = az.examples_to_numpy(examples)
//! ```

use pyo3::prelude::*;

mod py_evaluator;
mod py_nn;
mod py_self_play;

pub use py_evaluator::*;
pub use py_nn::*;
pub use py_self_play::*;

/// AlphaZero self-play and arena evaluation.
#[pymodule]
fn alphazero(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyEncodedState>()?;
    m.add_class::<PyTrainingExample>()?;
    m.add_class::<PyTrainingConfig>()?;
    m.add_class::<PyEvaluator>()?;
    m.add_class::<PyArenaVerdict>()?;

    m.add_function(wrap_pyfunction!(examples_to_numpy, m)?)?;
    m.add_function(wrap_pyfunction!(self_play_connect4, m)?)?;
    m.add_function(wrap_pyfunction!(arena_connect4, m)?)?;

    Ok(())
}
