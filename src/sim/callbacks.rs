use crate::scene::BallState;

/// Hooks run around every step.
///
/// `start_of_step` sees the state before the unconstrained flow,
/// `end_of_step` sees it after periodic boundaries were enforced.
pub trait StepCallback {
    fn start_of_step(&mut self, _iteration: u64, _state: &BallState) {}

    fn end_of_step(&mut self, _iteration: u64, _state: &BallState) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoCallback;

impl StepCallback for NoCallback {}
