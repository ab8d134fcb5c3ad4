use statekit_core::{CancelToken, Signal, signal};

#[derive(Default)]
pub struct StepperConfig<S> {
    pub steps: Vec<S>,
    pub cancel: Option<CancelToken>,
}

/// Linear wizard state: an ordered step list and a clamped active index.
pub struct Stepper<S: Clone + PartialEq + 'static> {
    steps: Signal<Vec<S>>,
    active: Signal<usize>,
    token: CancelToken,
}

impl<S: Clone + PartialEq + 'static> Stepper<S> {
    pub fn new(config: StepperConfig<S>) -> Self {
        Self {
            steps: signal(config.steps),
            active: signal(0),
            token: CancelToken::linked(config.cancel.as_ref()),
        }
    }

    pub fn steps(&self) -> Vec<S> {
        self.steps.get()
    }

    pub fn steps_signal(&self) -> &Signal<Vec<S>> {
        &self.steps
    }

    pub fn active_step_index(&self) -> usize {
        self.active.get()
    }

    pub fn active_step(&self) -> Option<S> {
        self.steps.with(|s| s.get(self.active.get()).cloned())
    }

    pub fn set_steps(&self, steps: Vec<S>) {
        self.steps.set(steps);
        // Keep the index valid for the new list.
        self.go_to_step(self.active.get());
    }

    pub fn go_to_step(&self, index: usize) {
        let last = self.steps.with(|s| s.len().saturating_sub(1));
        self.active.set(index.min(last));
    }

    pub fn next_step(&self) {
        self.go_to_step(self.active.get() + 1);
    }

    pub fn prev_step(&self) {
        self.go_to_step(self.active.get().saturating_sub(1));
    }

    pub fn add_step(&self, step: S) {
        if self.steps.with(|s| s.contains(&step)) {
            return;
        }
        self.steps.update(|s| s.push(step));
    }

    pub fn remove_step(&self, step: &S) {
        self.steps.update(|s| s.retain(|it| it != step));
        self.go_to_step(self.active.get());
    }

    pub fn check_step_completed(&self, index: usize) -> bool {
        self.active.get() > index
    }

    pub fn is_last_step(&self) -> bool {
        self.steps.with(|s| s.len().saturating_sub(1)) == self.active.get()
    }

    pub fn is_next_step_last(&self) -> bool {
        self.steps.with(|s| s.len().saturating_sub(1)) == self.active.get() + 1
    }

    pub fn has_prev_step(&self) -> bool {
        self.active.get() != 0
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }
}
