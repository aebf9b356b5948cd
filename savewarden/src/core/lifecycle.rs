//! Deterministic session lifecycle state machine.
//!
//! The machine only counts polls and decides transitions; sleeping, querying
//! the process table and autosaving belong to the supervisor that drives it.

/// Observable state of the supervised process for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    AwaitingStart,
    Running,
    Exited,
}

/// Polling limits for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleLimits {
    /// Negative polls tolerated while awaiting start before giving up.
    pub start_attempts: u32,
    /// Run an autosave check on every n-th poll while running.
    pub autosave_every: u32,
}

/// What the supervisor must do after feeding a poll result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// The executable was never launched; the observation was discarded.
    NotLaunched,
    /// Sleep one interval and poll again.
    Wait,
    /// Process just appeared: take the baseline snapshot, then wait.
    Started,
    /// Still running and due for an autosave check, then wait.
    CheckAutosave,
    /// Process gone; the session is over.
    Exited,
    /// Process never appeared within the start budget.
    StartTimedOut,
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: ProcessState,
    limits: LifecycleLimits,
    start_polls: u32,
    running_polls: u32,
}

impl Lifecycle {
    pub fn new(limits: LifecycleLimits) -> Self {
        Self {
            state: ProcessState::NotStarted,
            limits,
            start_polls: 0,
            running_polls: 0,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Record that the executable was spawned.
    pub fn launched(&mut self) {
        if self.state == ProcessState::NotStarted {
            self.state = ProcessState::AwaitingStart;
        }
    }

    /// Feed one liveness observation and return the follow-up action.
    ///
    /// Observations before launch or after `Exited` leave the state alone.
    pub fn observe(&mut self, alive: bool) -> PollAction {
        match self.state {
            ProcessState::NotStarted => PollAction::NotLaunched,
            ProcessState::Exited => PollAction::Exited,
            ProcessState::AwaitingStart => {
                self.start_polls += 1;
                if alive {
                    self.state = ProcessState::Running;
                    PollAction::Started
                } else if self.start_polls >= self.limits.start_attempts {
                    self.state = ProcessState::Exited;
                    PollAction::StartTimedOut
                } else {
                    PollAction::Wait
                }
            }
            ProcessState::Running => {
                if !alive {
                    self.state = ProcessState::Exited;
                    return PollAction::Exited;
                }
                self.running_polls += 1;
                if self.limits.autosave_every > 0
                    && self.running_polls % self.limits.autosave_every == 0
                {
                    PollAction::CheckAutosave
                } else {
                    PollAction::Wait
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: LifecycleLimits = LifecycleLimits {
        start_attempts: 15,
        autosave_every: 15,
    };

    #[test]
    fn observations_before_launch_are_ignored() {
        let mut lifecycle = Lifecycle::new(LIMITS);
        assert_eq!(lifecycle.observe(true), PollAction::NotLaunched);
        assert_eq!(lifecycle.observe(false), PollAction::NotLaunched);
        assert_eq!(lifecycle.state(), ProcessState::NotStarted);
    }

    #[test]
    fn start_detected_on_third_poll() {
        let mut lifecycle = Lifecycle::new(LIMITS);
        lifecycle.launched();
        assert_eq!(lifecycle.observe(false), PollAction::Wait);
        assert_eq!(lifecycle.state(), ProcessState::AwaitingStart);
        assert_eq!(lifecycle.observe(false), PollAction::Wait);
        assert_eq!(lifecycle.observe(true), PollAction::Started);
        assert_eq!(lifecycle.state(), ProcessState::Running);
    }

    #[test]
    fn start_times_out_after_limit() {
        let mut lifecycle = Lifecycle::new(LIMITS);
        lifecycle.launched();
        for _ in 0..14 {
            assert_eq!(lifecycle.observe(false), PollAction::Wait);
        }
        assert_eq!(lifecycle.observe(false), PollAction::StartTimedOut);
        assert_eq!(lifecycle.state(), ProcessState::Exited);
        assert_eq!(lifecycle.observe(true), PollAction::Exited);
    }

    #[test]
    fn autosave_check_every_fifteenth_running_poll() {
        let mut lifecycle = Lifecycle::new(LIMITS);
        lifecycle.launched();
        assert_eq!(lifecycle.observe(true), PollAction::Started);

        let actions: Vec<PollAction> = (0..30).map(|_| lifecycle.observe(true)).collect();
        let checks: Vec<usize> = actions
            .iter()
            .enumerate()
            .filter(|(_, action)| **action == PollAction::CheckAutosave)
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(checks, vec![15, 30]);
    }

    #[test]
    fn exit_is_terminal() {
        let mut lifecycle = Lifecycle::new(LIMITS);
        lifecycle.launched();
        lifecycle.observe(true);
        assert_eq!(lifecycle.observe(false), PollAction::Exited);
        assert_eq!(lifecycle.state(), ProcessState::Exited);
        lifecycle.launched();
        assert_eq!(lifecycle.state(), ProcessState::Exited);
    }
}
