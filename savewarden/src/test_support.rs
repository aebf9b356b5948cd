//! Test-only fakes for the process, clock and prompt seams.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::io::clock::Clock;
use crate::io::monitor::ProcessQuery;
use crate::io::process::{LaunchRequest, Launcher};
use crate::io::prompt::{Choice, Namer, Selector};

type PollHook = Box<dyn Fn(u32)>;

/// Process query that replays a fixed liveness script.
///
/// Once the script is exhausted every query reports "not running".
pub struct ScriptedQuery {
    script: RefCell<VecDeque<bool>>,
    polls: Cell<u32>,
    hook: Option<PollHook>,
    fail_from: Option<u32>,
}

impl ScriptedQuery {
    /// Build a script from `(alive, repeat)` runs, e.g. `[(false, 2), (true, 5)]`.
    pub fn from_pattern(pattern: &[(bool, u32)]) -> Self {
        let script = pattern
            .iter()
            .flat_map(|&(alive, repeat)| std::iter::repeat_n(alive, repeat as usize))
            .collect();
        Self {
            script: RefCell::new(script),
            polls: Cell::new(0),
            hook: None,
            fail_from: None,
        }
    }

    /// Run `hook(poll)` before answering each query, simulating the game
    /// mutating its save while it runs.
    pub fn with_hook(mut self, hook: impl Fn(u32) + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Fail every query from poll `poll` on, as a hung or missing lister would.
    pub fn failing_from(mut self, poll: u32) -> Self {
        self.fail_from = Some(poll);
        self
    }
}

impl ProcessQuery for ScriptedQuery {
    fn query(&self, _name: &str) -> Result<String> {
        let poll = self.polls.get() + 1;
        self.polls.set(poll);
        if let Some(hook) = &self.hook {
            hook(poll);
        }
        if self.fail_from.is_some_and(|from| poll >= from) {
            return Err(anyhow!("scripted lister timed out"));
        }
        let alive = self.script.borrow_mut().pop_front().unwrap_or(false);
        Ok(if alive {
            "4242\n".to_string()
        } else {
            String::new()
        })
    }
}

/// Clock that only accumulates requested sleeps.
#[derive(Default)]
pub struct VirtualClock {
    elapsed: Cell<Duration>,
}

impl VirtualClock {
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for VirtualClock {
    fn sleep(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }
}

/// Launcher that records requests instead of spawning anything.
#[derive(Default)]
pub struct RecordingLauncher {
    requests: RefCell<Vec<LaunchRequest>>,
    fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn launches(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.borrow().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn spawn_detached(&self, request: &LaunchRequest) -> Result<()> {
        if self.fail {
            return Err(anyhow!("scripted launch failure"));
        }
        self.requests.borrow_mut().push(request.clone());
        Ok(())
    }
}

/// Selector that replays queued answers and records the offered choices.
#[derive(Default)]
pub struct ScriptedSelector {
    answers: VecDeque<Option<String>>,
    pub offered: Vec<Vec<Choice>>,
}

impl ScriptedSelector {
    pub fn new(answers: Vec<Option<&str>>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(|answer| answer.map(str::to_string))
                .collect(),
            offered: Vec::new(),
        }
    }
}

impl Selector for ScriptedSelector {
    fn select(&mut self, choices: &[Choice]) -> Result<Option<String>> {
        self.offered.push(choices.to_vec());
        Ok(self.answers.pop_front().flatten())
    }
}

/// Namer that replays queued answers and counts how often it was asked.
#[derive(Default)]
pub struct ScriptedNamer {
    answers: VecDeque<Option<String>>,
    pub asked: u32,
}

impl ScriptedNamer {
    pub fn new(answers: Vec<Option<&str>>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(|answer| answer.map(str::to_string))
                .collect(),
            asked: 0,
        }
    }
}

impl Namer for ScriptedNamer {
    fn name(&mut self) -> Result<Option<String>> {
        self.asked += 1;
        Ok(self.answers.pop_front().flatten())
    }
}

/// Selector and namer behind one value, as the terminal prompt is.
#[derive(Default)]
pub struct ScriptedPrompt {
    pub selector: ScriptedSelector,
    pub namer: ScriptedNamer,
}

impl ScriptedPrompt {
    pub fn new(selections: Vec<Option<&str>>, names: Vec<Option<&str>>) -> Self {
        Self {
            selector: ScriptedSelector::new(selections),
            namer: ScriptedNamer::new(names),
        }
    }
}

impl Selector for ScriptedPrompt {
    fn select(&mut self, choices: &[Choice]) -> Result<Option<String>> {
        self.selector.select(choices)
    }
}

impl Namer for ScriptedPrompt {
    fn name(&mut self) -> Result<Option<String>> {
        self.namer.name()
    }
}

/// Create `dir` containing the state artifact `artifact` with `bytes`.
pub fn write_save(dir: &Path, artifact: &str, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(artifact), bytes)?;
    Ok(())
}
