use std::collections::VecDeque;
use tracing::debug;

use super::state::ControllerSnapshot;
use super::{ControllerError, ControllerSource};

/// Replays a fixed sequence of snapshots, one per poll.
///
/// Once the script runs out the last snapshot keeps being reported, which
/// mirrors a physical controller that simply stops changing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedController {
    script: VecDeque<ControllerSnapshot>,
    last: ControllerSnapshot,
    polls: u64,
}

impl ScriptedController {
    pub fn new(script: impl IntoIterator<Item = ControllerSnapshot>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: ControllerSnapshot::neutral(),
            polls: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl ControllerSource for ScriptedController {
    fn poll(&mut self) -> Result<ControllerSnapshot, ControllerError> {
        self.polls += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        } else {
            debug!("Script exhausted after {} polls, holding last snapshot", self.polls);
        }
        Ok(self.last)
    }
}
