//! Pure client session state machine.
//!
//! Owns no I/O: the REPL feeds it user lines and relay events and acts on
//! the returned instructions. Keeping it pure makes every transition unit
//! testable without a server.

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// At the prompt, ready for user input.
    Idle,
    /// A command is in flight; stdin is not read until the turn ends.
    AwaitingTurn,
    /// The agent asked a yes/no question; stdin reads the answer.
    AwaitingDecision,
}

/// What to do with a line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    StartTask(String),
    SendMessage(String),
    Exit,
    Ignore,
}

/// What to do with a line typed at the decision prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    Primary,
    Secondary,
    Reprompt,
}

#[derive(Debug)]
pub struct ClientSession {
    phase: Phase,
    task_started: bool,
    last_chunk: Option<String>,
}

impl ClientSession {
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            task_started: false,
            last_chunk: None,
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the REPL should read stdin right now.
    pub const fn reads_input(&self) -> bool {
        !matches!(self.phase, Phase::AwaitingTurn)
    }

    /// Classify a line typed at the main prompt. The first non-command
    /// line starts the task; later lines continue it.
    pub fn on_user_input(&mut self, line: &str) -> InputAction {
        let text = line.trim();
        if text.is_empty() {
            return InputAction::Ignore;
        }
        if text == "exit" || text == "quit" {
            return InputAction::Exit;
        }

        self.phase = Phase::AwaitingTurn;
        if self.task_started {
            InputAction::SendMessage(text.to_string())
        } else {
            self.task_started = true;
            InputAction::StartTask(text.to_string())
        }
    }

    /// Classify a line typed at the decision prompt.
    pub fn on_decision_input(&mut self, line: &str) -> DecisionAction {
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => {
                self.phase = Phase::AwaitingTurn;
                DecisionAction::Primary
            }
            "n" | "no" => {
                self.phase = Phase::AwaitingTurn;
                DecisionAction::Secondary
            }
            _ => DecisionAction::Reprompt,
        }
    }

    /// Absorb a response chunk and return the text to display, if any.
    ///
    /// Chunks for one turn may arrive as growing snapshots of the same
    /// message; identical repeats display nothing and a chunk extending
    /// the previous one displays only the new suffix.
    pub fn on_chunk(&mut self, text: &str) -> Option<String> {
        match self.last_chunk.as_deref() {
            Some(prev) if prev == text => None,
            Some(prev) if text.starts_with(prev) => {
                let delta = text[prev.len()..].to_string();
                self.last_chunk = Some(text.to_string());
                Some(delta)
            }
            _ => {
                self.last_chunk = Some(text.to_string());
                Some(text.to_string())
            }
        }
    }

    /// The turn finished; return to the prompt.
    pub fn on_response_end(&mut self) {
        self.phase = Phase::Idle;
        self.last_chunk = None;
    }

    pub fn on_prompt_for_decision(&mut self) {
        self.phase = Phase::AwaitingDecision;
    }

    /// Errors abort the in-flight turn and return to the prompt.
    pub fn on_error(&mut self) {
        self.phase = Phase::Idle;
        self.last_chunk = None;
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}
