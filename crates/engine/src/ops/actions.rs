use crate::{
    ResultEngine,
    commands::{ActionToken, Command, Outcome},
};

use super::Engine;

impl Engine {
    /// Issues the token for one operator action.
    pub fn begin_action(&mut self) -> ActionToken {
        self.issued_tokens += 1;
        ActionToken(self.issued_tokens)
    }

    /// Runs `command` unless `token` was already used.
    ///
    /// The token is spent even when the command fails; a corrected retry is a
    /// new action.
    pub fn submit(&mut self, token: ActionToken, command: Command) -> ResultEngine<Outcome> {
        if !self.spent_tokens.spend(token) {
            tracing::debug!("ignoring repeated {} for action {:?}", command.label(), token);
            return Ok(Outcome::Duplicate);
        }

        match command {
            Command::AddItemized(cmd) => self.add_itemized(cmd).map(Outcome::Added),
            Command::AddCustom(cmd) => self.add_custom(cmd).map(Outcome::Added),
            Command::AddCalculated(cmd) => self.add_calculated(cmd).map(Outcome::Added),
            Command::Remove(id) => self.remove_by_id(&id).map(Outcome::Removed),
            Command::SwitchMode { vertical, mode } => {
                self.switch_mode(vertical, mode).map(Outcome::ModeSwitched)
            }
        }
    }
}
