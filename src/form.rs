//! Dialog state machine
//!
//! Every create/edit dialog follows the same lifecycle:
//!
//! ```text
//! Closed --open--> Idle --submit--> Submitting --ok--> Closed
//!                   ^                    |
//!                   +------ error -------+   (message shown, values kept)
//! ```
//!
//! Only one submission may be in flight per dialog; a second submit while
//! `Submitting` is refused.

use std::future::Future;
use thiserror::Error;

use crate::gateway::{GatewayError, GatewayResult};
use crate::models::{InputError, LeagueUpdate, NewLeague, NewMatch, NewPlayer};

/// Where a dialog is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    /// Open and editable, with the message from the last failed submit
    Idle { error: Option<String> },
    Submitting,
}

/// Errors from driving a dialog
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Dialog is not open")]
    NotOpen,

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("No submission is in progress")]
    NotSubmitting,

    /// The submission itself failed; the dialog stays open
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: GatewayError,
    },
}

/// Messages shown when a submission fails
#[derive(Debug, Clone)]
pub struct DialogMessages {
    /// Shown for transport and server failures
    pub generic: String,
    /// Shown for a 400 that carries no `detail`
    pub validation: Option<String>,
}

impl DialogMessages {
    pub fn new(generic: impl Into<String>) -> Self {
        Self {
            generic: generic.into(),
            validation: None,
        }
    }

    pub fn validation(mut self, message: impl Into<String>) -> Self {
        self.validation = Some(message.into());
        self
    }

    fn describe(&self, err: &GatewayError) -> String {
        match (err, &self.validation) {
            (GatewayError::Validation { detail }, Some(fallback)) if detail.is_empty() => {
                fallback.clone()
            }
            _ => err.user_message(&self.generic),
        }
    }
}

/// A form with values and a lifecycle
#[derive(Debug, Clone)]
pub struct Dialog<V> {
    values: V,
    state: DialogState,
    messages: DialogMessages,
}

impl<V: Clone + Default> Dialog<V> {
    pub fn new(messages: DialogMessages) -> Self {
        Self {
            values: V::default(),
            state: DialogState::Closed,
            messages,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, DialogState::Closed)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, DialogState::Submitting)
    }

    /// Message from the last failed submit
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            DialogState::Idle { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn values(&self) -> &V {
        &self.values
    }

    /// Editable values; `None` unless the dialog is idle
    pub fn values_mut(&mut self) -> Option<&mut V> {
        match self.state {
            DialogState::Idle { .. } => Some(&mut self.values),
            _ => None,
        }
    }

    pub fn open(&mut self) {
        if matches!(self.state, DialogState::Closed) {
            self.state = DialogState::Idle { error: None };
        }
    }

    /// Close without submitting; refused while a submission is running
    pub fn close(&mut self) -> Result<(), FormError> {
        if self.is_submitting() {
            return Err(FormError::AlreadySubmitting);
        }
        self.state = DialogState::Closed;
        Ok(())
    }

    /// Enter `Submitting` and hand out the values to send
    pub fn begin_submit(&mut self) -> Result<V, FormError> {
        match self.state {
            DialogState::Closed => Err(FormError::NotOpen),
            DialogState::Submitting => Err(FormError::AlreadySubmitting),
            DialogState::Idle { .. } => {
                self.state = DialogState::Submitting;
                Ok(self.values.clone())
            }
        }
    }

    /// Leave `Submitting` with the outcome of the request
    ///
    /// Success closes the dialog and clears its values; failure returns to
    /// `Idle` with a message and the entered values intact. Outside
    /// `Submitting` the outcome is refused and the state is left alone.
    pub fn finish<T>(&mut self, outcome: GatewayResult<T>) -> Result<T, FormError> {
        if !self.is_submitting() {
            return Err(FormError::NotSubmitting);
        }
        match outcome {
            Ok(value) => {
                self.values = V::default();
                self.state = DialogState::Closed;
                Ok(value)
            }
            Err(source) => {
                let message = self.messages.describe(&source);
                tracing::warn!(error = %source, message = %message, "Submission failed");
                self.state = DialogState::Idle {
                    error: Some(message.clone()),
                };
                Err(FormError::Rejected { message, source })
            }
        }
    }

    /// Run one full submission through `operation`
    pub async fn submit<T, F, Fut>(&mut self, operation: F) -> Result<T, FormError>
    where
        F: FnOnce(V) -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let values = self.begin_submit()?;
        let outcome = operation(values).await;
        self.finish(outcome)
    }
}

// ============================================
// Dialog values
// ============================================

/// "Create league" and "edit league" fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueForm {
    pub name: String,
    pub description: String,
}

impl LeagueForm {
    pub fn to_new_league(&self) -> NewLeague {
        NewLeague {
            name: self.name.clone(),
            description: Some(self.description.clone()),
        }
    }

    pub fn to_update(&self) -> LeagueUpdate {
        LeagueUpdate::rename(self.name.clone())
    }
}

/// "Add player" field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerForm {
    pub name: String,
}

impl PlayerForm {
    pub fn to_request(&self) -> NewPlayer {
        NewPlayer::new(self.name.clone())
    }
}

/// "Record match" fields, as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchForm {
    pub player1: String,
    pub player2: String,
    pub player1_score: String,
    pub player2_score: String,
}

impl MatchForm {
    /// Parse the scores and build the request
    pub fn to_request(&self) -> Result<NewMatch, InputError> {
        Ok(NewMatch::new(
            self.player1.clone(),
            parse_score("player1_score", &self.player1_score)?,
            self.player2.clone(),
            parse_score("player2_score", &self.player2_score)?,
        ))
    }
}

fn parse_score(field: &'static str, raw: &str) -> Result<i64, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InputError::Empty(field));
    }
    raw.parse().map_err(|_| InputError::InvalidScore(raw.to_string()))
}

pub type LeagueDialog = Dialog<LeagueForm>;
pub type PlayerDialog = Dialog<PlayerForm>;
pub type MatchDialog = Dialog<MatchForm>;

/// Dialog for creating a league
pub fn create_league_dialog() -> LeagueDialog {
    Dialog::new(DialogMessages::new("Failed to create league. Please try again."))
}

/// Dialog for renaming a league
pub fn edit_league_dialog() -> LeagueDialog {
    Dialog::new(DialogMessages::new("Failed to update league name. Please try again."))
}

/// Dialog for adding a player
pub fn create_player_dialog() -> PlayerDialog {
    Dialog::new(
        DialogMessages::new("Failed to create player. Please try again.")
            .validation("A player with this name already exists in this league"),
    )
}

/// Dialog for recording a match
pub fn create_match_dialog() -> MatchDialog {
    Dialog::new(DialogMessages::new("Failed to create match. Please try again."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_success() {
        let mut dialog = create_player_dialog();
        assert_eq!(dialog.state(), &DialogState::Closed);
        assert!(dialog.values_mut().is_none());

        dialog.open();
        dialog.values_mut().unwrap().name = "alice".to_string();

        let values = dialog.begin_submit().unwrap();
        assert_eq!(values.name, "alice");
        assert!(dialog.values_mut().is_none());

        let created = dialog.finish(Ok(42)).unwrap();
        assert_eq!(created, 42);
        assert_eq!(dialog.state(), &DialogState::Closed);
        assert_eq!(dialog.values(), &PlayerForm::default());
    }

    #[test]
    fn test_resubmit_blocked_while_submitting() {
        let mut dialog = create_match_dialog();
        dialog.open();
        dialog.begin_submit().unwrap();

        assert!(matches!(dialog.begin_submit(), Err(FormError::AlreadySubmitting)));
        assert!(matches!(dialog.close(), Err(FormError::AlreadySubmitting)));
    }

    #[test]
    fn test_finish_requires_submission() {
        let mut dialog = create_player_dialog();
        assert!(matches!(
            dialog.finish::<()>(Err(GatewayError::Timeout)),
            Err(FormError::NotSubmitting)
        ));
        assert_eq!(dialog.state(), &DialogState::Closed);

        dialog.open();
        dialog.values_mut().unwrap().name = "alice".to_string();
        assert!(matches!(dialog.finish(Ok(1)), Err(FormError::NotSubmitting)));
        assert_eq!(dialog.state(), &DialogState::Idle { error: None });
        assert_eq!(dialog.values().name, "alice");
    }

    #[test]
    fn test_submit_requires_open_dialog() {
        let mut dialog = create_league_dialog();
        assert!(matches!(dialog.begin_submit(), Err(FormError::NotOpen)));
    }

    #[test]
    fn test_failure_keeps_values_and_shows_detail() {
        let mut dialog = create_player_dialog();
        dialog.open();
        dialog.values_mut().unwrap().name = "alice".to_string();
        dialog.begin_submit().unwrap();

        let err = dialog
            .finish::<()>(Err(GatewayError::Validation {
                detail: "Player already exists in this league".to_string(),
            }))
            .unwrap_err();

        assert_eq!(err.to_string(), "Player already exists in this league");
        assert_eq!(dialog.error(), Some("Player already exists in this league"));
        assert_eq!(dialog.values().name, "alice");
        assert!(dialog.values_mut().is_some());
    }

    #[test]
    fn test_failure_messages() {
        let mut dialog = create_player_dialog();
        dialog.open();

        dialog.begin_submit().unwrap();
        let _ = dialog.finish::<()>(Err(GatewayError::Validation { detail: String::new() }));
        assert_eq!(
            dialog.error(),
            Some("A player with this name already exists in this league")
        );

        dialog.begin_submit().unwrap();
        let _ = dialog.finish::<()>(Err(GatewayError::Timeout));
        assert_eq!(dialog.error(), Some("Failed to create player. Please try again."));
    }

    #[tokio::test]
    async fn test_submit_runs_operation() {
        let mut dialog = create_league_dialog();
        dialog.open();
        dialog.values_mut().unwrap().name = "Chess Club".to_string();

        let name = dialog
            .submit(|values| async move { Ok(values.to_new_league().name) })
            .await
            .unwrap();

        assert_eq!(name, "Chess Club");
        assert!(!dialog.is_open());
    }

    #[test]
    fn test_match_form_parsing() {
        let form = MatchForm {
            player1: "alice".to_string(),
            player2: "bob".to_string(),
            player1_score: " 11 ".to_string(),
            player2_score: "7".to_string(),
        };
        assert_eq!(form.to_request().unwrap(), NewMatch::new("alice", 11, "bob", 7));

        let form = MatchForm {
            player2_score: "seven".to_string(),
            ..form
        };
        assert_eq!(
            form.to_request(),
            Err(InputError::InvalidScore("seven".to_string()))
        );
    }
}
