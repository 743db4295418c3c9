//! Two-phase confirmation for plugin updates that rename existing entries.
//!
//! ```text
//! Idle ──Submit──▶ Submitted ──accepted──▶ Applied
//!                     │  ▲
//!   requiresConfirmation │ UserConfirms(migrate)
//!                     ▼  │
//!               NeedsConfirmation ──UserCancels──▶ Idle
//! ```
//!
//! A failed request from `Submitted` always returns to `Idle`, so the
//! confirmation dialog can never be left open on an error.

use crate::diff::ChangeSet;
use crate::model::{MigrationMode, PluginUpdateRequest, PluginUpdateResponse, RdnChangeCheck};

/// A change set in flight, with the control flags it was sent with.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub changes: ChangeSet,
    pub confirmed: bool,
    pub migrate_entries: bool,
}

impl PendingSubmission {
    pub fn to_request(&self) -> PluginUpdateRequest {
        PluginUpdateRequest {
            config: self.changes.to_values(),
            confirmed: self.confirmed,
            migrate_entries: self.migrate_entries,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GateState {
    #[default]
    Idle,
    Submitted(PendingSubmission),
    /// The server asked for confirmation; `changes` is kept verbatim.
    NeedsConfirmation {
        changes: ChangeSet,
        check: RdnChangeCheck,
    },
    Applied(ChangeSet),
}

impl GateState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitted(_) => "submitted",
            Self::NeedsConfirmation { .. } => "needs_confirmation",
            Self::Applied(_) => "applied",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent {
    Submit(ChangeSet),
    ServerResponded(PluginUpdateResponse),
    ServerFailed,
    UserConfirms { migrate: bool },
    UserCancels,
}

impl GateEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::ServerResponded(_) => "server_responded",
            Self::ServerFailed => "server_failed",
            Self::UserConfirms { .. } => "user_confirms",
            Self::UserCancels => "user_cancels",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("nothing to submit")]
    NothingToSubmit,

    #[error("cannot handle '{event}' while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// How the server settled an in-flight submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Applied(ChangeSet),
    NeedsConfirmation(ConfirmationPrompt),
}

/// What the confirmation dialog shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationPrompt {
    pub check: RdnChangeCheck,
    /// Preselected choice for "migrate existing entries".
    pub default_migrate: bool,
    pub guidance: String,
}

impl ConfirmationPrompt {
    pub fn new(check: RdnChangeCheck) -> Self {
        let guidance = guidance_text(&check);
        Self {
            check,
            default_migrate: true,
            guidance,
        }
    }
}

fn guidance_text(check: &RdnChangeCheck) -> String {
    let count = check.entries_count;
    let mut text = match check.recommended_mode {
        MigrationMode::Modrdn => format!(
            "Recommended: rename {count} existing entries in place from '{}' to '{}'.",
            check.old_rdn, check.new_rdn
        ),
        MigrationMode::CopyDelete => format!(
            "Recommended: copy {count} existing entries to the new '{}' RDN and delete the originals.",
            check.new_rdn
        ),
        MigrationMode::LeaveOrphaned => format!(
            "Recommended: leave {count} existing entries as they are; they keep their '{}' RDN.",
            check.old_rdn
        ),
    };
    if !check.supports_modrdn {
        text.push_str(
            " The directory does not support modrdn: migration copies each entry and \
             deletes the original instead of renaming it atomically.",
        );
    }
    text
}

/// Explicit state machine around plugin config submissions.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    state: GateState,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, GateState::Submitted(_))
    }

    /// Whether a new submission may start. A pending confirmation must be
    /// confirmed or cancelled first.
    pub fn ensure_can_submit(&self) -> Result<(), GateError> {
        match self.state {
            GateState::Idle | GateState::Applied(_) => Ok(()),
            _ => Err(GateError::InvalidTransition {
                state: self.state.name(),
                event: "submit",
            }),
        }
    }

    /// Dialog content, present only while awaiting the user's decision.
    pub fn prompt(&self) -> Option<ConfirmationPrompt> {
        match &self.state {
            GateState::NeedsConfirmation { check, .. } => {
                Some(ConfirmationPrompt::new(check.clone()))
            }
            _ => None,
        }
    }

    /// The request for the submission currently in flight.
    pub fn pending_request(&self) -> Option<PluginUpdateRequest> {
        match &self.state {
            GateState::Submitted(pending) => Some(pending.to_request()),
            _ => None,
        }
    }

    /// Apply one event. On error the state is left untouched.
    pub fn apply(&mut self, event: GateEvent) -> Result<&GateState, GateError> {
        let current = std::mem::take(&mut self.state);
        match Self::transition(current, event) {
            Ok(next) => {
                tracing::debug!(state = next.name(), "Confirmation gate transition");
                self.state = next;
                Ok(&self.state)
            }
            Err((previous, err)) => {
                self.state = previous;
                Err(err)
            }
        }
    }

    fn transition(
        state: GateState,
        event: GateEvent,
    ) -> Result<GateState, (GateState, GateError)> {
        match (state, event) {
            (state @ (GateState::Idle | GateState::Applied(_)), GateEvent::Submit(changes)) => {
                if changes.is_empty() {
                    return Err((state, GateError::NothingToSubmit));
                }
                Ok(GateState::Submitted(PendingSubmission {
                    changes,
                    confirmed: false,
                    migrate_entries: false,
                }))
            }
            (GateState::Submitted(pending), GateEvent::ServerResponded(resp)) => {
                match resp.pending_check() {
                    Some(check) => Ok(GateState::NeedsConfirmation {
                        changes: pending.changes,
                        check: check.clone(),
                    }),
                    None => Ok(GateState::Applied(pending.changes)),
                }
            }
            (GateState::Submitted(_), GateEvent::ServerFailed) => Ok(GateState::Idle),
            (GateState::NeedsConfirmation { changes, .. }, GateEvent::UserConfirms { migrate }) => {
                Ok(GateState::Submitted(PendingSubmission {
                    changes,
                    confirmed: true,
                    migrate_entries: migrate,
                }))
            }
            (GateState::NeedsConfirmation { .. }, GateEvent::UserCancels) => Ok(GateState::Idle),
            (state, event) => {
                let err = GateError::InvalidTransition {
                    state: state.name(),
                    event: event.name(),
                };
                Err((state, err))
            }
        }
    }

    /// Start a submission; returns the request to send (`confirmed=false`).
    pub fn submit(&mut self, changes: ChangeSet) -> Result<PluginUpdateRequest, GateError> {
        self.apply(GateEvent::Submit(changes))?;
        self.sent_request()
    }

    /// Feed the server's answer for the in-flight request.
    pub fn respond(&mut self, response: PluginUpdateResponse) -> Result<Resolution, GateError> {
        match self.apply(GateEvent::ServerResponded(response))? {
            GateState::Applied(changes) => Ok(Resolution::Applied(changes.clone())),
            GateState::NeedsConfirmation { check, .. } => {
                Ok(Resolution::NeedsConfirmation(ConfirmationPrompt::new(check.clone())))
            }
            other => Err(GateError::InvalidTransition {
                state: other.name(),
                event: "server_responded",
            }),
        }
    }

    /// The in-flight request failed; back to idle.
    pub fn fail(&mut self) -> Result<&GateState, GateError> {
        self.apply(GateEvent::ServerFailed)
    }

    /// Confirm the pending change set; returns the resubmission request.
    pub fn confirm(&mut self, migrate: bool) -> Result<PluginUpdateRequest, GateError> {
        self.apply(GateEvent::UserConfirms { migrate })?;
        self.sent_request()
    }

    /// Drop the pending change set without contacting the server.
    pub fn cancel(&mut self) -> Result<(), GateError> {
        self.apply(GateEvent::UserCancels).map(|_| ())
    }

    fn sent_request(&self) -> Result<PluginUpdateRequest, GateError> {
        self.pending_request().ok_or(GateError::InvalidTransition {
            state: self.state.name(),
            event: "submit",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Change;
    use serde_json::json;

    fn changes() -> ChangeSet {
        [Change {
            key: "rdn_attribute".into(),
            value: json!("cn"),
        }]
        .into_iter()
        .collect()
    }

    fn check(supports_modrdn: bool) -> RdnChangeCheck {
        RdnChangeCheck {
            old_rdn: "uid".into(),
            new_rdn: "cn".into(),
            entries_count: 42,
            entries_dns: vec!["uid=jdoe,ou=people,dc=example,dc=org".into()],
            warnings: vec![],
            supports_modrdn,
            recommended_mode: MigrationMode::Modrdn,
        }
    }

    fn needs_confirmation() -> PluginUpdateResponse {
        PluginUpdateResponse {
            requires_confirmation: true,
            migration_check: Some(check(true)),
            message: None,
        }
    }

    #[test]
    fn test_plain_submit_applies() {
        let mut gate = ConfirmationGate::new();
        let req = gate.submit(changes()).unwrap();
        assert!(!req.confirmed);
        assert!(!req.migrate_entries);
        assert_eq!(req.config["rdn_attribute"], json!("cn"));

        assert_eq!(
            gate.respond(PluginUpdateResponse::default()),
            Ok(Resolution::Applied(changes()))
        );
        assert_eq!(gate.state(), &GateState::Applied(changes()));
        assert!(gate.prompt().is_none());
    }

    #[test]
    fn test_confirm_resubmits_same_changes_with_flags() {
        let mut gate = ConfirmationGate::new();
        let first = gate.submit(changes()).unwrap();
        gate.respond(needs_confirmation()).unwrap();

        let prompt = gate.prompt().unwrap();
        assert!(prompt.default_migrate);
        assert_eq!(prompt.check.entries_count, 42);

        let second = gate.confirm(true).unwrap();
        assert_eq!(second.config, first.config);
        assert!(second.confirmed);
        assert!(second.migrate_entries);

        gate.respond(PluginUpdateResponse::default()).unwrap();
        assert!(matches!(gate.state(), GateState::Applied(_)));
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut gate = ConfirmationGate::new();
        gate.submit(changes()).unwrap();
        let resolution = gate.respond(needs_confirmation()).unwrap();
        assert!(matches!(resolution, Resolution::NeedsConfirmation(_)));
        gate.cancel().unwrap();
        assert_eq!(gate.state(), &GateState::Idle);
        assert!(gate.prompt().is_none());
    }

    #[test]
    fn test_failure_during_confirmation_closes_dialog() {
        let mut gate = ConfirmationGate::new();
        gate.submit(changes()).unwrap();
        gate.respond(needs_confirmation()).unwrap();
        gate.confirm(false).unwrap();
        gate.fail().unwrap();
        assert_eq!(gate.state(), &GateState::Idle);
        assert!(gate.prompt().is_none());
    }

    #[test]
    fn test_confirm_without_pending_response_is_rejected() {
        let mut gate = ConfirmationGate::new();
        assert_eq!(
            gate.confirm(true),
            Err(GateError::InvalidTransition {
                state: "idle",
                event: "user_confirms"
            })
        );
        assert_eq!(gate.state(), &GateState::Idle);
    }

    #[test]
    fn test_flag_without_report_does_not_prompt() {
        let mut gate = ConfirmationGate::new();
        gate.submit(changes()).unwrap();
        gate.respond(PluginUpdateResponse {
            requires_confirmation: true,
            migration_check: None,
            message: None,
        })
        .unwrap();
        assert!(matches!(gate.state(), GateState::Applied(_)));
    }

    #[test]
    fn test_double_submit_is_rejected_and_state_kept() {
        let mut gate = ConfirmationGate::new();
        gate.submit(changes()).unwrap();
        assert!(gate.submit(changes()).is_err());
        assert!(gate.is_in_flight());
    }

    #[test]
    fn test_new_submission_blocked_while_prompt_open() {
        let mut gate = ConfirmationGate::new();
        assert_eq!(gate.ensure_can_submit(), Ok(()));
        gate.submit(changes()).unwrap();
        gate.respond(needs_confirmation()).unwrap();
        assert_eq!(
            gate.ensure_can_submit(),
            Err(GateError::InvalidTransition {
                state: "needs_confirmation",
                event: "submit"
            })
        );
        gate.cancel().unwrap();
        assert_eq!(gate.ensure_can_submit(), Ok(()));
    }

    #[test]
    fn test_empty_change_set_is_rejected() {
        let mut gate = ConfirmationGate::new();
        assert_eq!(
            gate.submit(ChangeSet::default()),
            Err(GateError::NothingToSubmit)
        );
    }

    #[test]
    fn test_guidance_warns_without_modrdn() {
        let atomic = ConfirmationPrompt::new(check(true));
        let copying = ConfirmationPrompt::new(check(false));
        assert!(!atomic.guidance.contains("does not support modrdn"));
        assert!(copying.guidance.contains("does not support modrdn"));
        assert!(copying.default_migrate);
    }
}
