//! The save/overwrite/override state machine sitting between the form and the
//! entry store.

use crate::entry::{ExtraHours, ShiftEntry};
use crate::error::{Result, RosterError};
use crate::rest_guard::{RestConflict, RestPeriodGuard};
use crate::store::ShiftEntryStore;
use crate::template::TemplateLookup;
use chrono::NaiveDate;

/// Form state for the selected date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeContext {
    pub date: NaiveDate,
    pub is_swapped: bool,
    pub swapped_with: Option<String>,
    pub extra_hours: ExtraHours,
    pub note: Option<String>,
}

impl ComposeContext {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            is_swapped: false,
            swapped_with: None,
            extra_hours: ExtraHours::None,
            note: None,
        }
    }

    pub fn reset_flags(&mut self) {
        self.is_swapped = false;
        self.swapped_with = None;
        self.extra_hours = ExtraHours::None;
        self.note = None;
    }

    pub fn build_entry(&self, template_id: &str) -> ShiftEntry {
        ShiftEntry::new(template_id, self.date)
            .with_swap(self.is_swapped, self.swapped_with.clone())
            .with_extra_hours(self.extra_hours)
            .with_note(self.note.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitState {
    Idle,
    Composing(ComposeContext),
    PendingOverwriteConfirm {
        context: ComposeContext,
        existing: ShiftEntry,
        pending_template_id: String,
    },
    PendingRestConfirm {
        context: ComposeContext,
        template_id: String,
        conflict: RestConflict,
    },
}

impl CommitState {
    pub fn name(&self) -> &'static str {
        match self {
            CommitState::Idle => "idle",
            CommitState::Composing(_) => "composing",
            CommitState::PendingOverwriteConfirm { .. } => "awaiting overwrite confirmation",
            CommitState::PendingRestConfirm { .. } => "awaiting rest override",
        }
    }

    pub fn context(&self) -> Option<&ComposeContext> {
        match self {
            CommitState::Idle => None,
            CommitState::Composing(context)
            | CommitState::PendingOverwriteConfirm { context, .. }
            | CommitState::PendingRestConfirm { context, .. } => Some(context),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        entry: ShiftEntry,
        replaced: Option<ShiftEntry>,
    },
    NeedsOverwriteConfirm {
        existing: ShiftEntry,
        pending_template_id: String,
    },
    NeedsRestConfirm(RestConflict),
    Deleted(ShiftEntry),
    NotFound,
    Cancelled,
}

pub struct CommitProtocol {
    state: CommitState,
    guard: RestPeriodGuard,
}

impl Default for CommitProtocol {
    fn default() -> Self {
        Self::new(RestPeriodGuard::default())
    }
}

impl CommitProtocol {
    pub fn new(guard: RestPeriodGuard) -> Self {
        Self {
            state: CommitState::Idle,
            guard,
        }
    }

    pub fn state(&self) -> &CommitState {
        &self.state
    }

    pub fn guard(&self) -> &RestPeriodGuard {
        &self.guard
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.state.context().map(|context| context.date)
    }

    /// Starts composing on `date` with a fresh form, dropping any pending prompt.
    pub fn select_date(&mut self, date: NaiveDate) {
        self.state = CommitState::Composing(ComposeContext::new(date));
    }

    /// Form access, only while composing.
    pub fn context_mut(&mut self) -> Option<&mut ComposeContext> {
        match &mut self.state {
            CommitState::Composing(context) => Some(context),
            _ => None,
        }
    }

    /// Handles a save for the selected date. With `force` the entry is written
    /// straight away; otherwise an occupied date or a rest conflict turns into
    /// a pending confirmation.
    ///
    /// # Errors
    ///
    /// [`RosterError::NoDateSelected`] when idle, [`RosterError::InvalidTransition`]
    /// while a confirmation is pending, [`RosterError::DanglingTemplate`] when
    /// `template_id` is unknown. None of them change the state.
    pub fn request_save<L>(
        &mut self,
        template_id: &str,
        force: bool,
        templates: &L,
        store: &mut ShiftEntryStore,
    ) -> Result<CommitOutcome>
    where
        L: TemplateLookup + ?Sized,
    {
        let context = match &self.state {
            CommitState::Idle => return Err(RosterError::NoDateSelected),
            CommitState::Composing(context) => context.clone(),
            other => {
                return Err(RosterError::InvalidTransition {
                    action: "save",
                    state: other.name(),
                });
            }
        };
        if templates.template(template_id).is_none() {
            return Err(RosterError::DanglingTemplate(template_id.to_string()));
        }

        if force {
            return Ok(self.commit(context, template_id, store));
        }

        if let Some(existing) = store.by_date(context.date) {
            let pending = context.build_entry(template_id);
            if !existing.same_payload(&pending) {
                tracing::debug!(date = %context.date, existing = %existing.id, "overwrite needs confirmation");
                let existing = existing.clone();
                self.state = CommitState::PendingOverwriteConfirm {
                    context,
                    existing: existing.clone(),
                    pending_template_id: template_id.to_string(),
                };
                return Ok(CommitOutcome::NeedsOverwriteConfirm {
                    existing,
                    pending_template_id: template_id.to_string(),
                });
            }
        }

        self.check_rest_then_commit(context, template_id.to_string(), templates, store)
    }

    /// Accepts the pending overwrite and continues with the rest check.
    pub fn confirm_overwrite<L>(
        &mut self,
        templates: &L,
        store: &mut ShiftEntryStore,
    ) -> Result<CommitOutcome>
    where
        L: TemplateLookup + ?Sized,
    {
        let (context, template_id) = match &self.state {
            CommitState::PendingOverwriteConfirm {
                context,
                pending_template_id,
                ..
            } => (context.clone(), pending_template_id.clone()),
            other => {
                return Err(RosterError::InvalidTransition {
                    action: "confirm overwrite",
                    state: other.name(),
                });
            }
        };
        self.check_rest_then_commit(context, template_id, templates, store)
    }

    /// Saves despite the pending rest conflict.
    pub fn override_rest(&mut self, store: &mut ShiftEntryStore) -> Result<CommitOutcome> {
        let (context, template_id) = match &self.state {
            CommitState::PendingRestConfirm {
                context,
                template_id,
                conflict,
            } => {
                tracing::info!(
                    date = %context.date,
                    side = conflict.side.as_str(),
                    gap_minutes = conflict.gap_minutes,
                    "rest warning overridden"
                );
                (context.clone(), template_id.clone())
            }
            other => {
                return Err(RosterError::InvalidTransition {
                    action: "override rest warning",
                    state: other.name(),
                });
            }
        };
        Ok(self.commit(context, &template_id, store))
    }

    /// Drops a pending prompt and goes back to composing with the same form.
    pub fn cancel(&mut self) -> CommitOutcome {
        let state = std::mem::replace(&mut self.state, CommitState::Idle);
        self.state = match state {
            CommitState::PendingOverwriteConfirm { context, .. }
            | CommitState::PendingRestConfirm { context, .. } => {
                tracing::debug!(date = %context.date, "pending save cancelled");
                CommitState::Composing(context)
            }
            other => other,
        };
        CommitOutcome::Cancelled
    }

    /// Removes an entry without confirmation, from any state.
    pub fn delete(&mut self, id: &str, store: &mut ShiftEntryStore) -> CommitOutcome {
        self.return_to_composing();
        match store.remove(id) {
            Some(removed) => {
                tracing::info!(date = %removed.date, id = %removed.id, "entry deleted");
                CommitOutcome::Deleted(removed)
            }
            None => CommitOutcome::NotFound,
        }
    }

    fn check_rest_then_commit<L>(
        &mut self,
        context: ComposeContext,
        template_id: String,
        templates: &L,
        store: &mut ShiftEntryStore,
    ) -> Result<CommitOutcome>
    where
        L: TemplateLookup + ?Sized,
    {
        let entries: &ShiftEntryStore = store;
        let conflict = self.guard.check(
            context.date,
            &template_id,
            context.extra_hours,
            templates,
            |date| entries.by_date(date),
        )?;

        match conflict {
            Some(conflict) => {
                tracing::debug!(
                    date = %context.date,
                    side = conflict.side.as_str(),
                    gap_minutes = conflict.gap_minutes,
                    "rest conflict needs confirmation"
                );
                self.state = CommitState::PendingRestConfirm {
                    context,
                    template_id,
                    conflict: conflict.clone(),
                };
                Ok(CommitOutcome::NeedsRestConfirm(conflict))
            }
            None => Ok(self.commit(context, &template_id, store)),
        }
    }

    fn commit(
        &mut self,
        mut context: ComposeContext,
        template_id: &str,
        store: &mut ShiftEntryStore,
    ) -> CommitOutcome {
        let entry = context.build_entry(template_id);
        let replaced = store.upsert(entry.clone());
        tracing::info!(date = %entry.date, id = %entry.id, template_id, "entry committed");
        context.reset_flags();
        self.state = CommitState::Composing(context);
        CommitOutcome::Committed { entry, replaced }
    }

    fn return_to_composing(&mut self) {
        let state = std::mem::replace(&mut self.state, CommitState::Idle);
        self.state = match state {
            CommitState::Idle => CommitState::Idle,
            CommitState::Composing(context)
            | CommitState::PendingOverwriteConfirm { context, .. }
            | CommitState::PendingRestConfirm { context, .. } => CommitState::Composing(context),
        };
    }
}
