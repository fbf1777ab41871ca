//! Entity-change hooks - turn committed ORM writes into outbox events.
//!
//! The persistence layer calls [`EntityChangeHooks::on_committed`] after a
//! transaction commits. The hook never blocks the commit path and never
//! reports failure to it: anything that goes wrong is logged and the write
//! proceeds as if no hook existed.
//!
//! Hooks are registered once at startup through [`EntityChangeHooksBuilder`].
//! Tracking an entity type the translator cannot map fails registration, so
//! a misconfigured service refuses to start instead of silently dropping
//! changes.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{ChangeKind, DomainEvent, EntityRecord, EntityType, EventId};
use crate::domain::graph::{GraphSyncTranslator, TranslationError};
use crate::ports::{OutboxError, OutboxWriter};

/// Notification from the ORM layer: one committed insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCommitted {
    pub kind: ChangeKind,
    pub record: EntityRecord,
}

impl EntityCommitted {
    pub fn created(record: EntityRecord) -> Self {
        Self {
            kind: ChangeKind::Created,
            record,
        }
    }

    pub fn updated(record: EntityRecord) -> Self {
        Self {
            kind: ChangeKind::Updated,
            record,
        }
    }
}

/// Startup error while registering hooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookRegistrationError {
    #[error("cannot track {kind} on {entity_type}: {source}")]
    Untranslatable {
        entity_type: EntityType,
        kind: ChangeKind,
        #[source]
        source: TranslationError,
    },
}

/// What a hook invocation did with a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Event appended to the outbox.
    Enqueued(EventId),
    /// No hook is registered for this (type, kind).
    Untracked,
    /// The entity carries no tenant identity.
    SkippedNoTenant,
    /// The outbox refused the event.
    Dropped,
}

/// Builder registering the tracked (entity type, kind) pairs.
pub struct EntityChangeHooksBuilder {
    translator: Arc<GraphSyncTranslator>,
    outbox: Arc<dyn OutboxWriter>,
    tracked: HashSet<(EntityType, ChangeKind)>,
}

impl EntityChangeHooksBuilder {
    pub fn new(translator: Arc<GraphSyncTranslator>, outbox: Arc<dyn OutboxWriter>) -> Self {
        Self {
            translator,
            outbox,
            tracked: HashSet::new(),
        }
    }

    /// Track the given kinds of commit on `entity_type`.
    ///
    /// # Errors
    ///
    /// Returns `HookRegistrationError::Untranslatable` when the translator
    /// has no mapping for `entity_type`.
    pub fn track(
        mut self,
        entity_type: EntityType,
        kinds: &[ChangeKind],
    ) -> Result<Self, HookRegistrationError> {
        for &kind in kinds {
            self.translator
                .ensure_mapped(entity_type)
                .map_err(|source| HookRegistrationError::Untranslatable {
                    entity_type,
                    kind,
                    source,
                })?;
            if self.tracked.insert((entity_type, kind)) {
                tracing::debug!(entity_type = %entity_type, kind = %kind, "entity-change hook registered");
            }
        }
        Ok(self)
    }

    /// Track inserts and updates on every mapped entity type.
    pub fn track_all_mapped(self) -> Result<Self, HookRegistrationError> {
        let mapped: Vec<EntityType> = EntityType::ALL
            .into_iter()
            .filter(|t| self.translator.is_mapped(*t))
            .collect();

        mapped.into_iter().try_fold(self, |builder, entity_type| {
            builder.track(entity_type, &[ChangeKind::Created, ChangeKind::Updated])
        })
    }

    pub fn build(self) -> EntityChangeHooks {
        tracing::info!(hooks = self.tracked.len(), "entity-change hooks installed");
        EntityChangeHooks {
            outbox: self.outbox,
            tracked: self.tracked,
        }
    }
}

/// Installed hooks. Registration is final: there is no unregister.
pub struct EntityChangeHooks {
    outbox: Arc<dyn OutboxWriter>,
    tracked: HashSet<(EntityType, ChangeKind)>,
}

impl EntityChangeHooks {
    pub fn is_tracked(&self, entity_type: EntityType, kind: ChangeKind) -> bool {
        self.tracked.contains(&(entity_type, kind))
    }

    /// React to a committed write. Never fails and never awaits.
    pub fn on_committed(&self, commit: EntityCommitted) -> HookOutcome {
        let EntityCommitted { kind, record } = commit;
        if !self.is_tracked(record.entity_type, kind) {
            return HookOutcome::Untracked;
        }

        let event = match DomainEvent::from_record(kind, record) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    entity_type = %e.entity_type,
                    entity_id = %e.entity_id,
                    "skipping graph sync for entity without tenant"
                );
                return HookOutcome::SkippedNoTenant;
            }
        };

        let event_id = event.event_id().clone();
        match self.outbox.append(event) {
            Ok(()) => HookOutcome::Enqueued(event_id),
            Err(OutboxError::Full { capacity, .. }) => {
                tracing::warn!(event_id = %event_id, capacity, "outbox full, change not synced");
                HookOutcome::Dropped
            }
            Err(OutboxError::Closed) => {
                tracing::warn!(event_id = %event_id, "outbox closed, change not synced");
                HookOutcome::Dropped
            }
        }
    }
}
