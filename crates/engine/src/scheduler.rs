//! Write scheduler state machine
//!
//! ## States
//!
//! ```text
//!            mark_dirty                 begin_write
//!   Idle ───────────────▶ Scheduled ───────────────▶ Writing{dirty: false}
//!    ▲                        │                          │        │
//!    │          skip          │              mark_dirty  │        │
//!    ◀────────────────────────┘                          ▼        │
//!    │                                    Writing{dirty: true}    │
//!    │                                           │                │
//!    │          finish_cooldown: Settled         │ finish_cooldown│
//!    ◀───────────────────────────────────────────┼────────────────┘
//!                                                │ Resave
//!                                                ▼
//!                                            Scheduled
//! ```
//!
//! `Writing` covers the whole physical write and the cooldown that follows
//! it, so at most one write is ever in flight. `Writing{dirty: true}` means
//! mutations arrived after the payload was serialized; they are drained by
//! another save once the cooldown elapses.

/// Save lifecycle of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    /// Nothing in flight, nothing pending.
    #[default]
    Idle,
    /// A save task has been spawned and has not serialized yet.
    Scheduled,
    /// A write or its cooldown is in progress.
    Writing {
        /// Mutations arrived after serialization began.
        dirty: bool,
    },
}

/// What to do once the post-write cooldown elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    /// Mutations are pending; save again immediately.
    Resave,
    /// Nothing pending; the store is quiescent.
    Settled,
}

impl SaveState {
    /// Mutations exist that no completed or in-flight write will cover.
    pub fn is_dirty(&self) -> bool {
        matches!(self, SaveState::Scheduled | SaveState::Writing { dirty: true })
    }

    /// No write in flight and nothing dirty.
    pub fn is_quiescent(&self) -> bool {
        matches!(self, SaveState::Idle)
    }

    /// Record a mutation.
    ///
    /// Returns `true` when the caller must spawn a save task. Only the
    /// transition out of `Idle` does; every other state already has a task
    /// that will observe the mutation.
    pub fn mark_dirty(&mut self) -> bool {
        match *self {
            SaveState::Idle => {
                *self = SaveState::Scheduled;
                true
            }
            SaveState::Scheduled => false,
            SaveState::Writing { .. } => {
                *self = SaveState::Writing { dirty: true };
                false
            }
        }
    }

    /// Start a physical write. Returns `false` unless a save was scheduled.
    pub fn begin_write(&mut self) -> bool {
        if *self == SaveState::Scheduled {
            *self = SaveState::Writing { dirty: false };
            true
        } else {
            false
        }
    }

    /// Resolve a scheduled save without writing.
    pub fn skip(&mut self) {
        if *self == SaveState::Scheduled {
            *self = SaveState::Idle;
        }
    }

    /// Leave the cooldown that follows a write.
    pub fn finish_cooldown(&mut self) -> CooldownOutcome {
        match *self {
            SaveState::Writing { dirty: true } => {
                *self = SaveState::Scheduled;
                CooldownOutcome::Resave
            }
            _ => {
                *self = SaveState::Idle;
                CooldownOutcome::Settled
            }
        }
    }
}
