//! # Tasktally Core Library
//!
//! This library provides the core business logic for Tasktally, a personal
//! task tracker with routines, reusable templates, and period-bounded
//! statistics. It implements a CLI-first philosophy where all operations
//! are available via a standalone CLI binary, with any GUI front end being
//! a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Task model**: Typed task records with closed status/kind/priority
//!   enums, routines with validated state transitions, and templates
//! - **Statistics**: A pure aggregator that rolls task records up into an
//!   immutable per-period snapshot
//! - **Providers**: Tri-state resource wrappers and a controller that only
//!   aggregates once its inputs have resolved
//! - **Storage**: SQLite-based task storage and TOML-based settings
//!
//! ## Key Components
//!
//! - [`TaskRecord`]: Snapshot of a task as consumers read it
//! - [`StatsAggregator`]: Rolls records up into a [`StatsSnapshot`]
//! - [`StatsController`]: Drives recomputation over injected collections
//! - [`Database`]: Task, category, routine, and template persistence
//! - [`Settings`]: Application settings management

pub mod error;
pub mod provider;
pub mod recurrence;
pub mod stats;
pub mod storage;
pub mod task;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use provider::{ResourceState, SettingsStore, StatsController};
pub use recurrence::{reminder_times, RecurrenceRule};
pub use stats::{DateRange, StatsAggregator, StatsPeriod, StatsSnapshot};
pub use storage::{Database, Settings};
pub use task::routine::{Routine, RoutineStatus};
pub use task::template::TaskTemplate;
pub use task::{Category, TaskKind, TaskPriority, TaskRecord, TaskStatus};
