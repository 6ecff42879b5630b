//! Core model of projust: projects with their requirements and tasks, the
//! members of the organisation, and the links between them.
//!
//! Entities live in id-keyed registries and refer to each other by id. A
//! link between a task and a requirement, or between a task and a member,
//! is stored on both sides and every operation keeps the two sides in step.
//!
//! ```no_run
//! use projust::date::{DateValue, FixedClock};
//! use projust::manager::ModelManager;
//! use projust::models::PriorityGroup;
//!
//! # fn main() -> projust::error::Result<()> {
//! let today = DateValue::new(1, 1, 2029)?;
//! let mut model = ModelManager::with_clock(Box::new(FixedClock(today)));
//! let pid = model
//!     .add_project("Website", "", DateValue::new(1, 1, 2030)?, 100.0)?
//!     .id()
//!     .to_owned();
//! let rid = model
//!     .add_requirement(&pid, "Login", "", DateValue::new(1, 12, 2029)?, PriorityGroup::High)?
//!     .id()
//!     .to_owned();
//! let tid = model
//!     .add_task(&pid, "Login form", "", 5.0, DateValue::new(1, 12, 2029)?)?
//!     .id()
//!     .to_owned();
//! model.assign_requirement(&tid, &rid)?;
//! assert_eq!(model.requirement_status(&rid)?, 0.0);
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod date;
pub mod error;
pub mod ids;
pub mod manager;
pub mod members;
pub mod models;
pub mod project;
pub mod projects;
pub mod registry;
pub mod requirements;
pub mod storage;
pub mod tasks;
