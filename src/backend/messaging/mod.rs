//! Direct Messaging Module
//!
//! One-to-one threads between users.
//!
//! - **`db`** - SQL for threads, participants and messages
//! - **`threads`** - Thread lifecycle rules (`DmThreads`)
//! - **`handlers`** - REST handlers under `/api/dm`
//!
//! Live delivery is the hub's job; see `backend::realtime::dispatcher`.

pub mod db;
pub mod handlers;
pub mod threads;

pub use threads::{DeleteOutcome, DmThreads, ReadOutcome, ThreadRow};
