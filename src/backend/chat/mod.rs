//! Channel Module
//!
//! Group channels: persistence in `db`, REST handlers in `handlers`. Channel
//! rooms and fan-out live in `backend::realtime`.

pub mod db;
pub mod handlers;
