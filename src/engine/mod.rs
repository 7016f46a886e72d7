//! Ticket generation: one ticket at a time through the lifecycle engine,
//! the whole catalog through [`TicketSetBuilder`].

mod builder;
mod lifecycle;

pub use builder::{BatchReport, ProgressSink, TicketSetBuilder, plan_counts};
