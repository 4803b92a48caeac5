pub mod fair_queue;
pub mod song;
