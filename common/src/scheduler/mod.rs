// Scheduler module owning the single active reboot trigger

pub mod engine;

pub use engine::RebootScheduler;
