pub mod cycle;
pub mod evaluator;
pub mod scheduler;

pub use cycle::{CycleReport, ExecutionEngine};
pub use evaluator::{evaluate, quote_base, scaled_limit, Decision, SwapKind, SwapPlan};
pub use scheduler::Scheduler;
