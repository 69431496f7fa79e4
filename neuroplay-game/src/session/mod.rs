//! Round lifecycle: phases, per-round records and the driving state machine.
mod machine;
mod phase;
mod round;

pub use machine::{SessionMachine, SubmitOutcome};
pub use phase::Phase;
pub use round::RoundRecord;
