pub mod aligned;
pub mod diarization;
pub mod interval;
pub mod transcript;

pub use aligned::*;
pub use diarization::*;
pub use interval::*;
pub use transcript::*;
