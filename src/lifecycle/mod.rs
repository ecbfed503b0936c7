// Stateful endpoint testing
//
// - battery: the adversarial cases, declared as data and rendered per target
// - extract: first-match-wins identifier extraction from create responses
// - runner:  runs the battery (phase A) and create -> get -> delete -> get (phase B)
//
// Architecture:
//   battery.rs, extract.rs (leaves, no I/O)
//       ↑
//   runner.rs (uses ProbeEngine for every call)

pub mod battery;
pub mod extract;
pub mod runner;

pub use battery::*;
pub use extract::*;
pub use runner::*;
