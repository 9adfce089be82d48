// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case calls into the
// data, ml and infra layers in order and returns a result
// for the CLI to print.

// The training workflow
pub mod train_use_case;

// Generating digits from a checkpoint
pub mod sample_use_case;
