// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing the data the
// rest of the system moves around.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A single handwritten digit image, read as a row sequence
pub mod digit;

// Core abstractions (traits) that other layers implement
pub mod traits;
