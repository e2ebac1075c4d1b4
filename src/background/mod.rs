//! Background evolution engine.
//!
//! - `eos`: `w(z)` and the derived `W(z)`, `X(z)` integrals
//! - `growth`: linear growth factor ODE
//! - `distance`: Hubble rates and comoving distance
//! - `bias`: injected tracer biases for the relativistic terms
//! - `assembler`: the staged build over the output redshift grid
//! - `table`: the finished, read-only `BackgroundTable`

pub mod assembler;
pub mod bias;
pub mod distance;
pub mod eos;
pub mod growth;
pub mod table;

pub use assembler::*;
pub use bias::*;
pub use distance::*;
pub use eos::*;
pub use growth::*;
pub use table::*;
