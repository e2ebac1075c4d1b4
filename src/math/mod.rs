//! Numerical primitives: interpolation, Gauss–Kronrod quadrature and adaptive ODE stepping.

pub mod interp;
pub mod kronrod;
pub mod ode;
pub mod quadrature;

pub use interp::*;
pub use kronrod::*;
pub use ode::*;
pub use quadrature::*;
