pub mod errors;
mod expr;
mod monomial;
mod ode_system;
mod symbol;
