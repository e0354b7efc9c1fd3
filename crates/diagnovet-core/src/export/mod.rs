//! Export of saved reports for printing and sharing.

mod printable;

pub use printable::*;
