mod aggregate;
mod coerce;
mod liability;
mod models;
mod normalize;
mod summary;

pub use aggregate::*;
pub use coerce::{coerce_number, Coerced};
pub use liability::*;
pub use models::*;
pub use normalize::*;
pub use summary::*;
