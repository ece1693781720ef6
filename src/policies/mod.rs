//! Concrete retry policies: [`Never`], [`Constant`], and [`Exponential`].
//!
//! [`Config`](crate::Config) selects among them; they can also be handed to a
//! runner directly through a closure-based [`PolicyFactory`](crate::PolicyFactory).

mod constant;
mod exponential;
mod never;

pub use constant::Constant;
pub use exponential::Exponential;
pub use never::Never;
