mod bindable;
mod capture;
mod fields;
mod meta;

pub use bindable::*;
pub(crate) use capture::*;
pub use fields::*;
pub use meta::*;
