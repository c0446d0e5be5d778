mod analyzer;
mod codec;
mod error;
mod fixer;
mod model;
mod transformer;
mod util;

#[cfg(test)]
mod test_helpers;

pub use analyzer::*;
pub use codec::*;
pub use error::*;
pub use fixer::*;
pub use model::config::*;
pub use model::controls::*;
pub use model::event::*;
pub use model::percussion::*;
pub use transformer::*;
pub use util::*;
