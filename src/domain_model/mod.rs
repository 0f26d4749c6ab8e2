mod notice;
mod request;
mod token;

pub use notice::*;
pub use request::*;
pub use token::*;
