pub mod status;

pub use status::{Code, Status};
