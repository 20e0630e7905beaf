// Application layer: the use cases shared by the HTTP API and the CLI.
// Every operation takes the owning user explicitly; nothing here knows
// about cookies or command-line flags.

mod budgets;
mod dashboard;
pub mod error;
mod records;
mod service;

pub use budgets::*;
pub use dashboard::*;
pub use error::*;
pub use records::*;
pub use service::*;
