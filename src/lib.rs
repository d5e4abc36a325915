extern crate self as stepwise;

pub mod command;
mod configuration;
mod connection;
mod connection_options;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod migrate;
mod result;
mod rows;
mod sync;
mod value;

pub use configuration::Configuration;
pub use connection::{Connection, Session};
pub use connection_options::ConnectionOptions;
pub use error::Error;
pub use result::{AsyncResult, Result};
pub use rows::{ColumnIndex, Row};
pub use stepwise_macros::migrator;
pub use value::Value;
