//! Policy-gated gateway for querying and changing the run state of system services.

mod error;
pub mod exec;
mod gateway;
mod models;
pub mod policy;
pub mod unit;

pub use error::{GatewayError, Result};
pub use exec::{CommandExecutor, CommandRunner, ExecSettings, Invocation, SystemRunner};
pub use gateway::{Gateway, GatewayRequest, GatewaySettings};
pub use models::{AccessVerdict, ActionReport, CommandOutcome, ServiceAction};
pub use policy::{AccessPolicy, FilePolicySource, InlinePolicySource, PolicySource};
pub use unit::{normalize, validate, ServiceIdentifier, SuffixMode, UNIT_SUFFIX};
