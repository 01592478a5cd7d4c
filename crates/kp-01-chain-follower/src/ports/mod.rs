//! Ports: handler traits consumed by the fetcher (inbound) and the
//! execution-client / chain-cache dependencies (outbound).

pub mod inbound;
pub mod outbound;

pub use inbound::{ChainUpdateHandler, ContractEventHandler};
pub use outbound::{ChainCache, ExecutionClient, MockExecutionClient};
