mod broker;
pub use broker::GithubBroker;

mod config;
pub use config::BrokerConfig;

mod errors;
pub use errors::BrokerError;
