pub mod aggregator;
pub mod bot;
pub mod prefix;
pub mod rate_limit;
pub mod signals;
pub mod worker;
