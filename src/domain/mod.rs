pub mod account;
pub mod fund;
pub mod investor;
pub mod money;
pub mod payment;
pub mod ports;
pub mod transfer;
