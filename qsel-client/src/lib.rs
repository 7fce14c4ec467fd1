pub mod client;
pub mod config;
pub mod subscription;
pub mod transport;

#[cfg(test)]
mod client_test;

#[cfg(test)]
mod mock_transport;
