//! Outbound service clients

pub mod classifier_client;

pub use classifier_client::HttpClassifier;
