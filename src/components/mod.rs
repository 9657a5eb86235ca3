pub mod probe;
pub mod environment;
pub mod metadata;
pub mod manifest;
pub mod cluster;
pub mod reconciler;
