pub mod appspec;
pub mod configuration;
pub mod vars;
