#[cfg(feature = "anthropic_client")]
pub mod anthropic;
