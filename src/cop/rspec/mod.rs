pub mod be_eql;

use super::registry::{CopRegistry, RegistryError};

/// Files RSpec cops run on unless configured otherwise.
pub const RSPEC_DEFAULT_INCLUDE: &[&str] = &["**/*_spec.rb", "**/spec/**/*"];

pub fn register_all(registry: &mut CopRegistry) -> Result<(), RegistryError> {
    registry.register(Box::new(be_eql::BeEql::new()?))?;
    Ok(())
}
