/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize` and call `Config::from_env()`
/// at startup. Field names map to upper-cased env var names (`gate_port`
/// reads `GATE_PORT`).
///
/// # Panics
///
/// Panics if a required env var is missing or fails to deserialize —
/// a service with incomplete configuration must not come up.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Self {
        envy::from_env().expect("failed to load config from environment")
    }

    /// Like [`Config::from_env`] but only considers vars starting with
    /// `prefix` (the prefix is stripped before matching field names).
    fn from_env_prefixed(prefix: &str) -> Self {
        envy::prefixed(prefix)
            .from_env()
            .expect("failed to load config from environment")
    }
}
