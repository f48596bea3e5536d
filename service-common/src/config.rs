use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Load a configuration structure from environment variables.
///
/// Values are kept as strings and only converted by the target type, so credentials and names
/// like `007` or `TRUE` arrive unchanged. Nested structures use a double underscore (`FOO__BAR`).
pub trait ConfigFromEnv: Sized + DeserializeOwned {
    fn from_env() -> Result<Self, config::ConfigError> {
        load(config::Environment::default())
    }

    fn from_env_prefix<S: AsRef<str>>(prefix: S) -> Result<Self, config::ConfigError> {
        load(config::Environment::with_prefix(prefix.as_ref()))
    }

    /// Load from an explicit set of variables, instead of the process environment.
    fn from_set<K, V>(set: HashMap<K, V>) -> Result<Self, config::ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let set = set.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        load(config::Environment::default().source(Some(set)))
    }
}

impl<T: DeserializeOwned> ConfigFromEnv for T {}

/// Deserialize from an environment source.
pub fn load<T: DeserializeOwned>(env: config::Environment) -> Result<T, config::ConfigError> {
    config::Config::builder()
        .add_source(env.separator("__"))
        .build()?
        .try_deserialize()
}
