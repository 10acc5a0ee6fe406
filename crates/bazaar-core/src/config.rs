/// Loads a service configuration struct from environment variables.
///
/// Field `database_url` is read from `DATABASE_URL`, `shop_port` from `SHOP_PORT`, and so on
/// (envy upper-cases field names). Optional settings should use `#[serde(default = ...)]`.
pub trait Config: Sized + serde::de::DeserializeOwned {
    /// Read the process environment.
    fn try_from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Read from explicit key/value pairs instead of the process environment.
    fn try_from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs)
    }

    /// # Panics
    ///
    /// Panics if a required variable is missing or cannot be parsed. Call once at startup.
    fn from_env() -> Self {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(e) => panic!("failed to load config from environment: {e}"),
        }
    }
}
