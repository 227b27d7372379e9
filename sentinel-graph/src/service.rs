use anyhow::{anyhow, Result};
use typedb_driver::{Credentials, DriverOptions, TypeDBDriver};

/// Connects to a TypeDB server and returns a ready driver.
pub struct TypeDBDriverFactory;

impl TypeDBDriverFactory {
    pub async fn connect(address: &str, username: &str, password: &str, tls: bool) -> Result<TypeDBDriver> {
        let options = DriverOptions::new(tls, None).map_err(|e| anyhow!(e))?;
        TypeDBDriver::new(address, Credentials::new(username, password), options)
            .await
            .map_err(|e| anyhow!(e))
    }

    pub async fn connect_default(address: &str) -> Result<TypeDBDriver> {
        Self::connect(address, "admin", "password", false).await
    }
}
