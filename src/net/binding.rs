//! Socket binding resolution.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("socket binding '{0}' is not defined")]
    Unknown(String),

    #[error("socket binding '{name}' has an invalid address '{address}'")]
    InvalidAddress { name: String, address: String },
}

/// Named listener addresses, as declared under `[socket-bindings]`.
#[derive(Debug, Clone, Default)]
pub struct SocketBindings {
    bindings: BTreeMap<String, String>,
}

impl SocketBindings {
    pub fn new(bindings: BTreeMap<String, String>) -> Self {
        Self { bindings }
    }

    pub fn resolve(&self, name: &str) -> Result<SocketAddr, BindingError> {
        let address = self
            .bindings
            .get(name)
            .ok_or_else(|| BindingError::Unknown(name.to_string()))?;
        address.parse().map_err(|_| BindingError::InvalidAddress {
            name: name.to_string(),
            address: address.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_by_name() {
        let mut map = BTreeMap::new();
        map.insert("management-http".to_string(), "127.0.0.1:9990".to_string());
        map.insert("broken".to_string(), "localhost".to_string());
        let bindings = SocketBindings::new(map);

        assert_eq!(
            bindings.resolve("management-http").unwrap(),
            "127.0.0.1:9990".parse::<SocketAddr>().unwrap()
        );
        assert!(matches!(bindings.resolve("broken"), Err(BindingError::InvalidAddress { .. })));
        assert_eq!(
            bindings.resolve("nope"),
            Err(BindingError::Unknown("nope".to_string()))
        );
    }
}
