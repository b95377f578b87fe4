use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::registry::{RegistryError, ResourceDescriptor, ResourceError, ResourceHandler, UriTemplate};

pub const GREETING_TEMPLATE: &str = "greeting://{name}";

pub fn greeting(name: &str) -> String {
    format!("Hello, {name}!")
}

/// Dynamic greeting generator behind `greeting://{name}`.
pub struct GreetingResource;

#[async_trait]
impl ResourceHandler for GreetingResource {
    fn parameters(&self) -> &[&'static str] {
        &["name"]
    }

    async fn read(&self, _uri: &str, params: &HashMap<String, String>) -> Result<String, ResourceError> {
        let name = params
            .get("name")
            .ok_or_else(|| ResourceError::MissingParameter("name".into()))?;
        Ok(greeting(name))
    }
}

pub fn descriptor() -> Result<ResourceDescriptor, RegistryError> {
    Ok(ResourceDescriptor {
        name: "greeting".into(),
        title: Some("Greeting Resource".into()),
        description: Some("Dynamic greeting generator".into()),
        template: UriTemplate::parse(GREETING_TEMPLATE)?,
        handler: Arc::new(GreetingResource),
    })
}
