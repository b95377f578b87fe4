use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::RegistryError;

/// Failure raised while reading a templated resource.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Missing template parameter: {0}")]
    MissingParameter(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A level-1 URI template such as `greeting://{name}`.
///
/// Variables match one or more characters other than `/`. Two variables
/// may not be adjacent, since the split between them would be ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = || RegistryError::InvalidTemplate(raw.to_string());
        let mut segments = Vec::new();
        let mut rest = raw;

        while !rest.is_empty() {
            match rest.find('{') {
                Some(0) => {
                    let close = rest.find('}').ok_or_else(invalid)?;
                    let name = &rest[1..close];
                    if name.is_empty() || name.contains('{') {
                        return Err(invalid());
                    }
                    if matches!(segments.last(), Some(Segment::Variable(_))) {
                        return Err(invalid());
                    }
                    segments.push(Segment::Variable(name.to_string()));
                    rest = &rest[close + 1..];
                }
                Some(open) => {
                    if rest[..open].contains('}') {
                        return Err(invalid());
                    }
                    segments.push(Segment::Literal(rest[..open].to_string()));
                    rest = &rest[open..];
                }
                None => {
                    if rest.contains('}') {
                        return Err(invalid());
                    }
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn variables(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Match a concrete URI, returning the extracted variables.
    pub fn match_uri(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut rest = uri;
        let mut segments = self.segments.iter().peekable();

        while let Some(segment) = segments.next() {
            match segment {
                Segment::Literal(lit) => {
                    rest = rest.strip_prefix(lit.as_str())?;
                }
                Segment::Variable(name) => {
                    let end = match segments.peek() {
                        Some(Segment::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let value = &rest[..end];
                    if value.is_empty() || value.contains('/') {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(params)
    }
}

/// Produces the text of a templated resource.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Template variables this handler consumes.
    fn parameters(&self) -> &[&'static str];

    async fn read(&self, uri: &str, params: &HashMap<String, String>) -> Result<String, ResourceError>;
}

/// A templated resource as registered with the server.
pub struct ResourceDescriptor {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub template: UriTemplate,
    pub handler: Arc<dyn ResourceHandler>,
}

/// Advertised shape of a template, as listed by `resources/templates/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceTemplateDefinition {
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceDescriptor {
    pub fn definition(&self) -> ResourceTemplateDefinition {
        ResourceTemplateDefinition {
            uri_template: self.template.as_str().to_string(),
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Default)]
pub struct ResourceRegistry {
    resources: Vec<ResourceDescriptor>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ResourceDescriptor) -> Result<(), RegistryError> {
        if self.resources.iter().any(|r| r.name == descriptor.name) {
            return Err(RegistryError::DuplicateResource(descriptor.name));
        }

        let declared: BTreeSet<&str> = descriptor.handler.parameters().iter().copied().collect();
        let expected = descriptor.template.variables();
        if declared != expected {
            return Err(RegistryError::ParameterMismatch {
                template: descriptor.template.as_str().to_string(),
                expected: expected.into_iter().map(str::to_string).collect(),
                declared: declared.into_iter().map(str::to_string).collect(),
            });
        }

        self.resources.push(descriptor);
        Ok(())
    }

    /// Find the first resource whose template matches `uri`.
    pub fn resolve(&self, uri: &str) -> Option<(&ResourceDescriptor, HashMap<String, String>)> {
        self.resources
            .iter()
            .find_map(|r| r.template.match_uri(uri).map(|params| (r, params)))
    }

    pub fn templates(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter()
    }
}
