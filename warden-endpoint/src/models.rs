use crate::error::EndpointError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP verbs a handler can be registered under
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(EndpointError::UnknownVerb(s.to_string())),
        }
    }
}

/// Capability a caller needs to invoke an endpoint.
///
/// Declared on handlers as `resource:action` (e.g. `endpoint:read`). The
/// empty tuple marks an authenticated-only route with no fine-grained check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct PermissionTuple {
    pub action: String,
    pub resource: String,
}

impl PermissionTuple {
    pub fn new(action: &str, resource: &str) -> Self {
        Self {
            action: action.to_string(),
            resource: resource.to_string(),
        }
    }

    /// The tuple synthesized for routes that declare no permission
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.action.is_empty() && self.resource.is_empty()
    }

    pub fn parse(declaration: &str) -> Result<Self, EndpointError> {
        let invalid = || EndpointError::InvalidPermission(declaration.to_string());
        let (resource, action) = declaration.split_once(':').ok_or_else(invalid)?;
        let (resource, action) = (resource.trim(), action.trim());
        if resource.is_empty() || action.is_empty() || action.contains(':') {
            return Err(invalid());
        }
        Ok(Self::new(action, resource))
    }
}

impl fmt::Display for PermissionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Raw handler metadata as recorded when the route was declared.
///
/// Nothing here has been validated yet; `RouteIntrospector` turns it into a
/// `HandlerDescriptor`. Entries with `verb: None` are helpers, not routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredHandler {
    pub controller: String,
    pub controller_path: String,
    pub method_path: String,
    pub verb: Option<String>,
    pub permissions: Vec<String>,
    pub summary: Option<String>,
}

impl RegisteredHandler {
    pub fn route(controller: &str, controller_path: &str, method_path: &str, verb: &str) -> Self {
        Self {
            controller: controller.to_string(),
            controller_path: controller_path.to_string(),
            method_path: method_path.to_string(),
            verb: Some(verb.to_string()),
            ..Default::default()
        }
    }

    pub fn with_permission(mut self, declaration: &str) -> Self {
        self.permissions.push(declaration.to_string());
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }
}

/// Validated metadata for one HTTP handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    pub controller: String,
    pub controller_path: String,
    pub method_path: String,
    pub method: HttpMethod,
    pub permissions: Vec<PermissionTuple>,
    pub summary: Option<String>,
}

/// One (path, method, permission) combination present in the running code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointRecord {
    /// Stable id, see `identity::compute_id`
    pub id: String,
    pub path: String,
    pub method: String,
    pub action: String,
    pub resource: String,
    pub controller: String,
    pub summary: Option<String>,
}

impl EndpointRecord {
    pub fn permission(&self) -> PermissionTuple {
        PermissionTuple::new(&self.action, &self.resource)
    }
}
