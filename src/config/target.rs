use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Image repository name shared by every target
pub const IMAGE_NAME: &str = "cherryrecorder-client";

/// Name of the locally started container
pub const CONTAINER_NAME: &str = "cherryrecorder-client-container";

pub const DOCKERFILE: &str = "Dockerfile";
pub const BUILD_CONTEXT: &str = ".";

// The server already listens on 80/8080, so the client is published on 3000
pub const HOST_PORT: u16 = 3000;
pub const CONTAINER_PORT: u16 = 80;

/// Built-in build arguments, lowest precedence.
pub const DEFAULT_BUILD_ARGS: &[(&str, &str)] = &[
    ("BASE_HREF", "/"),
    ("WEB_API_BASE_URL", "https://your-domain.com/api"),
    ("WS_URL", "wss://your-domain.com/ws"),
];

/// Deployment profile selecting the image tag, run behavior and overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Build the image and start it on this machine
    #[default]
    Local,
    /// Build an image for the cluster ingress (not started locally)
    K8s,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Local => "local",
            Target::K8s => "k8s",
        }
    }

    /// Repository part of the image tag, without `:tag`.
    pub fn image_repository(self) -> String {
        match self {
            Target::Local => IMAGE_NAME.to_string(),
            Target::K8s => format!("{}-k8s", IMAGE_NAME),
        }
    }

    pub fn image_tag(self) -> String {
        format!("{}:latest", self.image_repository())
    }

    /// Whether a container is started locally after the build.
    pub fn runs_locally(self) -> bool {
        matches!(self, Target::Local)
    }

    /// Overrides applied on top of defaults and the env file.
    pub fn overrides(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Target::Local => &[],
            // Behind the ingress the API and websocket share the page origin
            Target::K8s => &[("WEB_API_BASE_URL", "/api"), ("WS_URL", "/ws")],
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
