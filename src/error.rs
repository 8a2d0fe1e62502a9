use thiserror::Error;

#[derive(Error, Debug)]
pub enum GripError {
    /// No matching repository upstream, or no package record locally.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("package {owner}/{repo} is already installed")]
    AlreadyExists { owner: String, repo: String },

    #[error("no suitable asset found for platform {0}")]
    NoSuitableAsset(String),

    #[error("{count} repositories match '{query}' and no selector is available")]
    Ambiguous { query: String, count: usize },

    #[error("GitHub request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("GitHub returned {status} for {url}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("integrity violation for {owner}/{repo}: {reason}")]
    Integrity {
        owner: String,
        repo: String,
        reason: String,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{op} {owner}/{repo}: {source}")]
    Op {
        op: &'static str,
        owner: String,
        repo: String,
        #[source]
        source: Box<GripError>,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl GripError {
    /// Wrap an error with the operation and package it occurred in.
    pub fn annotate(self, op: &'static str, owner: &str, repo: &str) -> Self {
        GripError::Op {
            op,
            owner: owner.to_string(),
            repo: repo.to_string(),
            source: Box::new(self),
        }
    }

    /// Strip `Op` annotations down to the underlying error.
    pub fn root(&self) -> &GripError {
        match self {
            GripError::Op { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, GripError>;
