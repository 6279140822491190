use crate::window::WindowKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One declared transition between pre-login windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub from: WindowKind,
    pub to: WindowKind,
    #[serde(default)]
    pub bidirectional: bool,
}

/// Transitions permitted while unauthenticated.
///
/// Edges are directional; symmetry exists only where both directions are
/// declared (or an edge is marked `bidirectional`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTable {
    edges: HashSet<(WindowKind, WindowKind)>,
}

impl NavigationTable {
    pub fn empty() -> Self {
        Self {
            edges: HashSet::new(),
        }
    }

    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = NavigationEdge>,
    {
        let mut table = Self::empty();
        for edge in edges {
            if edge.bidirectional {
                table.allow_both(edge.from, edge.to);
            } else {
                table.allow(edge.from, edge.to);
            }
        }
        table
    }

    pub fn allow(&mut self, from: WindowKind, to: WindowKind) -> &mut Self {
        if to.is_post_login() {
            tracing::warn!(%from, %to, "Edge into a post-login window is decided by authentication, not adjacency");
        }
        self.edges.insert((from, to));
        self
    }

    pub fn allow_both(&mut self, a: WindowKind, b: WindowKind) -> &mut Self {
        self.allow(a, b);
        self.allow(b, a)
    }

    pub fn contains(&self, from: WindowKind, to: WindowKind) -> bool {
        self.edges.contains(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, NavigationError> {
        let content = tokio::fs::read_to_string(&path).await?;
        let edges: Vec<NavigationEdge> = serde_yaml::from_str(&content)?;
        Ok(Self::from_edges(edges))
    }
}

impl Default for NavigationTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table
            .allow_both(WindowKind::Login, WindowKind::SignUp)
            .allow_both(WindowKind::Login, WindowKind::ForgotPassword)
            .allow_both(WindowKind::Login, WindowKind::FaceLogin)
            .allow_both(WindowKind::Login, WindowKind::VoiceLogin);
        table
    }
}
