//! Error types for dub-confgraph.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigGraphError {
    #[error("configuration graph has a cycle: {}", .path.join(" -> "))]
    #[diagnostic(code(dub::confgraph::cycle), help("break the cycle by giving one side an explicit subConfiguration"))]
    ConfigurationCycle { path: Vec<String> },

    #[error("no configuration of {package} satisfies its dependents' constraints")]
    #[diagnostic(code(dub::confgraph::unsatisfiable))]
    Unsatisfiable { package: String },
}

pub type ConfigGraphResult<T> = std::result::Result<T, ConfigGraphError>;
