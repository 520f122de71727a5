//! A small event enum describing resolver/fetch/build progress, delivered
//! to a `Sink` trait object; library embedding and tests get a `NullSink`.

use dub_version::Version;

#[derive(Debug, Clone)]
pub enum DiagnosticEvent {
    ResolvingPackage { name: String },
    CandidateRejected { name: String, version: Version, reason: String },
    FetchStarted { name: String, version: Version },
    FetchCompleted { name: String, version: Version },
    ConfigGraphPruned { package_count: usize },
    BuildComposed { source_file_count: usize },
}

pub trait Sink {
    fn emit(&self, event: DiagnosticEvent);
}

/// A sink that discards every event, used by tests and when nothing in
/// the current command needs progress reporting.
#[derive(Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn emit(&self, _event: DiagnosticEvent) {}
}

/// Forwards every event to `tracing`, used by the CLI's live commands.
#[derive(Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::ResolvingPackage { name } => tracing::debug!(package = %name, "resolving"),
            DiagnosticEvent::CandidateRejected { name, version, reason } => {
                tracing::trace!(package = %name, %version, %reason, "candidate rejected")
            }
            DiagnosticEvent::FetchStarted { name, version } => {
                tracing::info!(package = %name, %version, "fetching")
            }
            DiagnosticEvent::FetchCompleted { name, version } => {
                tracing::info!(package = %name, %version, "fetched")
            }
            DiagnosticEvent::ConfigGraphPruned { package_count } => {
                tracing::debug!(package_count, "configuration graph pruned")
            }
            DiagnosticEvent::BuildComposed { source_file_count } => {
                tracing::info!(source_file_count, "build composed")
            }
        }
    }
}
