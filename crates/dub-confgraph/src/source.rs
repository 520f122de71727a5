//! The data a configuration-graph build needs about each resolved package,
//! abstracted behind a trait so the pruning algorithm has no dependency on
//! how recipes are loaded.

/// One edge target: a dependency's base package name.
pub trait ConfigGraphSource {
    /// The configuration a package builds with when nothing overrides it
    /// (its recipe's first autodetected or declared configuration).
    fn default_configuration(&self, package: &str) -> Option<String>;

    /// Every configuration of `package` whose platform suffix matches the
    /// active build platform.
    fn platform_configurations(&self, package: &str) -> Vec<String>;

    /// The base names of the packages `package` depends on while built
    /// with `config`.
    fn dependencies(&self, package: &str, config: &str) -> Vec<String>;

    /// `package.getSubConfiguration(config, dep)` — an explicit override
    /// forcing `dep` to build with one specific configuration.
    fn sub_configuration(&self, package: &str, config: &str, dep: &str) -> Option<String>;
}
