//! Discovery (depth-first, with cycle detection) followed by iterative
//! pruning down to exactly one configuration per package.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ConfigGraphError, ConfigGraphResult};
use crate::source::ConfigGraphSource;

type Vertex = (String, String);

#[derive(Default)]
struct Graph {
    /// Configurations discovered for each package, in discovery order
    /// (used as the topological tie-break).
    vertices: BTreeMap<String, Vec<String>>,
    /// Forward edges between vertices.
    edges: BTreeMap<Vertex, BTreeSet<Vertex>>,
    /// Which packages point at a given package, across any configuration.
    parents_of: BTreeMap<String, BTreeSet<String>>,
    /// Discovery order of packages (first seen during the DFS), the
    /// topological tie-break order for the final pruning pass.
    package_order: Vec<String>,
}

impl Graph {
    fn add_vertex(&mut self, package: &str, config: &str) {
        let slot = self.vertices.entry(package.to_string()).or_default();
        if !slot.iter().any(|c| c == config) {
            if slot.is_empty() {
                self.package_order.push(package.to_string());
            }
            slot.push(config.to_string());
        }
    }

    fn add_edge(&mut self, from: Vertex, to: Vertex) {
        self.parents_of.entry(to.0.clone()).or_default().insert(from.0.clone());
        self.edges.entry(from).or_default().insert(to);
    }
}

/// Builds the configuration graph rooted at `root` and prunes it down to a
/// single configuration per package, returning `package -> config`.
pub fn build(
    source: &dyn ConfigGraphSource,
    root: &str,
) -> ConfigGraphResult<BTreeMap<String, String>> {
    let root_config = source
        .default_configuration(root)
        .unwrap_or_else(|| "library".to_string());

    let mut graph = Graph::default();
    let mut path: Vec<Vertex> = Vec::new();
    let mut settled: BTreeMap<Vertex, bool> = BTreeMap::new();

    let viable = discover(source, (root.to_string(), root_config.clone()), &mut graph, &mut path, &mut settled)?;
    if !viable {
        return Err(ConfigGraphError::Unsatisfiable { package: root.to_string() });
    }
    graph.add_vertex(root, &root_config);

    prune_to_single_configuration(&mut graph);

    Ok(graph
        .vertices
        .into_iter()
        .filter_map(|(pkg, configs)| configs.into_iter().next().map(|c| (pkg, c)))
        .collect())
}

/// Depth-first discovery of the vertex `(package, config)` and everything
/// reachable from it. Returns whether the vertex is viable (every
/// dependency has at least one surviving candidate configuration).
fn discover(
    source: &dyn ConfigGraphSource,
    vertex: Vertex,
    graph: &mut Graph,
    path: &mut Vec<Vertex>,
    settled: &mut BTreeMap<Vertex, bool>,
) -> ConfigGraphResult<bool> {
    if let Some(&viable) = settled.get(&vertex) {
        return Ok(viable);
    }
    if path.contains(&vertex) {
        let mut chain: Vec<String> = path.iter().map(|(p, c)| format!("{p}:{c}")).collect();
        chain.push(format!("{}:{}", vertex.0, vertex.1));
        return Err(ConfigGraphError::ConfigurationCycle { path: chain });
    }

    path.push(vertex.clone());
    let (package, config) = vertex.clone();

    let mut viable = true;
    for dep in source.dependencies(&package, &config) {
        let allowed: Vec<String> = match source.sub_configuration(&package, &config, &dep) {
            Some(forced) => vec![forced],
            None => source.platform_configurations(&dep),
        };

        if allowed.is_empty() {
            viable = false;
            break;
        }

        let mut surviving = Vec::new();
        for candidate in allowed {
            let child = (dep.clone(), candidate.clone());
            let child_viable = discover(source, child.clone(), graph, path, settled)?;
            if child_viable {
                graph.add_vertex(&dep, &candidate);
                graph.add_edge(vertex.clone(), child);
                surviving.push(candidate);
            }
        }

        if surviving.is_empty() {
            viable = false;
            break;
        }
    }

    path.pop();
    settled.insert(vertex, viable);
    Ok(viable)
}

/// Repeatedly deletes vertices unreachable from every surviving parent
/// vertex, then breaks remaining ties in topological-discovery order,
/// until every package has exactly one surviving configuration.
fn prune_to_single_configuration(graph: &mut Graph) {
    loop {
        let mut changed = false;

        for package in graph.package_order.clone() {
            let parents: Vec<String> = graph.parents_of.get(&package).cloned().unwrap_or_default().into_iter().collect();
            if parents.is_empty() {
                continue;
            }

            let configs = graph.vertices.get(&package).cloned().unwrap_or_default();
            let mut survivors = Vec::new();

            for config in configs {
                let target = (package.clone(), config.clone());
                let reachable_from_every_parent = parents.iter().all(|parent| {
                    let parent_configs = graph.vertices.get(parent).cloned().unwrap_or_default();
                    parent_configs.iter().any(|pc| {
                        graph
                            .edges
                            .get(&(parent.clone(), pc.clone()))
                            .is_some_and(|targets| targets.contains(&target))
                    })
                });
                if reachable_from_every_parent {
                    survivors.push(config);
                } else {
                    changed = true;
                }
            }

            graph.vertices.insert(package, survivors);
        }

        if changed {
            continue;
        }

        // No unreachable vertex remains. Tie-break: the first package (in
        // discovery order) with more than one surviving configuration
        // keeps only the first one it was discovered with.
        let tie = graph.package_order.iter().find(|p| graph.vertices.get(*p).map(|v| v.len()).unwrap_or(0) > 1).cloned();
        match tie {
            Some(package) => {
                if let Some(configs) = graph.vertices.get_mut(&package) {
                    configs.truncate(1);
                }
            }
            None => break,
        }
    }
}
