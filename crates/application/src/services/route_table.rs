use compact_str::CompactString;
use ferrous_rproxy_domain::{normalize_fqdn, BackendAddr, RouteEntry};
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Default)]
struct TrieNode {
    children: HashMap<CompactString, TrieNode, FxBuildHasher>,
    route: Option<RouteEntry>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::with_hasher(FxBuildHasher),
            route: None,
        }
    }
}

/// Immutable suffix → backends table.
///
/// Suffixes are stored label-reversed in a trie, so a lookup walks the query
/// name from the root label down and keeps the deepest route seen: the
/// longest matching suffix always wins regardless of configuration order.
/// Two entries with the same suffix are resolved by configuration order, the
/// first one is kept.
pub struct RouteTable {
    root: TrieNode,
    len: usize,
}

impl RouteTable {
    pub fn new(entries: impl IntoIterator<Item = RouteEntry>) -> Self {
        let mut table = Self {
            root: TrieNode::new(),
            len: 0,
        };
        for entry in entries {
            table.insert(entry);
        }
        debug!(routes = table.len, "Route table built");
        table
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    fn insert(&mut self, entry: RouteEntry) {
        let mut node = &mut self.root;
        for label in labels(&entry.suffix) {
            node = node.children.entry(CompactString::new(label)).or_default();
        }

        match &node.route {
            Some(existing) => {
                warn!(
                    suffix = %entry.suffix,
                    kept = ?existing.backends,
                    ignored = ?entry.backends,
                    "Duplicate route suffix, keeping the first configured entry"
                );
            }
            None => {
                node.route = Some(entry);
                self.len += 1;
            }
        }
    }

    /// Longest configured suffix of `name`, if any.
    ///
    /// Empty or malformed names (empty labels) never match.
    pub fn lookup(&self, name: &str) -> Option<&RouteEntry> {
        if name.trim().is_empty() {
            return None;
        }
        let name = normalize_fqdn(name);
        let parts: SmallVec<[&str; 8]> = labels(&name).collect();
        if parts.iter().any(|l| l.is_empty()) {
            return None;
        }

        let mut node = &self.root;
        let mut best = node.route.as_ref();

        for label in parts {
            match node.children.get(label) {
                Some(child) => {
                    if child.route.is_some() {
                        best = child.route.as_ref();
                    }
                    node = child;
                }
                None => break,
            }
        }

        best
    }

    pub fn backends_for(&self, name: &str) -> Option<&[BackendAddr]> {
        self.lookup(name).map(|entry| &*entry.backends)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Labels of a normalized name, root-most first. The root name has none.
fn labels(name: &str) -> impl Iterator<Item = &str> {
    let body = name.strip_suffix('.').unwrap_or(name);
    body.split('.').rev().filter(move |_| !body.is_empty())
}

/// Picks one backend of a route uniformly at random.
pub fn pick_backend(backends: &[BackendAddr]) -> Option<&BackendAddr> {
    match backends.len() {
        0 => None,
        1 => backends.first(),
        n => backends.get(fastrand::usize(..n)),
    }
}
