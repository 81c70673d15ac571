use std::fmt;
use std::iter;
use std::rc::Rc;

use crate::value::ObservableValue;

const ROOT: usize = 0;

struct TreeNode<V> {
    name: String,
    // Segments of elided pass-through ancestors, outermost first.
    skipped: Vec<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    values: Vec<Rc<ObservableValue<V>>>,
}

impl<V> TreeNode<V> {
    fn new(name: String, parent: Option<usize>) -> Self {
        Self {
            name,
            skipped: Vec::new(),
            parent,
            children: Vec::new(),
            values: Vec::new(),
        }
    }

    fn is_pass_through(&self) -> bool {
        self.values.is_empty() && self.children.len() == 1
    }

    fn segments(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.skipped
            .iter()
            .map(String::as_str)
            .chain(iter::once(self.name.as_str()))
    }
}

/// Compressed tree of the paths a projected store reads from.
///
/// Every declared field's observable is hosted at the node of its parent
/// path. After construction, every node is the root, hosts at least one value,
/// or has at least two children: single-child pass-through nodes are elided and
/// remembered as the surviving node's [`skipped`](NodeRef::skipped) prefix.
///
/// Projecting `meta.image.quality.low.h`, `meta.image.quality.high.h` and
/// `text` yields a root hosting `text` with a single `quality` child (having
/// skipped `meta` and `image`) that branches into `low` and `high`.
///
/// The tree is only consulted for introspection; field reads and writes go
/// straight to the observables.
pub struct ProjectionTree<V> {
    nodes: Vec<TreeNode<V>>,
}

impl<V> ProjectionTree<V> {
    /// The root node.
    pub fn root(&self) -> NodeRef<'_, V> {
        NodeRef {
            tree: self,
            index: ROOT,
        }
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node at the full source path `path`, if one survived compression.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeRef<'_, V>> {
        let mut current = ROOT;
        let mut rest = path;
        while !rest.is_empty() {
            let (child, hop) = self.nodes[current].children.iter().find_map(|&child| {
                let node = &self.nodes[child];
                let hop = node.skipped.len() + 1;
                let matches = rest.len() >= hop
                    && node
                        .segments()
                        .zip(rest)
                        .all(|(segment, wanted)| segment == wanted.as_ref());
                matches.then_some((child, hop))
            })?;
            current = child;
            rest = &rest[hop..];
        }
        Some(NodeRef {
            tree: self,
            index: current,
        })
    }

    /// Node hosting the field `key`.
    pub fn host_of(&self, key: &str) -> Option<NodeRef<'_, V>> {
        self.nodes
            .iter()
            .position(|node| node.values.iter().any(|value| value.key() == key))
            .map(|index| NodeRef { tree: self, index })
    }

    fn child_or_insert(&mut self, parent: usize, segment: &str) -> usize {
        let existing = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].name == segment);
        if let Some(child) = existing {
            return child;
        }
        let child = self.nodes.len();
        self.nodes.push(TreeNode::new(segment.to_owned(), Some(parent)));
        self.nodes[parent].children.push(child);
        child
    }

    /// Elide pass-through nodes.
    ///
    /// Post-order over an explicit stack, so arbitrarily deep sources never
    /// recurse. When a node is finished all of its children are final, so a
    /// pass-through child can be replaced by its single (already compressed)
    /// child in one step.
    ///
    /// While compressing, `skipped` is kept innermost first so each elision is
    /// a push; it is flipped to outermost first once at the end.
    fn compress(&mut self) {
        let mut stack = vec![(ROOT, false)];
        while let Some((index, expanded)) = stack.pop() {
            if !expanded {
                stack.push((index, true));
                stack.extend(self.nodes[index].children.iter().map(|&child| (child, false)));
                continue;
            }

            let children = std::mem::take(&mut self.nodes[index].children);
            let children = children
                .into_iter()
                .map(|child| self.collapse(child, index))
                .collect();
            self.nodes[index].children = children;
        }

        for node in &mut self.nodes {
            node.skipped.reverse();
        }
    }

    fn collapse(&mut self, index: usize, parent: usize) -> usize {
        if !self.nodes[index].is_pass_through() {
            return index;
        }

        let elided = &mut self.nodes[index];
        let survivor = elided.children[0];
        let name = std::mem::take(&mut elided.name);
        let mut outer = std::mem::take(&mut elided.skipped);
        elided.children.clear();
        elided.parent = None;

        let node = &mut self.nodes[survivor];
        node.skipped.push(name);
        node.skipped.append(&mut outer);
        node.parent = Some(parent);
        survivor
    }

    /// Drop nodes no longer reachable from the root, keeping breadth-first
    /// order.
    fn prune(&mut self) {
        let mut order = vec![ROOT];
        let mut cursor = 0;
        while cursor < order.len() {
            order.extend(self.nodes[order[cursor]].children.iter().copied());
            cursor += 1;
        }

        let mut remap = vec![None; self.nodes.len()];
        for (new_index, &old_index) in order.iter().enumerate() {
            remap[old_index] = Some(new_index);
        }

        let mut slots: Vec<Option<TreeNode<V>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        self.nodes = order
            .iter()
            .filter_map(|&old_index| slots[old_index].take())
            .map(|mut node| {
                node.parent = node.parent.and_then(|parent| remap[parent]);
                node.children = node
                    .children
                    .iter()
                    .filter_map(|&child| remap[child])
                    .collect();
                node
            })
            .collect();
    }
}

/// Builds a [`ProjectionTree`] one hosted value at a time.
pub(crate) struct TreeBuilder<V> {
    tree: ProjectionTree<V>,
}

impl<V> TreeBuilder<V> {
    pub(crate) fn new() -> Self {
        Self {
            tree: ProjectionTree {
                nodes: vec![TreeNode::new(String::new(), None)],
            },
        }
    }

    /// Host `value` at `path`, creating intermediate nodes on demand.
    pub(crate) fn attach(&mut self, path: &[String], value: Rc<ObservableValue<V>>) {
        let host = path
            .iter()
            .fold(ROOT, |node, segment| self.tree.child_or_insert(node, segment));
        self.tree.nodes[host].values.push(value);
    }

    pub(crate) fn finish(mut self) -> ProjectionTree<V> {
        self.tree.compress();
        self.tree.prune();
        self.tree
    }
}

/// Borrowed view of one [`ProjectionTree`] node.
pub struct NodeRef<'a, V> {
    tree: &'a ProjectionTree<V>,
    index: usize,
}

impl<V> Clone for NodeRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for NodeRef<'_, V> {}

impl<'a, V> NodeRef<'a, V> {
    fn node(&self) -> &'a TreeNode<V> {
        &self.tree.nodes[self.index]
    }

    fn at(&self, index: usize) -> NodeRef<'a, V> {
        NodeRef {
            tree: self.tree,
            index,
        }
    }

    /// Own path segment. Empty for the root.
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    /// Segments of the elided ancestors between this node and its parent.
    pub fn skipped(&self) -> &'a [String] {
        &self.node().skipped
    }

    /// Whether this is the root.
    pub fn is_root(&self) -> bool {
        self.index == ROOT
    }

    /// Parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeRef<'a, V>> {
        self.node().parent.map(|parent| self.at(parent))
    }

    /// Child nodes in declaration order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, V>> + 'a {
        let this = *self;
        self.node().children.iter().map(move |&child| this.at(child))
    }

    /// Child whose own name is `name`.
    pub fn child(&self, name: &str) -> Option<NodeRef<'a, V>> {
        self.children().find(|child| child.name() == name)
    }

    /// Full source path from the root, elided segments included.
    pub fn path(&self) -> Vec<&'a str> {
        let mut segments = Vec::new();
        let mut current = Some(*self);
        while let Some(node) = current.filter(|node| !node.is_root()) {
            segments.extend(node.node().segments().rev());
            current = node.parent();
        }
        segments.reverse();
        segments
    }

    /// Keys of the fields hosted here.
    pub fn value_keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.node().values.iter().map(|value| value.key())
    }

    /// Observable hosted here under `key`.
    pub fn observable(&self, key: &str) -> Option<&'a Rc<ObservableValue<V>>> {
        self.node().values.iter().find(|value| value.key() == key)
    }
}

impl<'a, V: Clone + PartialEq + 'static> NodeRef<'a, V> {
    /// Current value of the field hosted here under `key`.
    pub fn value(&self, key: &str) -> Option<V> {
        self.observable(key).map(|value| value.get())
    }
}

impl<V: fmt::Debug> fmt::Debug for ProjectionTree<V> {
    /// Indented outline, one node per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = &self.nodes[index];
            let label = if index == ROOT {
                "(root)".to_owned()
            } else {
                node.segments().collect::<Vec<_>>().join(".")
            };
            write!(f, "{:indent$}{label}", "", indent = depth * 2)?;
            for value in &node.values {
                value.with(|current| write!(f, " [{} = {current:?}]", value.key()))?;
            }
            writeln!(f)?;
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: &str, value: i32) -> Rc<ObservableValue<i32>> {
        Rc::new(ObservableValue::new(key, value))
    }

    fn path(dotted: &str) -> Vec<String> {
        dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn single_branch_collapses_into_leaf_host() {
        let mut builder = TreeBuilder::new();
        builder.attach(&path("a.b.c"), leaf("deep", 1));
        let tree = builder.finish();

        assert_eq!(tree.node_count(), 2);
        let host = tree.root().children().next().unwrap();
        assert_eq!(host.name(), "c");
        assert_eq!(host.skipped(), ["a", "b"]);
        assert_eq!(host.path(), vec!["a", "b", "c"]);
        assert_eq!(host.value("deep"), Some(1));
    }

    #[test]
    fn branching_node_survives() {
        let mut builder = TreeBuilder::new();
        builder.attach(&path("a.b.low"), leaf("low", 200));
        builder.attach(&path("a.b.high"), leaf("high", 1600));
        builder.attach(&path(""), leaf("text", 0));
        let tree = builder.finish();

        let root = tree.root();
        assert_eq!(root.value_keys().collect::<Vec<_>>(), vec!["text"]);
        let b = root.child("b").unwrap();
        assert_eq!(b.skipped(), ["a"]);
        assert_eq!(
            b.children().map(|child| child.name()).collect::<Vec<_>>(),
            vec!["low", "high"]
        );
        assert_eq!(tree.node_count(), 4);
        assert_eq!(b.parent().map(|parent| parent.is_root()), Some(true));
    }

    #[test]
    fn value_hosting_pass_through_is_kept() {
        let mut builder = TreeBuilder::new();
        builder.attach(&path("a"), leaf("mid", 1));
        builder.attach(&path("a.b.c"), leaf("deep", 2));
        let tree = builder.finish();

        let a = tree.root().child("a").unwrap();
        assert_eq!(a.value("mid"), Some(1));
        let c = a.child("c").unwrap();
        assert_eq!(c.skipped(), ["b"]);
        assert_eq!(tree.find(&["a", "b", "c"]).map(|node| node.name()), Some("c"));
        assert!(tree.find(&["a", "b"]).is_none());
        assert_eq!(tree.host_of("deep").map(|node| node.name()), Some("c"));
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let deep: Vec<String> = (0..200_000).map(|depth| depth.to_string()).collect();
        let mut builder = TreeBuilder::new();
        builder.attach(&deep, leaf("bottom", 7));
        let tree = builder.finish();

        assert_eq!(tree.node_count(), 2);
        let host = tree.host_of("bottom").unwrap();
        assert_eq!(host.name(), "199999");
        assert_eq!(host.skipped().len(), 199_999);
        assert_eq!(host.skipped().first().map(String::as_str), Some("0"));
        assert_eq!(host.skipped().last().map(String::as_str), Some("199998"));
        assert_eq!(host.path(), deep.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn elided_segments_keep_source_order() {
        let mut builder = TreeBuilder::new();
        builder.attach(&path("a.b.c.d.x"), leaf("x", 1));
        builder.attach(&path("a.b.c.d.y.z.w"), leaf("w", 2));
        let tree = builder.finish();

        let d = tree.root().child("d").unwrap();
        assert_eq!(d.skipped(), ["a", "b", "c"]);
        let w = d.child("w").unwrap();
        assert_eq!(w.skipped(), ["y", "z"]);
        assert_eq!(w.path(), vec!["a", "b", "c", "d", "y", "z", "w"]);
        assert_eq!(
            tree.find(&["a", "b", "c", "d", "y", "z", "w"]).map(|node| node.name()),
            Some("w")
        );
    }

    #[test]
    fn debug_outline_lists_hosted_values() {
        let mut builder = TreeBuilder::new();
        builder.attach(&path("a.x"), leaf("x", 1));
        builder.attach(&path("a.y"), leaf("y", 2));
        let outline = format!("{:?}", builder.finish());
        assert_eq!(outline, "(root)\n  a\n    x [x = 1]\n    y [y = 2]\n");
    }
}
