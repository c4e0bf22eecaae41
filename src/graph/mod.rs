use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ratings::{Interaction, Ratings};

/// Graph node
///
/// Users and items live in separate id spaces, so the same string can name
/// both a user node and an item node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    User(String),
    Item(String),
}

impl Node {
    pub fn user(id: impl Into<String>) -> Self {
        Node::User(id.into())
    }

    pub fn item(id: impl Into<String>) -> Self {
        Node::Item(id.into())
    }

    pub fn id(&self) -> &str {
        match self {
            Node::User(id) | Node::Item(id) => id,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Node::User(_))
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Node::Item(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::User(id) => write!(f, "user:{}", id),
            Node::Item(id) => write!(f, "item:{}", id),
        }
    }
}

/// Directed bipartite user/item graph
///
/// Every interaction becomes two weighted edges, user -> item and
/// item -> user. Node and edge order follow insertion order.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    adjacency: IndexMap<Node, IndexMap<Node, f64>>,
    edge_count: usize,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ratings(ratings: &Ratings) -> Self {
        let mut graph = Self::new();
        for interaction in ratings {
            graph.add_interaction(interaction);
        }
        graph
    }

    pub fn add_interaction(&mut self, interaction: &Interaction) {
        let user = Node::user(interaction.user_id.as_str());
        let item = Node::item(interaction.item_id.as_str());
        self.add_link(user.clone(), item.clone(), interaction.score);
        self.add_link(item, user, interaction.score);
    }

    /// Add (or overwrite) the directed edge `from -> to`
    pub fn add_link(&mut self, from: Node, to: Node, weight: f64) {
        self.adjacency.entry(from.clone()).or_default();
        self.adjacency.entry(to.clone()).or_default();
        if let Some(out) = self.adjacency.get_mut(&from) {
            if out.insert(to, weight).is_none() {
                self.edge_count += 1;
            }
        }
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn is_user(&self, id: &str) -> bool {
        self.adjacency.contains_key(&Node::user(id))
    }

    pub fn is_item(&self, id: &str) -> bool {
        self.adjacency.contains_key(&Node::item(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.adjacency.keys()
    }

    pub fn user_nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.adjacency.keys().filter(|n| n.is_user()).map(Node::id)
    }

    pub fn item_nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.adjacency.keys().filter(|n| n.is_item()).map(Node::id)
    }

    /// Outgoing edges of `node` with their weights; empty for unknown nodes
    pub fn successors<'a>(&'a self, node: &Node) -> impl Iterator<Item = (&'a Node, f64)> + 'a {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|out| out.iter().map(|(n, w)| (n, *w)))
    }

    #[inline]
    pub(crate) fn node_index(&self, node: &Node) -> Option<usize> {
        self.adjacency.get_index_of(node)
    }

    /// Outgoing edges by dense node index
    pub(crate) fn successors_by_index(&self, idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency
            .get_index(idx)
            .into_iter()
            .flat_map(move |(_, out)| {
                out.iter()
                    .filter_map(move |(n, w)| self.adjacency.get_index_of(n).map(|i| (i, *w)))
            })
    }

    /// User -> item edges as a ratings store
    pub fn to_ratings(&self) -> Ratings {
        let rows = self
            .adjacency
            .iter()
            .filter(|(from, _)| from.is_user())
            .flat_map(|(from, out)| {
                out.iter()
                    .filter(|(to, _)| to.is_item())
                    .map(move |(to, w)| Interaction::new(from.id(), to.id(), *w))
            })
            .collect::<Vec<_>>();
        Ratings::from_list(rows)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings() -> Ratings {
        Ratings::from_uir([
            ("u1", "i1", 5.0),
            ("u1", "i2", 3.0),
            ("u2", "i2", 4.0),
            ("u2", "i3", 1.0),
        ])
    }

    #[test]
    fn builds_bipartite_edges() {
        let graph = InteractionGraph::from_ratings(&ratings());
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 8);
        assert_eq!(graph.user_nodes().collect::<Vec<_>>(), vec!["u1", "u2"]);
        assert_eq!(graph.item_nodes().collect::<Vec<_>>(), vec!["i1", "i2", "i3"]);

        let out: Vec<_> = graph.successors(&Node::item("i2")).collect();
        assert_eq!(out, vec![(&Node::user("u1"), 3.0), (&Node::user("u2"), 4.0)]);
        assert_eq!(graph.successors(&Node::user("ghost")).count(), 0);
    }

    #[test]
    fn same_id_for_user_and_item_are_distinct_nodes() {
        let graph = InteractionGraph::from_ratings(&Ratings::from_uir([("x", "x", 1.0)]));
        assert!(graph.is_user("x"));
        assert!(graph.is_item("x"));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn relinking_overwrites_weight() {
        let mut graph = InteractionGraph::new();
        graph.add_link(Node::user("u"), Node::item("i"), 1.0);
        graph.add_link(Node::user("u"), Node::item("i"), 2.0);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.successors(&Node::user("u")).next(), Some((&Node::item("i"), 2.0)));
    }

    #[test]
    fn to_ratings_keeps_only_user_to_item_edges() {
        let graph = InteractionGraph::from_ratings(&ratings());
        let back = graph.to_ratings();
        assert_eq!(back.len(), 4);
        assert_eq!(back.triples().collect::<Vec<_>>(), ratings().triples().collect::<Vec<_>>());
    }
}
