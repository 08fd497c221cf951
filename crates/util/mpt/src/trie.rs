use alloy_primitives::{keccak256, B256};
use alloy_rlp::EMPTY_STRING_CODE;

use crate::{
    error::TrieError,
    nibbles::{common_prefix, to_nibbles},
    node::{empty_children, Child, Node, NodeStore},
};

/// Root of a trie with no entries.
pub fn empty_root() -> B256 {
    keccak256([EMPTY_STRING_CODE])
}

/// Merkle-Patricia trie known only through the nodes it was given.
///
/// Reads, proofs and updates work for any key whose path runs through known
/// nodes and fail with [`TrieError::MissingNode`] otherwise. Updates never
/// delete, so storing an empty value is not supported.
#[derive(Clone, Debug)]
pub struct PartialTrie {
    root: B256,
    store: NodeStore,
}

impl PartialTrie {
    pub fn new(root: B256) -> Self {
        let mut store = NodeStore::default();
        store.insert(vec![EMPTY_STRING_CODE]);
        Self { root, store }
    }

    /// Builds a trie from the nodes of one or more proofs against `root`.
    pub fn from_proof(root: B256, nodes: &[Vec<u8>]) -> Self {
        let mut trie = Self::new(root);
        trie.add_proof_nodes(nodes);
        trie
    }

    pub fn add_proof_nodes(&mut self, nodes: &[Vec<u8>]) {
        for node in nodes {
            self.store.insert(node.clone());
        }
    }

    pub fn root(&self) -> B256 {
        self.root
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        self.walk(key, |_| {})
    }

    /// Nodes from the root along the path of `key`, enough to prove its
    /// value or its absence.
    pub fn prove(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, TrieError> {
        let mut proof = Vec::new();
        self.walk(key, |raw| proof.push(raw.to_vec()))?;
        Ok(proof)
    }

    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), TrieError> {
        if value.is_empty() {
            return Err(TrieError::MalformedNode("empty value"));
        }

        let root = Node::decode(self.store.get(&self.root)?)?;
        let updated = self.insert_at(root, &to_nibbles(key), value)?;
        let raw = updated.encode(&mut self.store);
        self.root = self.store.insert(raw);
        Ok(())
    }

    /// Proves `key` against the current root, then stores `value` under it.
    /// The returned proof together with `value` lets a verifier derive the
    /// new root.
    pub fn update_and_prove(
        &mut self,
        key: &[u8],
        value: Vec<u8>,
    ) -> Result<Vec<Vec<u8>>, TrieError> {
        let proof = self.prove(key)?;
        self.insert(key, value)?;
        Ok(proof)
    }

    fn walk(&self, key: &[u8], mut visit: impl FnMut(&[u8])) -> Result<Option<Vec<u8>>, TrieError> {
        let raw = self.store.get(&self.root)?;
        visit(raw);
        let mut node = Node::decode(raw)?;

        let nibbles = to_nibbles(key);
        let mut path = nibbles.as_slice();

        loop {
            let child = match node {
                Node::Empty => return Ok(None),
                Node::Leaf { path: rest, value } => {
                    return Ok((rest.as_slice() == path).then_some(value));
                }
                Node::Extension { path: prefix, child } => {
                    if !path.starts_with(&prefix) {
                        return Ok(None);
                    }
                    path = &path[prefix.len()..];
                    child
                }
                Node::Branch { mut children, value } => {
                    let Some((&idx, rest)) = path.split_first() else {
                        return Ok(value);
                    };
                    path = rest;
                    std::mem::replace(&mut children[idx as usize], Child::Empty)
                }
            };

            node = match child {
                Child::Empty => return Ok(None),
                Child::Hash(hash) => {
                    let raw = self.store.get(&hash)?;
                    visit(raw);
                    Node::decode(raw)?
                }
                Child::Node(inner) => *inner,
            };
        }
    }

    fn resolve(&self, child: Child) -> Result<Node, TrieError> {
        match child {
            Child::Empty => Ok(Node::Empty),
            Child::Hash(hash) => Node::decode(self.store.get(&hash)?),
            Child::Node(node) => Ok(*node),
        }
    }

    /// Stores `value` at `path` below `node`. Only nodes on the path are
    /// resolved, siblings keep their references.
    fn insert_at(&self, node: Node, path: &[u8], value: Vec<u8>) -> Result<Node, TrieError> {
        let updated = match node {
            Node::Empty => Node::Leaf {
                path: path.to_vec(),
                value,
            },

            Node::Leaf {
                path: leaf_path,
                value: leaf_value,
            } => {
                if leaf_path.as_slice() == path {
                    return Ok(Node::Leaf {
                        path: leaf_path,
                        value,
                    });
                }

                let shared = common_prefix(&leaf_path, path);
                let mut children = empty_children();
                let mut branch_value = None;
                attach_leaf(&mut children, &mut branch_value, &leaf_path[shared..], leaf_value);
                attach_leaf(&mut children, &mut branch_value, &path[shared..], value);
                with_prefix(
                    &path[..shared],
                    Node::Branch {
                        children,
                        value: branch_value,
                    },
                )
            }

            Node::Extension {
                path: prefix,
                child,
            } => {
                let shared = common_prefix(&prefix, path);
                if shared == prefix.len() {
                    let below = self.resolve(child)?;
                    let below = self.insert_at(below, &path[shared..], value)?;
                    return Ok(Node::Extension {
                        path: prefix,
                        child: Child::Node(Box::new(below)),
                    });
                }

                let mut children = empty_children();
                let mut branch_value = None;
                let tail = &prefix[shared + 1..];
                children[prefix[shared] as usize] = if tail.is_empty() {
                    child
                } else {
                    Child::Node(Box::new(Node::Extension {
                        path: tail.to_vec(),
                        child,
                    }))
                };
                attach_leaf(&mut children, &mut branch_value, &path[shared..], value);
                with_prefix(
                    &prefix[..shared],
                    Node::Branch {
                        children,
                        value: branch_value,
                    },
                )
            }

            Node::Branch {
                mut children,
                value: branch_value,
            } => match path.split_first() {
                None => Node::Branch {
                    children,
                    value: Some(value),
                },
                Some((&idx, rest)) => {
                    let slot = &mut children[idx as usize];
                    let below = self.resolve(std::mem::replace(slot, Child::Empty))?;
                    *slot = Child::Node(Box::new(self.insert_at(below, rest, value)?));
                    Node::Branch {
                        children,
                        value: branch_value,
                    }
                }
            },
        };

        Ok(updated)
    }
}

fn attach_leaf(
    children: &mut [Child; 16],
    branch_value: &mut Option<Vec<u8>>,
    path: &[u8],
    value: Vec<u8>,
) {
    match path.split_first() {
        None => *branch_value = Some(value),
        Some((&idx, rest)) => {
            children[idx as usize] = Child::Node(Box::new(Node::Leaf {
                path: rest.to_vec(),
                value,
            }));
        }
    }
}

fn with_prefix(prefix: &[u8], node: Node) -> Node {
    if prefix.is_empty() {
        node
    } else {
        Node::Extension {
            path: prefix.to_vec(),
            child: Child::Node(Box::new(node)),
        }
    }
}
