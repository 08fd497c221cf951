//! Trie nodes and their RLP encoding.

use std::collections::HashMap;

use alloy_primitives::{keccak256, B256};
use alloy_rlp::{Encodable, Header, EMPTY_STRING_CODE};

use crate::{
    error::TrieError,
    nibbles::{decode_path, encode_path},
};

/// Reference from a node to one below it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Child {
    Empty,
    Hash(B256),
    /// Node whose encoding is shorter than a hash, embedded in its parent.
    Node(Box<Node>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Node {
    Empty,
    Leaf { path: Vec<u8>, value: Vec<u8> },
    Extension { path: Vec<u8>, child: Child },
    Branch {
        children: Box<[Child; 16]>,
        value: Option<Vec<u8>>,
    },
}

pub(crate) fn empty_children() -> Box<[Child; 16]> {
    Box::new(std::array::from_fn(|_| Child::Empty))
}

/// Encoded nodes by hash.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeStore {
    nodes: HashMap<B256, Vec<u8>>,
}

impl NodeStore {
    pub(crate) fn insert(&mut self, raw: Vec<u8>) -> B256 {
        let hash = keccak256(&raw);
        self.nodes.insert(hash, raw);
        hash
    }

    pub(crate) fn get(&self, hash: &B256) -> Result<&[u8], TrieError> {
        self.nodes
            .get(hash)
            .map(Vec::as_slice)
            .ok_or(TrieError::MissingNode(*hash))
    }
}

impl Node {
    pub(crate) fn decode(raw: &[u8]) -> Result<Self, TrieError> {
        if raw == [EMPTY_STRING_CODE].as_slice() {
            return Ok(Node::Empty);
        }

        let items = list_items(raw)?;
        match items.len() {
            2 => {
                let (path, is_leaf) = decode_path(string_payload(items[0])?)?;
                if is_leaf {
                    let value = string_payload(items[1])?.to_vec();
                    Ok(Node::Leaf { path, value })
                } else {
                    let child = Child::decode(items[1])?;
                    Ok(Node::Extension { path, child })
                }
            }
            17 => {
                let mut children = empty_children();
                for (slot, item) in children.iter_mut().zip(&items[..16]) {
                    *slot = Child::decode(item)?;
                }
                let value = string_payload(items[16])?;
                Ok(Node::Branch {
                    children,
                    value: (!value.is_empty()).then(|| value.to_vec()),
                })
            }
            _ => Err(TrieError::MalformedNode("expected 2 or 17 items")),
        }
    }

    /// RLP encoding of the node. Children of 32 bytes or more are put in
    /// `store` and referenced by hash.
    pub(crate) fn encode(&self, store: &mut NodeStore) -> Vec<u8> {
        match self {
            Node::Empty => vec![EMPTY_STRING_CODE],
            Node::Leaf { path, value } => {
                encode_list(&[encode_bytes(&encode_path(path, true)), encode_bytes(value)])
            }
            Node::Extension { path, child } => encode_list(&[
                encode_bytes(&encode_path(path, false)),
                child.encode_ref(store),
            ]),
            Node::Branch { children, value } => {
                let mut items: Vec<_> = children.iter().map(|c| c.encode_ref(store)).collect();
                items.push(encode_bytes(value.as_deref().unwrap_or_default()));
                encode_list(&items)
            }
        }
    }
}

impl Child {
    fn decode(item: &[u8]) -> Result<Self, TrieError> {
        let mut buf = item;
        let (header, payload) = next_item(&mut buf)?;
        if header.list {
            return Ok(Child::Node(Box::new(Node::decode(item)?)));
        }

        match payload.len() {
            0 => Ok(Child::Empty),
            32 => Ok(Child::Hash(B256::from_slice(payload))),
            _ => Err(TrieError::MalformedNode("child is neither a hash nor inline")),
        }
    }

    fn encode_ref(&self, store: &mut NodeStore) -> Vec<u8> {
        match self {
            Child::Empty => vec![EMPTY_STRING_CODE],
            Child::Hash(hash) => encode_bytes(hash.as_slice()),
            Child::Node(node) => {
                let raw = node.encode(store);
                if raw.len() < 32 {
                    raw
                } else {
                    encode_bytes(store.insert(raw).as_slice())
                }
            }
        }
    }
}

/// Splits the first item off `buf`, returning its header and payload.
fn next_item<'a>(buf: &mut &'a [u8]) -> Result<(Header, &'a [u8]), TrieError> {
    let start = *buf;
    let mut rest = start;
    let header = Header::decode(&mut rest)?;
    if rest.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort.into());
    }

    let header_len = start.len() - rest.len();
    *buf = &start[header_len + header.payload_length..];
    let payload = &rest[..header.payload_length];
    Ok((header, payload))
}

/// Items of an RLP list, each with its own header.
fn list_items(raw: &[u8]) -> Result<Vec<&[u8]>, TrieError> {
    let mut buf = raw;
    let (header, mut payload) = next_item(&mut buf)?;
    if !header.list || !buf.is_empty() {
        return Err(TrieError::MalformedNode("node is not a single list"));
    }

    let mut items = Vec::new();
    while !payload.is_empty() {
        let before = payload;
        next_item(&mut payload)?;
        items.push(&before[..before.len() - payload.len()]);
    }
    Ok(items)
}

fn string_payload(item: &[u8]) -> Result<&[u8], TrieError> {
    let mut buf = item;
    let (header, payload) = next_item(&mut buf)?;
    if header.list {
        return Err(TrieError::MalformedNode("expected a string"));
    }
    Ok(payload)
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 5);
    bytes.encode(&mut out);
    out
}

fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_length = items.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}
