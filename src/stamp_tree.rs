// src/stamp_tree.rs

use crate::error::Error;
use crate::model::Stamp;
use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, FixedOffset};
use std::io::Read;

/// A pre-built directory hierarchy with creation stamps, captured before
/// the repository's tracked history began. The tree is a flat node arena:
/// children of a node are stored consecutively, reachable from the
/// parent's first-child index and terminated by a node carrying the
/// last-sibling flag. Node 0 is a sentinel and never addressed; the root
/// is the last node in the array.
#[derive(Debug)]
pub struct SerializedTree {
    strings: Vec<u16>,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    name: u32,
    packed: u32,
    stamp: Stamp,
}

const LAST_CHILD_BIT: u32 = 1 << 31;

impl Node {
    fn first_child(&self) -> usize {
        (self.packed & !LAST_CHILD_BIT) as usize
    }

    fn is_last_child(&self) -> bool {
        self.packed & LAST_CHILD_BIT != 0
    }

    /// A node with no children is a file; everything else is a directory.
    fn is_leaf(&self) -> bool {
        self.first_child() == 0
    }
}

impl SerializedTree {
    /// Reads the wire format: a u32-counted buffer of UTF-16 name cells,
    /// then a u32-counted node array of (name index, packed child/sibling
    /// word, epoch seconds, offset seconds), all little-endian.
    pub fn decode<R: Read>(mut reader: R) -> Result<Self, Error> {
        let cell_count = reader.read_u32::<LittleEndian>()? as usize;
        let mut strings = Vec::with_capacity(cell_count.min(1 << 20));
        for _ in 0..cell_count {
            strings.push(reader.read_u16::<LittleEndian>()?);
        }

        let node_count = reader.read_u32::<LittleEndian>()? as usize;
        if node_count < 2 {
            return Err(Error::TreeDecode(format!(
                "node array has {node_count} entries, need at least a sentinel and a root"
            )));
        }
        let mut nodes = Vec::with_capacity(node_count.min(1 << 20));
        for i in 0..node_count {
            let name = reader.read_u32::<LittleEndian>()?;
            let packed = reader.read_u32::<LittleEndian>()?;
            let seconds = reader.read_i64::<LittleEndian>()?;
            let offset_seconds = reader.read_i32::<LittleEndian>()?;
            let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
                Error::TreeDecode(format!("node {i} has invalid timezone offset {offset_seconds}"))
            })?;
            let stamp = DateTime::from_timestamp(seconds, 0)
                .map(|utc| utc.with_timezone(&offset))
                .ok_or_else(|| {
                    Error::TreeDecode(format!("node {i} has out-of-range timestamp {seconds}"))
                })?;
            nodes.push(Node { name, packed, stamp });
        }

        let tree = SerializedTree { strings, nodes };
        tree.validate()?;
        Ok(tree)
    }

    fn validate(&self) -> Result<(), Error> {
        for (i, node) in self.nodes.iter().enumerate() {
            self.name(node)?;
            if node.is_leaf() {
                continue;
            }
            // children precede their parent, and the last-sibling flag
            // must close the chain before the parent's own index; this
            // rules out cycles and chains running off the array
            let mut child = node.first_child();
            loop {
                if child >= i {
                    return Err(Error::TreeDecode(format!(
                        "node {i} has a child chain that does not terminate before it"
                    )));
                }
                if self.nodes[child].is_last_child() {
                    break;
                }
                child += 1;
            }
        }
        Ok(())
    }

    fn name(&self, node: &Node) -> Result<String, Error> {
        let index = node.name as usize;
        let length = *self
            .strings
            .get(index)
            .ok_or_else(|| Error::TreeDecode(format!("name index {index} beyond string buffer")))?
            as usize;
        let cells = self.strings.get(index + 1..index + 1 + length).ok_or_else(|| {
            Error::TreeDecode(format!("name at {index} runs beyond string buffer"))
        })?;
        String::from_utf16(cells)
            .map_err(|_| Error::TreeDecode(format!("name at {index} is not valid UTF-16")))
    }

    fn root(&self) -> &Node {
        // validate() guarantees at least two nodes
        self.nodes.last().unwrap_or(&self.nodes[0])
    }

    fn children(&self, node: &Node) -> Children<'_> {
        Children {
            tree: self,
            next: if node.is_leaf() { None } else { Some(node.first_child()) },
        }
    }

    /// Yields `(relative-path, stamp)` for every file beneath the
    /// directory named by `prefix`. Segments are matched against child
    /// names case-insensitively; `/` (or an empty prefix) selects the
    /// whole tree. A segment with no matching child aborts the import.
    pub fn creation_stamps(&self, prefix: &str) -> Result<Vec<(String, Stamp)>, Error> {
        let normalized = prefix.replace('\\', "/");
        let mut node = *self.root();
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            node = self
                .children(&node)
                .find_map(|child| match self.name(&child) {
                    Ok(name) if name.eq_ignore_ascii_case(segment) => Some(Ok(child)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
                .transpose()?
                .ok_or_else(|| Error::PrefixNotFound(prefix.to_string()))?;
        }

        let mut stamps = Vec::new();
        self.collect(&node, "", &mut stamps)?;
        Ok(stamps)
    }

    fn collect(
        &self,
        node: &Node,
        path: &str,
        out: &mut Vec<(String, Stamp)>,
    ) -> Result<(), Error> {
        for child in self.children(node) {
            let name = self.name(&child)?;
            let child_path = if path.is_empty() {
                name
            } else {
                format!("{path}/{name}")
            };
            if child.is_leaf() {
                out.push((child_path, child.stamp));
            } else {
                self.collect(&child, &child_path, out)?;
            }
        }
        Ok(())
    }
}

struct Children<'a> {
    tree: &'a SerializedTree,
    next: Option<usize>,
}

impl Iterator for Children<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let index = self.next?;
        let node = *self.tree.nodes.get(index)?;
        // siblings are consecutive; the last one carries the flag
        self.next = if node.is_last_child() { None } else { Some(index + 1) };
        Some(node)
    }
}
