//! Generic level-typed tree reader.
//!
//! A tree stream is laid out as:
//!
//! ```text
//! tag (4) | level count (i32) | record size per level (i32 * levels) | nodes
//! ```
//!
//! and every node as `record (size[level]) | child count (i32) | children`,
//! written in pre-order. Nodes are stored in an arena in the same order, so
//! the root is always index 0.

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::{BundleError, Result};
use super::record::{decode, Record};
use super::schema::{Endian, Schema};

/// Upper bound on the level count a stream may declare.
pub const MAX_LEVELS: usize = 16;

#[derive(Debug, Clone)]
struct Node {
    level: usize,
    record: Record,
    children: Vec<usize>,
}

/// An immutable decoded tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    level_sizes: Vec<usize>,
}

impl Tree {
    /// Parse the tree that follows a stream's four-byte tag.
    ///
    /// `bytes` starts right after the tag; `base` is the absolute file offset
    /// of `bytes[0]` and is only used for error reporting.
    pub fn parse(
        extension: &'static str,
        levels: &'static [&'static Schema],
        bytes: &[u8],
        base: u64,
        endian: Endian,
    ) -> Result<Self> {
        let mut cursor = Cursor {
            extension,
            bytes,
            pos: 0,
            base,
            endian,
        };

        let declared = cursor.read_i32()?;
        let count = usize::try_from(declared)
            .ok()
            .filter(|count| (1..=MAX_LEVELS).contains(count))
            .ok_or_else(|| {
                BundleError::invalid_tree(extension, base, format!("level count {declared}"))
            })?;

        let mut level_sizes = Vec::with_capacity(count);
        for level in 0..count {
            let size = cursor.read_i32()?;
            let size = usize::try_from(size).map_err(|_| {
                BundleError::invalid_tree(
                    extension,
                    cursor.offset(),
                    format!("negative record size {size} at level {level}"),
                )
            })?;
            level_sizes.push(size);
        }

        let mut builder = Builder {
            levels,
            level_sizes: &level_sizes,
            nodes: Vec::new(),
        };
        builder.read_node(&mut cursor, 0)?;

        Ok(Tree {
            nodes: builder.nodes,
            level_sizes,
        })
    }

    pub fn root(&self) -> TreeNode<'_> {
        TreeNode { tree: self, id: 0 }
    }

    pub fn node(&self, id: usize) -> Option<TreeNode<'_>> {
        (id < self.nodes.len()).then_some(TreeNode { tree: self, id })
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Record sizes declared by the stream, one per level.
    pub fn level_sizes(&self) -> &[usize] {
        &self.level_sizes
    }

    /// Every node in pre-order.
    pub fn walk(&self) -> impl Iterator<Item = TreeNode<'_>> {
        (0..self.nodes.len()).map(move |id| TreeNode { tree: self, id })
    }
}

/// A borrowed view of one node.
#[derive(Debug, Clone, Copy)]
pub struct TreeNode<'a> {
    tree: &'a Tree,
    id: usize,
}

impl<'a> TreeNode<'a> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn level(&self) -> usize {
        self.tree.nodes[self.id].level
    }

    pub fn record(&self) -> &'a Record {
        &self.tree.nodes[self.id].record
    }

    pub fn len(&self) -> usize {
        self.tree.nodes[self.id].children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child(&self, index: usize) -> Option<TreeNode<'a>> {
        self.tree.nodes[self.id]
            .children
            .get(index)
            .map(|&id| TreeNode { tree: self.tree, id })
    }

    pub fn children(&self) -> Children<'a> {
        Children {
            tree: self.tree,
            ids: self.tree.nodes[self.id].children.iter(),
        }
    }
}

/// Iterator over a node's children. Call [`TreeNode::children`] again for a
/// fresh pass.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    tree: &'a Tree,
    ids: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for Children<'a> {
    type Item = TreeNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|&id| TreeNode { tree: self.tree, id })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.ids.next_back().map(|&id| TreeNode { tree: self.tree, id })
    }
}

struct Cursor<'a> {
    extension: &'static str,
    bytes: &'a [u8],
    pos: usize,
    base: u64,
    endian: Endian,
}

impl<'a> Cursor<'a> {
    fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.bytes.len() - self.pos;
        if available < len {
            return Err(BundleError::Truncated {
                offset: self.offset(),
                needed: len,
                available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32> {
        let raw = self.take(4)?;
        Ok(match self.endian {
            Endian::Little => LittleEndian::read_i32(raw),
            Endian::Big => BigEndian::read_i32(raw),
        })
    }
}

struct Builder<'s> {
    levels: &'static [&'static Schema],
    level_sizes: &'s [usize],
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn read_node(&mut self, cursor: &mut Cursor<'_>, level: usize) -> Result<usize> {
        let offset = cursor.offset();
        let (Some(&schema), Some(&size)) = (self.levels.get(level), self.level_sizes.get(level)) else {
            return Err(BundleError::invalid_tree(
                cursor.extension,
                offset,
                format!("node at level {level} beyond the registered levels"),
            ));
        };

        let raw = cursor.take(size)?;
        let record = decode(schema, &fit_to(raw, schema.required_size), cursor.endian)?;

        let declared = cursor.read_i32()?;
        let child_count = usize::try_from(declared).map_err(|_| {
            BundleError::invalid_tree(
                cursor.extension,
                offset,
                format!("negative child count {declared}"),
            )
        })?;

        let id = self.nodes.len();
        self.nodes.push(Node {
            level,
            record,
            children: Vec::with_capacity(child_count.min(1024)),
        });

        for _ in 0..child_count {
            let child = self.read_node(cursor, level + 1)?;
            self.nodes[id].children.push(child);
        }

        Ok(id)
    }
}

/// Zero-pad or truncate a stored record to the schema size.
fn fit_to(raw: &[u8], size: usize) -> Cow<'_, [u8]> {
    if raw.len() >= size {
        Cow::Borrowed(&raw[..size])
    } else {
        let mut padded = raw.to_vec();
        padded.resize(size, 0);
        Cow::Owned(padded)
    }
}
