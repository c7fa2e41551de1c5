//! Comment threading: turns the flat records of one listing into an ordered
//! forest, and mutates that forest in place for the local-only board.
//!
//! All walks use an explicit stack, so nesting depth never grows the call
//! stack.

use std::collections::HashMap;

use crate::error::BoardError;
use crate::models::{CommentNode, CommentRecord, LikeDelta};

/// The assembled forest plus the ids that could not be attached to any root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub forest: Vec<CommentNode>,
    pub orphans: Vec<String>,
}

/// Builds the ordered forest, silently dropping orphans.
pub fn build_forest(records: Vec<CommentRecord>) -> Vec<CommentNode> {
    assemble(records).forest
}

/// Builds the ordered forest and reports which records were dropped.
///
/// Duplicate ids keep the last record seen. Roots and every child list are
/// ordered by `(created_at, id)`. A record is kept only if following its
/// `parent_id` chain ends at a root, so dangling parents, self references
/// and `parent_id` cycles all end up in `orphans`.
pub fn assemble(records: Vec<CommentRecord>) -> Assembly {
    let records = dedup_last_write_wins(records);

    let (mut roots, mut children_of) = {
        let index: HashMap<&str, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let mut roots: Vec<usize> = Vec::new();
        let mut children_of: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            match record.parent_id.as_deref() {
                None => roots.push(i),
                Some(parent) => {
                    if let Some(&p) = index.get(parent) {
                        if p != i {
                            children_of.entry(p).or_default().push(i);
                        }
                    }
                }
            }
        }
        (roots, children_of)
    };

    let by_key = |a: &usize, b: &usize| records[*a].sort_key().cmp(&records[*b].sort_key());
    roots.sort_by(by_key);
    for siblings in children_of.values_mut() {
        siblings.sort_by(by_key);
    }

    // Breadth-first placement: every entry knows the position of its parent
    // in `order`, which always precedes it.
    let mut visited = vec![false; records.len()];
    let mut order: Vec<(usize, Option<usize>)> = Vec::with_capacity(records.len());
    for &r in &roots {
        visited[r] = true;
        order.push((r, None));
    }
    let mut cursor = 0;
    while cursor < order.len() {
        let (idx, _) = order[cursor];
        if let Some(kids) = children_of.get(&idx) {
            for &k in kids {
                if !visited[k] {
                    visited[k] = true;
                    order.push((k, Some(cursor)));
                }
            }
        }
        cursor += 1;
    }

    let mut pool: Vec<Option<CommentRecord>> = records.into_iter().map(Some).collect();
    let mut slots: Vec<Option<CommentNode>> = order
        .iter()
        .map(|(idx, _)| pool[*idx].take().map(CommentNode::leaf))
        .collect();

    // Children sit after their parent in `order`, so walking backwards
    // completes each subtree before it is moved into its parent.
    let mut forest = Vec::with_capacity(roots.len());
    for pos in (0..order.len()).rev() {
        let Some(mut node) = slots[pos].take() else {
            continue;
        };
        node.children.reverse();
        match order[pos].1 {
            Some(parent_pos) => {
                if let Some(parent) = slots[parent_pos].as_mut() {
                    parent.children.push(node);
                }
            }
            None => forest.push(node),
        }
    }
    forest.reverse();

    let mut orphans: Vec<String> = pool.into_iter().flatten().map(|r| r.id).collect();
    orphans.sort();

    Assembly { forest, orphans }
}

fn dedup_last_write_wins(records: Vec<CommentRecord>) -> Vec<CommentRecord> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<CommentRecord> = Vec::with_capacity(records.len());
    for record in records {
        match seen.get(&record.id) {
            Some(&i) => out[i] = record,
            None => {
                seen.insert(record.id.clone(), out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Depth-first search in pre-order, stopping at the first match.
pub fn find<'a>(forest: &'a [CommentNode], id: &str) -> Option<&'a CommentNode> {
    let mut stack: Vec<&'a CommentNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if node.record.id == id {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

pub fn find_mut<'a>(forest: &'a mut [CommentNode], id: &str) -> Option<&'a mut CommentNode> {
    let mut stack: Vec<&'a mut CommentNode> = forest.iter_mut().rev().collect();
    while let Some(node) = stack.pop() {
        if node.record.id == id {
            return Some(node);
        }
        stack.extend(node.children.iter_mut().rev());
    }
    None
}

/// Flips `viewer_id`'s like on the node. Membership in `liked_by` decides the
/// direction, so the count moves by exactly one either way.
pub fn toggle_like(
    forest: &mut [CommentNode],
    node_id: &str,
    viewer_id: &str,
) -> Result<LikeDelta, BoardError> {
    let node = find_mut(forest, node_id)
        .ok_or_else(|| BoardError::CommentNotFound(node_id.to_string()))?;
    let record = &mut node.record;

    let liked = if record.liked_by.remove(viewer_id) {
        record.like_count = record.like_count.saturating_sub(1);
        false
    } else {
        record.liked_by.insert(viewer_id.to_string());
        record.like_count += 1;
        true
    };

    Ok(LikeDelta {
        comment_id: record.id.clone(),
        viewer_id: viewer_id.to_string(),
        liked,
        like_count: record.like_count,
    })
}

/// Splices a reply under `parent_id` at its sorted position.
pub fn insert_reply(
    forest: &mut [CommentNode],
    parent_id: &str,
    mut record: CommentRecord,
) -> Result<(), BoardError> {
    let parent = find_mut(forest, parent_id)
        .ok_or_else(|| BoardError::CommentNotFound(parent_id.to_string()))?;
    record.parent_id = Some(parent_id.to_string());
    insert_sorted(&mut parent.children, CommentNode::leaf(record));
    Ok(())
}

pub fn insert_root(forest: &mut Vec<CommentNode>, mut record: CommentRecord) {
    record.parent_id = None;
    insert_sorted(forest, CommentNode::leaf(record));
}

fn insert_sorted(siblings: &mut Vec<CommentNode>, node: CommentNode) {
    let pos = siblings.partition_point(|n| n.record.sort_key() <= node.record.sort_key());
    siblings.insert(pos, node);
}

/// Detaches the node (with its whole subtree) wherever it sits.
pub fn remove_node(forest: &mut Vec<CommentNode>, id: &str) -> Option<CommentNode> {
    let mut stack: Vec<&mut Vec<CommentNode>> = vec![forest];
    while let Some(list) = stack.pop() {
        if let Some(pos) = list.iter().position(|n| n.record.id == id) {
            return Some(list.remove(pos));
        }
        stack.extend(list.iter_mut().map(|n| &mut n.children));
    }
    None
}

pub fn count_nodes(forest: &[CommentNode]) -> usize {
    let mut stack: Vec<&CommentNode> = forest.iter().collect();
    let mut total = 0;
    while let Some(node) = stack.pop() {
        total += 1;
        stack.extend(node.children.iter());
    }
    total
}

/// Back to flat records, in pre-order.
pub fn flatten(forest: &[CommentNode]) -> Vec<CommentRecord> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.record.clone());
        stack.extend(node.children.iter().rev());
    }
    out
}
