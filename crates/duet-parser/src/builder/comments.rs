//! Attaches comments to entities by line position.
//!
//! Own-line comments on consecutive lines form a block. A block ending on
//! the line above an entity's first line is its `leading` block; a block
//! starting right after its last line is `trailing`, unless that block is
//! already some other entity's leading block. A comment after code on an
//! entity's declaration line is `inline`. When several entities share the
//! deciding line, the outermost one takes the comment.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use duet_core::entities::Comments;

/// One comment node, in document order.
#[derive(Debug, Clone)]
pub(crate) struct CommentNode {
    pub start_line: usize,
    pub end_line: usize,
    /// Nothing but whitespace precedes the comment on its first line.
    pub own_line: bool,
    pub text: String,
}

/// Line positions of one entity (0-based).
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntityLines {
    /// First line including decorators, attributes, and wrappers.
    pub first: usize,
    /// Line the declaration node itself starts on.
    pub declared: usize,
    pub last: usize,
}

struct CommentBlock {
    start_line: usize,
    end_line: usize,
    text: String,
}

/// Comment slots for each entity, in the order of `entities`.
pub(crate) fn attach(comments: &[CommentNode], entities: &[EntityLines]) -> Vec<Comments> {
    let blocks = group_blocks(comments);
    let by_end: BTreeMap<usize, usize> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (b.end_line, i))
        .collect();
    let by_start: BTreeMap<usize, usize> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (b.start_line, i))
        .collect();

    let mut inline: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for comment in comments.iter().filter(|c| !c.own_line) {
        inline
            .entry(comment.start_line)
            .or_default()
            .push(comment.text.as_str());
    }

    let mut out = vec![Comments::default(); entities.len()];

    let mut leading_blocks = BTreeSet::new();
    let mut first_lines = HashSet::new();
    for (slot, lines) in out.iter_mut().zip(entities) {
        if lines.first == 0 || !first_lines.insert(lines.first) {
            continue;
        }
        if let Some(&block) = by_end.get(&(lines.first - 1)) {
            slot.leading = Some(blocks[block].text.clone());
            leading_blocks.insert(block);
        }
    }

    let mut last_lines = HashSet::new();
    let mut declared_lines = HashSet::new();
    for (slot, lines) in out.iter_mut().zip(entities) {
        if last_lines.insert(lines.last) {
            if let Some(&block) = by_start.get(&(lines.last + 1)) {
                if !leading_blocks.contains(&block) {
                    slot.trailing = Some(blocks[block].text.clone());
                }
            }
        }
        if declared_lines.insert(lines.declared) {
            if let Some(texts) = inline.get(&lines.declared) {
                slot.inline = Some(texts.join(" "));
            }
        }
    }

    out
}

fn group_blocks(comments: &[CommentNode]) -> Vec<CommentBlock> {
    let mut blocks: Vec<CommentBlock> = Vec::new();
    for comment in comments.iter().filter(|c| c.own_line) {
        match blocks.last_mut() {
            Some(block) if comment.start_line == block.end_line + 1 => {
                block.end_line = comment.end_line;
                block.text.push('\n');
                block.text.push_str(&comment.text);
            }
            _ => blocks.push(CommentBlock {
                start_line: comment.start_line,
                end_line: comment.end_line,
                text: comment.text.clone(),
            }),
        }
    }
    blocks
}
