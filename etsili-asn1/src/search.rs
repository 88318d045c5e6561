//! Schema-driven search
//!
//! Locates a set of typed fields in a decoded buffer in one forward pass.
//! Each target names the schema node of its enclosing container plus the
//! identifier of the wanted member; context-tagged items match on their
//! identifier, universal items match positionally (their ordinal within
//! the current sequence).

use etsili_core::error::EtsiliResult;
use etsili_core::IdentClass;

use crate::decoder::{Decoder, Item};
use crate::schema::{ElementTree, NodeId};

/// How many found-item slots are added at a time.
const FOUND_GROW: usize = 10;

/// A field to look for.
#[derive(Debug, Clone, Copy)]
pub struct SearchTarget {
    /// Schema node describing the container the field lives in.
    pub parent: NodeId,
    /// Context identifier (or ordinal, for universal members) of the field.
    pub item_id: u32,
    /// Set once a match has been recorded.
    pub found: bool,
}

impl SearchTarget {
    pub fn new(parent: NodeId, item_id: u32) -> Self {
        SearchTarget {
            parent,
            item_id,
            found: false,
        }
    }
}

/// A matched field: a snapshot of the item descriptor (it survives decoder
/// resets), which target it satisfied, and how to interpret its value.
#[derive(Debug, Clone, Copy)]
pub struct FoundItem {
    pub item: Item,
    pub target_idx: usize,
    pub interpret: u8,
}

/// Results of one search, in discovery order.
#[derive(Debug, Default)]
pub struct FoundSet {
    list: Vec<FoundItem>,
}

impl FoundSet {
    pub fn new() -> Self {
        FoundSet::default()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&FoundItem> {
        self.list.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoundItem> {
        self.list.iter()
    }

    fn push(&mut self, fi: FoundItem) {
        if self.list.len() == self.list.capacity() {
            self.list.reserve(FOUND_GROW);
        }
        self.list.push(fi);
    }
}

fn record_matches(
    dec: &Decoder,
    match_id: u32,
    node: NodeId,
    interpret_of: impl Fn(u32) -> u8,
    targets: &mut [SearchTarget],
    found: &mut FoundSet,
) {
    let Some(item) = dec.current_item() else {
        return;
    };
    for (i, tgt) in targets.iter_mut().enumerate() {
        if tgt.found || match_id != tgt.item_id || node != tgt.parent {
            continue;
        }
        found.push(FoundItem {
            item,
            target_idx: i,
            interpret: interpret_of(tgt.item_id),
        });
        tgt.found = true;
    }
}

/// Search the buffer for every target, stopping early once `stop_threshold`
/// items have been recorded (0 means "all targets"). Returns the number of
/// items found.
pub fn search_items(
    dec: &mut Decoder,
    tree: &ElementTree,
    node: NodeId,
    targets: &mut [SearchTarget],
    stop_threshold: usize,
    found: &mut FoundSet,
) -> EtsiliResult<usize> {
    for tgt in targets.iter_mut() {
        tgt.found = false;
    }
    let stop = if stop_threshold == 0 {
        targets.len()
    } else {
        stop_threshold
    };

    search_level(dec, 0, tree, node, targets, stop, found)?;
    Ok(found.len())
}

/// Walk one nesting level. `Ok(true)` means the caller's loop should keep
/// going (this level finished or the stop threshold tripped); `Ok(false)`
/// means the stream ended or the walk must abort outright.
fn search_level(
    dec: &mut Decoder,
    level: u16,
    tree: &ElementTree,
    node: NodeId,
    targets: &mut [SearchTarget],
    stop: usize,
    found: &mut FoundSet,
) -> EtsiliResult<bool> {
    if found.len() == stop {
        return Ok(true);
    }

    if dec.decode_next()?.is_none() {
        return Ok(false);
    }

    let mut at_this_level = 0u32;

    loop {
        if found.len() == stop {
            break;
        }
        let Some(cur_level) = dec.level() else {
            break;
        };
        if cur_level < level {
            break;
        }

        let ident = dec.identifier().unwrap_or(0);
        match dec.class() {
            IdentClass::ContextPrimitive => {
                record_matches(
                    dec,
                    ident,
                    node,
                    |id| {
                        tree.member(node, id)
                            .map(|m| m.interpret)
                            .unwrap_or(etsili_core::tag::NULL)
                    },
                    targets,
                    found,
                );
            }
            IdentClass::ContextConstruct => {
                record_matches(
                    dec,
                    ident,
                    node,
                    |id| {
                        tree.member(node, id)
                            .map(|m| m.interpret)
                            .unwrap_or(etsili_core::tag::NULL)
                    },
                    targets,
                    found,
                );
                let Some(child) = tree.member(node, ident).and_then(|m| m.descend) else {
                    return Ok(false);
                };
                if !search_level(dec, level + 1, tree, child, targets, stop, found)? {
                    return Ok(false);
                }
                continue;
            }
            IdentClass::UniversalPrimitive => {
                record_matches(dec, at_this_level, node, |_| ident as u8, targets, found);
            }
            IdentClass::UniversalConstruct => {
                record_matches(dec, at_this_level, node, |_| ident as u8, targets, found);
                let Some(child) = tree.node(node).sequence.descend else {
                    return Ok(false);
                };
                if !search_level(dec, level + 1, tree, child, targets, stop, found)? {
                    return Ok(false);
                }
                continue;
            }
            _ => {}
        }

        at_this_level += 1;
        if dec.decode_next()?.is_none() {
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ElementNode, MemberAction, NOACTION};
    use etsili_core::tag;

    // Minimal two-node schema: node 0 wraps anonymous sequences that
    // descend into node 1, whose members 0..2 are typed fields.
    fn tiny_tree() -> ElementTree {
        let mut tree = ElementTree::with_nodes(2);
        tree.set(
            0,
            ElementNode {
                members: Vec::new(),
                sequence: MemberAction {
                    name: "record",
                    descend: Some(1),
                    interpret: tag::NULL,
                },
            },
        );
        tree.set(
            1,
            ElementNode {
                members: vec![
                    MemberAction {
                        name: "alpha",
                        descend: None,
                        interpret: tag::INTEGER,
                    },
                    NOACTION,
                    MemberAction {
                        name: "gamma",
                        descend: None,
                        interpret: tag::OCTETSTRING,
                    },
                ],
                sequence: NOACTION,
            },
        );
        tree
    }

    #[test]
    fn test_search_finds_context_members() {
        // SEQUENCE { [0] 0x2a, [2] "hi" }
        let buf = [
            0x30, 0x07, 0x80, 0x01, 0x2a, 0x82, 0x02, b'h', b'i',
        ];
        let mut dec = Decoder::new(&buf);
        let tree = tiny_tree();
        let mut targets = [SearchTarget::new(1, 0), SearchTarget::new(1, 2)];
        let mut found = FoundSet::new();

        let n = search_items(&mut dec, &tree, 0, &mut targets, 0, &mut found).unwrap();
        assert_eq!(n, 2);
        assert_eq!(found.get(0).unwrap().target_idx, 0);
        assert_eq!(found.get(0).unwrap().interpret, tag::INTEGER);
        assert_eq!(
            found.get(0).unwrap().item.to_i64(dec.source()).unwrap(),
            0x2a
        );
        assert_eq!(found.get(1).unwrap().interpret, tag::OCTETSTRING);
        assert_eq!(found.get(1).unwrap().item.content(dec.source()), b"hi");
    }

    #[test]
    fn test_search_stop_threshold() {
        let buf = [
            0x30, 0x07, 0x80, 0x01, 0x2a, 0x82, 0x02, b'h', b'i',
        ];
        let mut dec = Decoder::new(&buf);
        let tree = tiny_tree();
        let mut targets = [SearchTarget::new(1, 0), SearchTarget::new(1, 2)];
        let mut found = FoundSet::new();

        let n = search_items(&mut dec, &tree, 0, &mut targets, 1, &mut found).unwrap();
        assert_eq!(n, 1);
        assert!(!targets[1].found);
    }
}
