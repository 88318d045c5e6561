//! Field-by-field BER decoder
//!
//! The decoder walks an octet buffer one item at a time, maintaining the
//! current item, a cursor to the next undecoded byte, and a cached tree of
//! everything decoded so far. Re-walking the same buffer reuses the cache
//! and allocates no new descriptors.
//!
//! Items live in an [`ItemPool`] and link to each other through
//! [`SlotRef`]s (parent, first discovered child, next sibling), never
//! through pointers.

use std::borrow::Cow;

use log::warn;

use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::time::{parse_generalized, Timeval};
use etsili_core::{tag, IdentClass};

use crate::arena::{ItemPool, SlotRef};
use crate::primitives::{decode_integer_value, MAX_IDENT_OCTETS};

/// Descriptors per arena blob; matches the sizing the decoder has always
/// used for high-volume traffic.
const ITEMS_PER_BLOB: u32 = 10000;

/// One decoded field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Item {
    pub(crate) parent: Option<SlotRef>,
    pub identifier: u32,
    pub preamble_len: u32,
    pub length: u32,
    pub indefinite: bool,
    pub level: u16,
    pub class: IdentClass,
    /// Offset of the first content octet in the source buffer.
    pub val_off: usize,
    pub(crate) cached_next: Option<SlotRef>,
    pub(crate) cached_children: Option<SlotRef>,
    pub(crate) descend: bool,
}

impl Item {
    /// Content octets of this item within `source`, clamped to the buffer.
    pub fn content<'b>(&self, source: &'b [u8]) -> &'b [u8] {
        let end = (self.val_off + self.length as usize).min(source.len());
        let start = self.val_off.min(end);
        &source[start..end]
    }

    /// Two's-complement integer value of this item's content.
    pub fn to_i64(&self, source: &[u8]) -> EtsiliResult<i64> {
        decode_integer_value(self.content(source))
    }
}

/// BER decoder over a borrowed or owned octet buffer.
pub struct Decoder<'a> {
    source: Cow<'a, [u8]>,
    pool: ItemPool<Item>,
    current: Option<SlotRef>,
    toplevel: Option<SlotRef>,
    cached_root: Option<SlotRef>,
    next_off: usize,
    cached_ts: i64,
    prev_gts: Option<[u8; 14]>,
}

impl<'a> Decoder<'a> {
    /// Decode in place over a borrowed buffer.
    pub fn new(source: &'a [u8]) -> Self {
        Self::from_cow(Cow::Borrowed(source))
    }

    /// Decode over a private copy of the buffer.
    pub fn new_owned(source: Vec<u8>) -> Decoder<'static> {
        Decoder::from_cow(Cow::Owned(source))
    }

    fn from_cow(source: Cow<'a, [u8]>) -> Self {
        Decoder {
            source,
            pool: ItemPool::new(ITEMS_PER_BLOB),
            current: None,
            toplevel: None,
            cached_root: None,
            next_off: 0,
            cached_ts: 0,
            prev_gts: None,
        }
    }

    /// Rebind this decoder to a new buffer, discarding the cached tree.
    pub fn reattach(&mut self, source: Cow<'a, [u8]>) {
        self.reset();
        self.cached_root = None;
        self.pool = ItemPool::new(ITEMS_PER_BLOB);
        self.source = source;
    }

    /// Restart the walk. The cached item tree survives, so the next pass
    /// over the same buffer is served from memory.
    pub fn reset(&mut self) {
        self.current = None;
        self.toplevel = None;
        self.next_off = 0;
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Number of item descriptors held in the cache tree.
    pub fn descriptor_count(&self) -> usize {
        self.pool.allocated_slots()
    }

    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    fn item(&self, r: SlotRef) -> &Item {
        self.pool.get(r)
    }

    /// Copy of the current item descriptor, if any.
    pub fn current_item(&self) -> Option<Item> {
        self.current.map(|r| *self.item(r))
    }

    pub fn class(&self) -> IdentClass {
        self.current
            .map(|r| self.item(r).class)
            .unwrap_or(IdentClass::Unknown)
    }

    pub fn identifier(&self) -> Option<u32> {
        self.current.map(|r| self.item(r).identifier)
    }

    pub fn level(&self) -> Option<u16> {
        self.current.map(|r| self.item(r).level)
    }

    /// Content length of the current item; indefinite items report zero.
    pub fn item_len(&self) -> u32 {
        match self.current {
            Some(r) => {
                let it = self.item(r);
                if it.indefinite {
                    0
                } else {
                    it.length
                }
            }
            None => 0,
        }
    }

    /// Content octets of the current item.
    pub fn item_bytes(&self) -> Option<&[u8]> {
        self.current.map(|r| self.item(r).content(&self.source))
    }

    /// Integer value of the current item.
    pub fn integer_value(&self) -> EtsiliResult<i64> {
        match self.current {
            Some(r) => self.item(r).to_i64(&self.source),
            None => Err(EtsiliError::Misuse("no current item".to_string())),
        }
    }

    /// Printable name for the current item's tag.
    pub fn tag_name(&self) -> String {
        let Some(r) = self.current else {
            return "No current tag".to_string();
        };
        let it = self.item(r);
        match it.class {
            IdentClass::UniversalPrimitive => tag::universal_name(false, it.identifier)
                .unwrap_or("Unknown Type")
                .to_string(),
            IdentClass::UniversalConstruct => tag::universal_name(true, it.identifier)
                .unwrap_or("Unknown Type")
                .to_string(),
            IdentClass::ContextPrimitive => format!("[{}] (primitive)", it.identifier),
            IdentClass::ContextConstruct => format!("[{}] (construct)", it.identifier),
            _ => "Unknown Type".to_string(),
        }
    }

    fn read_byte(&self, off: usize) -> EtsiliResult<u8> {
        self.source.get(off).copied().ok_or(EtsiliError::Truncated {
            needed: off + 1,
            available: self.source.len(),
        })
    }

    /// Parse the item starting at `off` whose enclosing container is
    /// `parent`, or serve it from the cache. Ok(false) means the end of the
    /// stream was reached instead.
    fn decode_at(&mut self, off: usize, parent: Option<SlotRef>) -> EtsiliResult<bool> {
        // Cache first: a previous walk may already have decoded this spot.
        let cached = match (self.current, parent) {
            (None, _) => self.cached_root,
            (Some(cur), Some(par)) if cur == par => {
                let it = *self.item(cur);
                if it.descend && it.cached_children.is_some() {
                    it.cached_children
                } else if !it.descend {
                    it.cached_next
                } else {
                    None
                }
            }
            (Some(cur), _) => self.item(cur).cached_next,
        };

        if let Some(hit) = cached {
            let constructed = self.item(hit).class.is_constructed();
            self.pool.get_mut(hit).descend = constructed;
            self.current = Some(hit);
            return Ok(true);
        }

        // Pop out of any definite-form containers that end at or before
        // this offset.
        let mut parent = parent;
        while let Some(p) = parent {
            let pit = *self.item(p);
            if pit.indefinite || off < pit.val_off + pit.length as usize {
                break;
            }
            parent = pit.parent;
            if Some(p) == self.toplevel {
                self.toplevel = None;
            }
            if Some(p) == self.current {
                self.current = None;
            }
            if parent.is_none() {
                self.current = None;
                return Ok(false);
            }
        }

        let mut ptr = off;
        let tagbyte = self.read_byte(ptr)?;
        let mut prelen = 0usize;
        let identifier;

        if tagbyte & 0x1f == 0x1f {
            // High-tag form: base-128 continuation octets.
            ptr += 1;
            prelen += 1;
            let mut ident = (self.read_byte(ptr)? & 0x7f) as u32;
            while self.read_byte(ptr)? & 0x80 != 0 {
                ptr += 1;
                prelen += 1;
                ident = (ident << 7) | (self.read_byte(ptr)? & 0x7f) as u32;
                if prelen >= MAX_IDENT_OCTETS + 1 {
                    warn!(
                        "identifier fields longer than {} bytes are not supported",
                        MAX_IDENT_OCTETS
                    );
                    return Err(EtsiliError::TagTooLong(MAX_IDENT_OCTETS));
                }
            }
            ptr += 1;
            prelen += 1;
            identifier = ident;
        } else {
            identifier = (tagbyte & 0x1f) as u32;
            prelen += 1;
            ptr += 1;
        }
        let class = IdentClass::from_tag_byte(tagbyte);

        let shortlen = self.read_byte(ptr)?;
        let mut length = 0u32;
        let mut indefinite = false;
        if shortlen & 0x80 == 0 {
            length = (shortlen & 0x7f) as u32;
            prelen += 1;
            ptr += 1;
        } else {
            let lenoctets = (shortlen & 0x7f) as usize;
            if lenoctets > 0 {
                // Up to the full content-length width; overwritable integer
                // slots pad their length field out to eight octets.
                if lenoctets > crate::primitives::MAX_LENGTH_OCTETS {
                    warn!(
                        "cannot decode length fields longer than {} bytes (got {})",
                        crate::primitives::MAX_LENGTH_OCTETS,
                        lenoctets
                    );
                    return Err(EtsiliError::LengthTooLong(lenoctets));
                }
                ptr += 1;
                let mut wide: u64 = 0;
                for _ in 0..lenoctets {
                    wide = (wide << 8) | self.read_byte(ptr)? as u64;
                    ptr += 1;
                }
                length = u32::try_from(wide).map_err(|_| {
                    EtsiliError::InvalidData(format!("content length {} is too large", wide))
                })?;
                prelen += lenoctets + 1;
            } else {
                indefinite = true;
                prelen += 1;
                ptr += 1;
            }
        }

        let level = match parent {
            Some(p) => self.item(p).level + 1,
            None => 0,
        };

        let slot = self.pool.acquire();
        {
            let it = self.pool.get_mut(slot);
            it.parent = parent;
            it.identifier = identifier;
            it.preamble_len = prelen as u32;
            it.length = length;
            it.indefinite = indefinite;
            it.level = level;
            it.class = class;
            it.val_off = ptr;
            it.cached_next = None;
            it.cached_children = None;
            it.descend = false;
        }

        if length == 0 && class == IdentClass::UniversalPrimitive && identifier == 0 {
            // End-of-contents for the innermost indefinite container: the
            // marker reports as belonging to that container's parent.
            match parent {
                None => {
                    self.current = None;
                    return Ok(false);
                }
                Some(p) => {
                    let grandparent = self.item(p).parent;
                    self.pool.get_mut(slot).parent = grandparent;
                }
            }
        }

        if self.current == parent && parent.is_some() {
            let p = parent.expect("checked above");
            debug_assert!(self.item(p).cached_children.is_none());
            self.pool.get_mut(p).cached_children = Some(slot);
        } else if let Some(cur) = self.current {
            debug_assert!(self.item(cur).cached_next.is_none());
            self.pool.get_mut(cur).cached_next = Some(slot);
        }

        self.current = Some(slot);
        Ok(true)
    }

    fn first_decode(&mut self) -> EtsiliResult<Option<usize>> {
        if let Some(root) = self.cached_root {
            self.current = Some(root);
        } else {
            if !self.decode_at(0, None)? {
                return Ok(None);
            }
            self.cached_root = self.current;
        }

        self.toplevel = self.current;
        let cur = self.current.expect("first decode produced an item");
        let (constructed, preamble, length) = {
            let it = self.item(cur);
            (it.class.is_constructed(), it.preamble_len, it.length)
        };

        let consumed = if constructed {
            self.pool.get_mut(cur).descend = true;
            preamble as usize
        } else {
            (preamble + length) as usize
        };
        self.next_off = consumed;
        Ok(Some(consumed))
    }

    /// Advance to the next item in buffer order: the first child of a
    /// constructed current item, otherwise the next sibling (popping out of
    /// finished containers as needed). Returns the number of bytes the
    /// decode consumed, or `None` at the end of the stream.
    pub fn decode_next(&mut self) -> EtsiliResult<Option<usize>> {
        if self.toplevel.is_none() {
            return self.first_decode();
        }

        if self.next_off >= self.source.len() {
            return Ok(None);
        }

        let cur = self.current.ok_or_else(|| {
            EtsiliError::Misuse("decoder has no current item; reset required".to_string())
        })?;

        let parent = if self.item(cur).class.is_constructed() {
            Some(cur)
        } else {
            self.item(cur).parent
        };
        if !self.decode_at(self.next_off, parent)? {
            return Ok(None);
        }

        let now = self.current.expect("decode_at succeeded");
        let (constructed, preamble, length) = {
            let it = self.item(now);
            (it.class.is_constructed(), it.preamble_len, it.length)
        };

        if constructed {
            self.pool.get_mut(now).descend = true;
            self.next_off += preamble as usize;
            return Ok(Some(preamble as usize));
        }

        self.pool.get_mut(now).descend = false;
        self.next_off += (preamble + length) as usize;
        Ok(Some((preamble + length) as usize))
    }

    /// Skip the current item's entire subtree. Definite items jump the
    /// cursor past their content; indefinite items are walked forward until
    /// the matching end-of-contents pair has been consumed. Returns the
    /// content bytes skipped.
    pub fn decode_skip(&mut self) -> EtsiliResult<usize> {
        if self.toplevel.is_none() {
            return Err(EtsiliError::Misuse(
                "decode_skip requires at least one decode_next".to_string(),
            ));
        }
        let cur = self
            .current
            .ok_or_else(|| EtsiliError::Misuse("no current item".to_string()))?;

        let it = *self.item(cur);
        let mut skipped = 0usize;

        if it.indefinite {
            self.next_off = it.val_off;
            loop {
                let a = self.read_byte(self.next_off)?;
                let b = self.read_byte(self.next_off + 1)?;
                if a == 0 && b == 0 {
                    break;
                }
                match self.decode_next()? {
                    Some(n) => skipped += n,
                    None => break,
                }
                if let Some(r) = self.current {
                    if self.item(r).indefinite {
                        skipped += self.decode_skip()?;
                    }
                }
            }
            if let Some(n) = self.decode_next()? {
                skipped += n;
            }
        } else {
            self.pool.get_mut(cur).descend = false;
            self.next_off = it.val_off + it.length as usize;
        }

        let cur_len = self
            .current
            .map(|r| self.item(r).length as usize)
            .unwrap_or(0);
        Ok(cur_len + skipped)
    }

    /// Walk forward at the current nesting level until an item with the
    /// requested identifier appears. Constructed siblings with other
    /// identifiers are skipped whole. Returns true when found (the decoder
    /// is left on the match); on identifier overshoot the position is
    /// restored.
    pub fn decode_sequence_until(&mut self, ident: u32) -> EtsiliResult<bool> {
        let cur = self
            .current
            .ok_or_else(|| EtsiliError::Misuse("no current item".to_string()))?;
        let base_level = self.item(cur).level;
        let orig = self.current;
        let saved_off = self.next_off;

        let mut this_ident;
        loop {
            if self.decode_next()?.is_none() {
                return Ok(false);
            }

            let now = self.current.expect("decode_next advanced");
            if self.item(now).level <= base_level {
                return Ok(false);
            }

            this_ident = self.item(now).identifier;

            if self.item(now).class.is_constructed() && this_ident != ident {
                self.decode_skip()?;
                if this_ident < ident {
                    continue;
                }
            }

            if this_ident >= ident {
                break;
            }
        }

        if this_ident == ident {
            return Ok(true);
        }

        self.current = orig;
        self.next_off = saved_off;
        Ok(false)
    }

    /// Convert a generalized-time string to a timeval, caching the
    /// epoch-seconds of the previous 14-character prefix so repeated
    /// renders of near-identical timestamps skip the full parse.
    pub fn generalized_to_timeval(&mut self, gts: &str) -> EtsiliResult<Timeval> {
        if gts.len() >= 14 {
            let prefix: [u8; 14] = gts.as_bytes()[..14].try_into().expect("length checked");
            if self.prev_gts == Some(prefix) {
                let mut ms: i64 = 0;
                if gts.as_bytes().get(14) == Some(&b'.') {
                    for &c in &gts.as_bytes()[15..] {
                        if !c.is_ascii_digit() {
                            break;
                        }
                        ms = ms * 10 + (c - b'0') as i64;
                    }
                }
                return Ok(Timeval::new(self.cached_ts, ms * 1000));
            }

            let tv = parse_generalized(gts)?;
            self.cached_ts = tv.sec;
            self.prev_gts = Some(prefix);
            return Ok(tv);
        }
        parse_generalized(gts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // pS-PDU style nesting: a definite sequence holding two integers.
    const SIMPLE: &[u8] = &[0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x07];

    #[test]
    fn test_sequential_walk() {
        let mut dec = Decoder::new(SIMPLE);

        assert!(dec.decode_next().unwrap().is_some());
        assert_eq!(dec.class(), IdentClass::UniversalConstruct);
        assert_eq!(dec.level(), Some(0));

        assert!(dec.decode_next().unwrap().is_some());
        assert_eq!(dec.identifier(), Some(2));
        assert_eq!(dec.level(), Some(1));
        assert_eq!(dec.integer_value().unwrap(), 5);

        assert!(dec.decode_next().unwrap().is_some());
        assert_eq!(dec.integer_value().unwrap(), 7);

        assert!(dec.decode_next().unwrap().is_none());
    }

    #[test]
    fn test_indefinite_sequence() {
        // 30 80 02 01 05 00 00: indefinite sequence holding one integer.
        let buf = [0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00];
        let mut dec = Decoder::new(&buf);

        assert!(dec.decode_next().unwrap().is_some());
        assert!(dec.current_item().unwrap().indefinite);
        assert_eq!(dec.level(), Some(0));

        assert!(dec.decode_next().unwrap().is_some());
        assert_eq!(dec.integer_value().unwrap(), 5);
        assert_eq!(dec.level(), Some(1));
    }

    #[test]
    fn test_skip_indefinite_consumes_eoc() {
        let buf = [0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();
        dec.decode_skip().unwrap();
        // The trailing end-of-contents pair has been consumed.
        assert!(dec.decode_next().unwrap().is_none());
    }

    #[test]
    fn test_skip_definite() {
        let mut dec = Decoder::new(SIMPLE);
        dec.decode_next().unwrap();
        dec.decode_next().unwrap();
        let skipped = dec.decode_skip().unwrap();
        assert_eq!(skipped, 1);
        dec.decode_next().unwrap();
        assert_eq!(dec.integer_value().unwrap(), 7);
    }

    #[test]
    fn test_sequence_until() {
        // Context-tagged members 0, 1, 4 inside a sequence.
        let buf = [
            0x30, 0x09, 0x80, 0x01, 0x0a, 0x81, 0x01, 0x0b, 0x84, 0x01, 0x0c,
        ];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();

        assert!(dec.decode_sequence_until(4).unwrap());
        assert_eq!(dec.identifier(), Some(4));
        assert_eq!(dec.level(), Some(1));
        assert_eq!(dec.integer_value().unwrap(), 0x0c);
    }

    #[test]
    fn test_sequence_until_overshoot_restores() {
        let buf = [0x30, 0x06, 0x80, 0x01, 0x0a, 0x84, 0x01, 0x0c];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();

        // Members run 0, 4; the walk overshoots past 2 and comes back to
        // the enclosing sequence.
        assert!(!dec.decode_sequence_until(2).unwrap());
        assert_eq!(dec.identifier(), Some(0x10));
        assert_eq!(dec.level(), Some(0));
    }

    #[test]
    fn test_cache_transparency() {
        let mut walks: Vec<Vec<(IdentClass, u32, u16, u32, usize)>> = Vec::new();
        let mut dec = Decoder::new(SIMPLE);
        let mut descriptors = 0;
        for pass in 0..2 {
            let mut seen = Vec::new();
            while dec.decode_next().unwrap().is_some() {
                let it = dec.current_item().unwrap();
                seen.push((it.class, it.identifier, it.level, it.length, it.val_off));
            }
            walks.push(seen);
            dec.reset();

            if pass == 0 {
                descriptors = dec.descriptor_count();
            }
        }
        assert_eq!(walks[0], walks[1]);
        assert!(!walks[0].is_empty());
        // The second walk was served from the cache without allocating.
        assert_eq!(dec.descriptor_count(), descriptors);
    }

    #[test]
    fn test_children_sizes_sum_to_parent_length() {
        let mut dec = Decoder::new(SIMPLE);
        dec.decode_next().unwrap();
        let parent_len = dec.current_item().unwrap().length;

        let mut sum = 0u32;
        while dec.decode_next().unwrap().is_some() {
            let it = dec.current_item().unwrap();
            if it.level == 1 {
                sum += it.preamble_len + it.length;
            }
        }
        assert_eq!(sum, parent_len);
    }

    #[test]
    fn test_truncated_buffer() {
        let buf = [0x30, 0x06, 0x02];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();
        assert!(dec.decode_next().is_err());
    }

    #[test]
    fn test_tag_too_long() {
        let buf = [0x9f, 0x81, 0x82, 0x83, 0x84, 0x85, 0x01, 0x00];
        let mut dec = Decoder::new(&buf);
        assert!(matches!(
            dec.decode_next(),
            Err(EtsiliError::TagTooLong(_))
        ));
    }

    #[test]
    fn test_high_tag_decode() {
        // Context tag 201 (0x9f 0x81 0x49), length 1.
        let buf = [0x9f, 0x81, 0x49, 0x01, 0xff];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();
        assert_eq!(dec.identifier(), Some(201));
        assert_eq!(dec.current_item().unwrap().preamble_len, 4);
    }

    #[test]
    fn test_skip_before_next_is_misuse() {
        let mut dec = Decoder::new(SIMPLE);
        assert!(dec.decode_skip().is_err());
    }
}
