//! Circular doubly-linked sibling list over an arena.
//!
//! Each list has a sentinel header that is itself an arena entry. An empty
//! list is a header whose links point back at the header. Nodes are linked
//! by id, so appending, removing and splicing a whole list are O(1) and
//! never allocate.
//!
//! The functions here are generic over [`ListArena`]; the document tree
//! implements it for its node arena.

/// Intrusive list links stored inside each arena entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<I> {
    /// The previous entry (the header for the first node).
    pub prev: I,
    /// The next entry (the header for the last node).
    pub next: I,
}

impl<I: Copy> Link<I> {
    /// Returns self-referential links for `id`: an empty header, or a node
    /// that is not in any list.
    pub fn unlinked(id: I) -> Self {
        Self { prev: id, next: id }
    }
}

/// Storage that embeds a [`Link`] in each of its entries.
pub trait ListArena {
    /// The handle used to address entries.
    type Id: Copy + Eq;

    /// Returns the links of `id`.
    fn link(&self, id: Self::Id) -> &Link<Self::Id>;

    /// Returns the links of `id` for modification.
    fn link_mut(&mut self, id: Self::Id) -> &mut Link<Self::Id>;
}

/// Resets `header` to an empty list.
pub fn init<A: ListArena + ?Sized>(arena: &mut A, header: A::Id) {
    *arena.link_mut(header) = Link::unlinked(header);
}

/// Returns `true` if the list headed by `header` has no nodes.
pub fn is_empty<A: ListArena + ?Sized>(arena: &A, header: A::Id) -> bool {
    arena.link(header).next == header
}

/// Returns `true` if `node` is not linked into any list.
pub fn is_unlinked<A: ListArena + ?Sized>(arena: &A, node: A::Id) -> bool {
    let link = arena.link(node);
    link.next == node && link.prev == node
}

/// Inserts `node` at the tail of the list headed by `header`.
///
/// `node` must not currently be linked into a list.
pub fn append<A: ListArena + ?Sized>(arena: &mut A, header: A::Id, node: A::Id) {
    debug_assert!(is_unlinked(arena, node), "node is already in a list");
    let tail = arena.link(header).prev;
    arena.link_mut(tail).next = node;
    *arena.link_mut(node) = Link {
        prev: tail,
        next: header,
    };
    arena.link_mut(header).prev = node;
}

/// Unlinks `node` from whatever list it is in and leaves it unlinked.
///
/// Must not be called on a header.
pub fn remove<A: ListArena + ?Sized>(arena: &mut A, node: A::Id) {
    let Link { prev, next } = *arena.link(node);
    arena.link_mut(prev).next = next;
    arena.link_mut(next).prev = prev;
    init(arena, node);
}

/// Moves every node of the list headed by `src` to the list headed by `dst`
/// and leaves `src` empty.
///
/// Whatever `dst` held before is unlinked from it, not freed.
pub fn move_all<A: ListArena + ?Sized>(arena: &mut A, dst: A::Id, src: A::Id) {
    if dst == src {
        return;
    }
    if is_empty(arena, src) {
        init(arena, dst);
        return;
    }
    let Link { prev: last, next: first } = *arena.link(src);
    *arena.link_mut(dst) = Link {
        prev: last,
        next: first,
    };
    arena.link_mut(first).prev = dst;
    arena.link_mut(last).next = dst;
    init(arena, src);
}

/// Returns an iterator over the nodes of the list headed by `header`.
pub fn iter<A: ListArena + ?Sized>(arena: &A, header: A::Id) -> Iter<'_, A> {
    let link = arena.link(header);
    Iter {
        arena,
        front: link.next,
        back: link.prev,
        done: link.next == header,
    }
}

/// Iterator over a list, from `header.next` up to (excluding) the header.
pub struct Iter<'a, A: ListArena + ?Sized> {
    arena: &'a A,
    front: A::Id,
    back: A::Id,
    done: bool,
}

impl<A: ListArena + ?Sized> Iterator for Iter<'_, A> {
    type Item = A::Id;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.front;
        if current == self.back {
            self.done = true;
        } else {
            self.front = self.arena.link(current).next;
        }
        Some(current)
    }
}

impl<A: ListArena + ?Sized> DoubleEndedIterator for Iter<'_, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.back;
        if current == self.front {
            self.done = true;
        } else {
            self.back = self.arena.link(current).prev;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slots(Vec<Link<usize>>);

    impl Slots {
        fn with_len(n: usize) -> Self {
            Self((0..n).map(Link::unlinked).collect())
        }
    }

    impl ListArena for Slots {
        type Id = usize;

        fn link(&self, id: usize) -> &Link<usize> {
            &self.0[id]
        }

        fn link_mut(&mut self, id: usize) -> &mut Link<usize> {
            &mut self.0[id]
        }
    }

    fn collect(slots: &Slots, header: usize) -> Vec<usize> {
        iter(slots, header).collect()
    }

    #[test]
    fn test_new_header_is_empty() {
        let slots = Slots::with_len(1);
        assert!(is_empty(&slots, 0));
        assert!(collect(&slots, 0).is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut slots = Slots::with_len(4);
        append(&mut slots, 0, 1);
        append(&mut slots, 0, 2);
        append(&mut slots, 0, 3);
        assert!(!is_empty(&slots, 0));
        assert_eq!(collect(&slots, 0), vec![1, 2, 3]);
        assert_eq!(slots.link(0).prev, 3);
        assert_eq!(slots.link(3).next, 0);
    }

    #[test]
    fn test_reverse_iteration() {
        let mut slots = Slots::with_len(4);
        for n in 1..4 {
            append(&mut slots, 0, n);
        }
        let back: Vec<usize> = iter(&slots, 0).rev().collect();
        assert_eq!(back, vec![3, 2, 1]);
    }

    #[test]
    fn test_iteration_from_both_ends_meets_once() {
        let mut slots = Slots::with_len(5);
        for n in 1..5 {
            append(&mut slots, 0, n);
        }
        let mut it = iter(&slots, 0);
        assert_eq!(it.next(), Some(1));
        assert_eq!(it.next_back(), Some(4));
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next_back(), Some(3));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn test_remove_middle_and_only() {
        let mut slots = Slots::with_len(4);
        for n in 1..4 {
            append(&mut slots, 0, n);
        }
        remove(&mut slots, 2);
        assert_eq!(collect(&slots, 0), vec![1, 3]);
        assert!(is_unlinked(&slots, 2));

        remove(&mut slots, 1);
        remove(&mut slots, 3);
        assert!(is_empty(&slots, 0));
    }

    #[test]
    fn test_move_all_splices_and_empties_source() {
        let mut slots = Slots::with_len(5);
        append(&mut slots, 1, 2);
        append(&mut slots, 1, 3);
        append(&mut slots, 1, 4);

        move_all(&mut slots, 0, 1);

        assert!(is_empty(&slots, 1));
        assert_eq!(collect(&slots, 0), vec![2, 3, 4]);
        assert_eq!(slots.link(2).prev, 0);
        assert_eq!(slots.link(4).next, 0);
    }

    #[test]
    fn test_move_all_from_empty_source_empties_destination() {
        let mut slots = Slots::with_len(3);
        append(&mut slots, 0, 2);
        move_all(&mut slots, 0, 1);
        assert!(is_empty(&slots, 0));
        assert!(is_empty(&slots, 1));
    }

    #[test]
    fn test_append_after_move_all() {
        let mut slots = Slots::with_len(5);
        append(&mut slots, 1, 2);
        move_all(&mut slots, 0, 1);
        append(&mut slots, 0, 3);
        append(&mut slots, 1, 4);
        assert_eq!(collect(&slots, 0), vec![2, 3]);
        assert_eq!(collect(&slots, 1), vec![4]);
    }
}
