//! Insert-only red-black tree over an arena.
//!
//! Tree links (colour, parent, two children) are embedded in each arena
//! entry and addressed by id, so a whole tree is just its root handle:
//! transferring it to another owner is O(1). Ordering comes from the
//! arena's key type. There is no deletion.
//!
//! Insertion uses the textbook fix-up:
//!
//! - red uncle: recolour parent and uncle black, grandparent red, continue
//!   from the grandparent;
//! - black uncle, node on the inner side: rotate at the parent so the node
//!   is on the outer side;
//! - black uncle, node on the outer side: recolour and rotate at the
//!   grandparent.

use std::cmp::Ordering;

const LEFT: usize = 0;
const RIGHT: usize = 1;

/// Node colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Tree links stored inside each arena entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RbLinks<I> {
    pub color: Color,
    pub parent: Option<I>,
    /// Left and right child.
    pub children: [Option<I>; 2],
}

impl<I> Default for RbLinks<I> {
    fn default() -> Self {
        Self {
            color: Color::Red,
            parent: None,
            children: [None, None],
        }
    }
}

/// Storage that embeds [`RbLinks`] and a key in each of its entries.
pub trait TreeArena {
    /// The handle used to address entries.
    type Id: Copy + Eq;
    /// The ordering key. Its `Ord` implementation is the tree's comparator.
    type Key: Ord + ?Sized;

    fn links(&self, id: Self::Id) -> &RbLinks<Self::Id>;

    fn links_mut(&mut self, id: Self::Id) -> &mut RbLinks<Self::Id>;

    fn key(&self, id: Self::Id) -> &Self::Key;
}

/// A red-black tree handle. The entries live in a [`TreeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RbTree<I> {
    root: Option<I>,
}

impl<I> Default for RbTree<I> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<I: Copy + Eq> RbTree<I> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the root entry, if any.
    #[must_use]
    pub fn root(&self) -> Option<I> {
        self.root
    }

    /// Links `node` into the tree.
    ///
    /// Returns `Err(existing)` without modifying the tree if an entry with an
    /// equal key is already present; the first inserted entry wins.
    pub fn insert<A>(&mut self, arena: &mut A, node: I) -> Result<(), I>
    where
        A: TreeArena<Id = I> + ?Sized,
    {
        let mut parent = None;
        let mut dir = LEFT;
        let mut cursor = self.root;
        while let Some(current) = cursor {
            dir = match arena.key(node).cmp(arena.key(current)) {
                Ordering::Less => LEFT,
                Ordering::Greater => RIGHT,
                Ordering::Equal => return Err(current),
            };
            parent = Some(current);
            cursor = arena.links(current).children[dir];
        }

        *arena.links_mut(node) = RbLinks {
            color: Color::Red,
            parent,
            children: [None, None],
        };
        match parent {
            Some(p) => arena.links_mut(p).children[dir] = Some(node),
            None => self.root = Some(node),
        }
        self.insert_fixup(arena, node);
        Ok(())
    }

    /// Looks up the entry whose key equals `key`.
    pub fn find<A>(&self, arena: &A, key: &A::Key) -> Option<I>
    where
        A: TreeArena<Id = I> + ?Sized,
    {
        let mut cursor = self.root;
        while let Some(current) = cursor {
            let dir = match key.cmp(arena.key(current)) {
                Ordering::Less => LEFT,
                Ordering::Greater => RIGHT,
                Ordering::Equal => return Some(current),
            };
            cursor = arena.links(current).children[dir];
        }
        None
    }

    /// Takes over every entry of `src`, leaving `src` empty.
    ///
    /// Entries previously owned by `self` are dropped from the tree.
    pub fn move_all(&mut self, src: &mut Self) {
        self.root = src.root.take();
    }

    /// Returns an in-order iterator over the entries.
    pub fn iter<'a, A>(&self, arena: &'a A) -> Iter<'a, A>
    where
        A: TreeArena<Id = I> + ?Sized,
    {
        Iter {
            arena,
            next: self.root.map(|root| leftmost(arena, root)),
        }
    }

    /// Verifies the red-black and search-tree invariants.
    ///
    /// Returns the black height of the tree (empty subtrees count as one),
    /// or a description of the first violation found.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending entry's position if the root
    /// is red, a red entry has a red child, black heights differ, a parent
    /// link is inconsistent, or keys are out of order.
    pub fn check_invariants<A>(&self, arena: &A) -> Result<usize, String>
    where
        A: TreeArena<Id = I> + ?Sized,
    {
        let Some(root) = self.root else {
            return Ok(1);
        };
        if arena.links(root).parent.is_some() {
            return Err("root has a parent".to_string());
        }
        if arena.links(root).color == Color::Red {
            return Err("root is red".to_string());
        }
        let height = black_height(arena, Some(root), None)?;

        let mut previous: Option<I> = None;
        for (position, entry) in self.iter(arena).enumerate() {
            if let Some(prev) = previous {
                if arena.key(prev) >= arena.key(entry) {
                    return Err(format!("keys out of order at position {position}"));
                }
            }
            previous = Some(entry);
        }
        Ok(height)
    }

    fn insert_fixup<A>(&mut self, arena: &mut A, mut node: I)
    where
        A: TreeArena<Id = I> + ?Sized,
    {
        while let Some(mut parent) = arena.links(node).parent {
            if arena.links(parent).color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand) = arena.links(parent).parent else {
                break;
            };
            let dir = child_dir(arena, grand, parent);
            let uncle = arena.links(grand).children[dir ^ 1];

            if let Some(uncle) = uncle.filter(|&u| arena.links(u).color == Color::Red) {
                arena.links_mut(parent).color = Color::Black;
                arena.links_mut(uncle).color = Color::Black;
                arena.links_mut(grand).color = Color::Red;
                node = grand;
                continue;
            }

            if child_dir(arena, parent, node) != dir {
                self.rotate(arena, parent, dir);
                node = parent;
                parent = match arena.links(grand).children[dir] {
                    Some(p) => p,
                    None => break,
                };
            }
            arena.links_mut(parent).color = Color::Black;
            arena.links_mut(grand).color = Color::Red;
            self.rotate(arena, grand, dir ^ 1);
        }
        if let Some(root) = self.root {
            arena.links_mut(root).color = Color::Black;
        }
    }

    /// Rotates at `node` in direction `dir`: the child on the opposite side
    /// takes `node`'s place and `node` becomes its `dir` child.
    fn rotate<A>(&mut self, arena: &mut A, node: I, dir: usize)
    where
        A: TreeArena<Id = I> + ?Sized,
    {
        let Some(pivot) = arena.links(node).children[dir ^ 1] else {
            return;
        };
        let inner = arena.links(pivot).children[dir];
        arena.links_mut(node).children[dir ^ 1] = inner;
        if let Some(inner) = inner {
            arena.links_mut(inner).parent = Some(node);
        }

        let parent = arena.links(node).parent;
        arena.links_mut(pivot).parent = parent;
        match parent {
            Some(p) => {
                let side = child_dir(arena, p, node);
                arena.links_mut(p).children[side] = Some(pivot);
            }
            None => self.root = Some(pivot),
        }

        arena.links_mut(pivot).children[dir] = Some(node);
        arena.links_mut(node).parent = Some(pivot);
    }
}

fn child_dir<A: TreeArena + ?Sized>(arena: &A, parent: A::Id, child: A::Id) -> usize {
    if arena.links(parent).children[LEFT] == Some(child) {
        LEFT
    } else {
        RIGHT
    }
}

fn leftmost<A: TreeArena + ?Sized>(arena: &A, mut node: A::Id) -> A::Id {
    while let Some(left) = arena.links(node).children[LEFT] {
        node = left;
    }
    node
}

fn successor<A: TreeArena + ?Sized>(arena: &A, node: A::Id) -> Option<A::Id> {
    if let Some(right) = arena.links(node).children[RIGHT] {
        return Some(leftmost(arena, right));
    }
    let mut node = node;
    while let Some(parent) = arena.links(node).parent {
        if arena.links(parent).children[LEFT] == Some(node) {
            return Some(parent);
        }
        node = parent;
    }
    None
}

fn black_height<A: TreeArena + ?Sized>(
    arena: &A,
    node: Option<A::Id>,
    parent: Option<A::Id>,
) -> Result<usize, String> {
    let Some(node) = node else {
        return Ok(1);
    };
    let links = arena.links(node);
    if links.parent != parent {
        return Err("inconsistent parent link".to_string());
    }
    if links.color == Color::Red {
        let red_child = links
            .children
            .iter()
            .flatten()
            .any(|&c| arena.links(c).color == Color::Red);
        if red_child {
            return Err("red entry has a red child".to_string());
        }
    }
    let left = black_height(arena, links.children[LEFT], Some(node))?;
    let right = black_height(arena, links.children[RIGHT], Some(node))?;
    if left != right {
        return Err(format!("black height mismatch: {left} vs {right}"));
    }
    Ok(left + usize::from(links.color == Color::Black))
}

/// In-order iterator over a tree's entries.
pub struct Iter<'a, A: TreeArena + ?Sized> {
    arena: &'a A,
    next: Option<A::Id>,
}

impl<A: TreeArena + ?Sized> Iterator for Iter<'_, A> {
    type Item = A::Id;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = successor(self.arena, current);
        Some(current)
    }
}
