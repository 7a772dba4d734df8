use crate::Dir;

/// The AVL balance factor of a node: the sign of
/// `height(right) - height(left)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Balance {
    Left,
    Even,
    Right,
}

impl Balance {
    /// The factor of a node one level deeper on its `dir` side.
    #[inline]
    pub(crate) fn lean(dir: Dir) -> Balance {
        match dir {
            Dir::Left => Balance::Left,
            Dir::Right => Balance::Right,
        }
    }
}

/// What a height change arriving at a node requires of it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Adjust {
    /// Adopt the factor; the change is invisible above this node.
    Settle(Balance),
    /// Adopt the factor; the change is still visible above and must keep
    /// climbing.
    Propagate(Balance),
    /// The node is now two levels deep on its `heavy` side; a rotation is
    /// required.
    Rebalance { heavy: Dir },
}

/// Maps a node's factor to the action required after its `side` subtree
/// grew taller by one.
pub(crate) fn grown(factor: Balance, side: Dir) -> Adjust {
    if factor == Balance::Even {
        // The node now leans toward the taller side, and so does every
        // Even ancestor until one absorbs the growth.
        Adjust::Propagate(Balance::lean(side))
    } else if factor == Balance::lean(side) {
        Adjust::Rebalance { heavy: side }
    } else {
        // The shorter side caught up.
        Adjust::Settle(Balance::Even)
    }
}

/// Maps a node's factor to the action required after its `side` subtree
/// shrank by one.
pub(crate) fn shrunk(factor: Balance, side: Dir) -> Adjust {
    if factor == Balance::Even {
        // The other side is now taller, but the node's overall height is
        // unchanged.
        Adjust::Settle(Balance::lean(!side))
    } else if factor == Balance::lean(side) {
        // The taller side shrank; the node's overall height fell with it.
        Adjust::Propagate(Balance::Even)
    } else {
        Adjust::Rebalance { heavy: !side }
    }
}
