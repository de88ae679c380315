use core::ptr::NonNull;

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    // Performs a rotation, moving `node` down towards `dir` and its child on the other side up
    // into its position. A left rotation is `rotate(node, Dir::Left)`.
    //
    // Returns the raised child. The balance factors of affected nodes are not updated.
    //
    // # Safety
    //
    // `node` must be linked into `self`. Panics if `node` has no `!dir` child.
    pub(crate) unsafe fn rotate(&mut self, node: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = self
                .links(node)
                .child(!dir)
                .expect("rotation requires a child on the rising side");

            // `across` goes from the `dir` child of `up` to the `!dir` child of `node`.
            let across = self.links_mut(up).set_child(dir, Some(node));
            self.links_mut(node).set_child(!dir, across);
            self.maybe_set_parent(across, Some(node));

            let parent = self.links_mut(node).set_parent(Some(up));
            self.links_mut(up).set_parent(parent);
            self.replace_child_or_set_root(parent, node, Some(up));

            up
        }
    }

    // Performs a rotation as `rotate` does, then recomputes the balance factors of the two nodes
    // whose subtrees changed.
    unsafe fn rotate_rebalanced(&mut self, node: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = self.rotate(node, dir);

            let (node_balance, up_balance) =
                rotated_balances(self.balance(node), self.balance(up), dir);
            self.set_balance(node, node_balance);
            self.set_balance(up, up_balance);

            up
        }
    }

    // Restores balance at `node` if its balance factor has reached ±2.
    //
    // Returns the root of the rebalanced subtree, or `node` if it was not out of balance.
    pub(crate) unsafe fn rebalance(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            let heavy = match self.balance(node) {
                2 => Dir::Left,
                -2 => Dir::Right,
                _ => return node,
            };

            let child = self
                .links(node)
                .child(heavy)
                .expect("doubly heavy node must have a child on its heavy side");

            // If the child leans away from `heavy`, its inner grandchild is the tallest subtree and
            // has to be raised first.
            let zig_zag = self.balance(child) * heavy.weight() < 0;

            tracing::trace!(
                key = ?node.as_ref().key(),
                balance = self.balance(node),
                case = imbalance_case(heavy, zig_zag),
                "rebalancing"
            );

            if zig_zag {
                self.rotate_rebalanced(child, heavy);
            }

            self.rotate_rebalanced(node, !heavy)
        }
    }
}

fn imbalance_case(heavy: Dir, zig_zag: bool) -> &'static str {
    match (heavy, zig_zag) {
        (Dir::Left, false) => "left-left",
        (Dir::Left, true) => "left-right",
        (Dir::Right, false) => "right-right",
        (Dir::Right, true) => "right-left",
    }
}

// Returns the balance factors of a rotated node and of the child that took its place, given their
// balance factors before the rotation.
//
// Rotating `x` left under its right child `y` leaves `x` over `y`'s former left subtree and `y`
// over `x`, so
//
//   b'(x) = b(x) + 1 - min(b(y), 0)
//   b'(y) = b(y) + 1 + max(b'(x), 0)
//
// and symmetrically for a right rotation.
fn rotated_balances(down: i8, up: i8, dir: Dir) -> (i8, i8) {
    match dir {
        Dir::Left => {
            let down = down + 1 - up.min(0);
            (down, up + 1 + down.max(0))
        }

        Dir::Right => {
            let down = down - 1 - up.max(0);
            (down, up - 1 + down.min(0))
        }
    }
}
