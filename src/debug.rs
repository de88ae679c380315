use alloc::{collections::VecDeque, string::String};
use core::{fmt, ptr::NonNull};

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Writes the shape of the tree to `w` in the Graphviz dot format.
    ///
    /// Nodes are laid out level by level and labelled `key:balance`. Missing children are drawn as
    /// points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        T::Key: fmt::Display,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: ?Sized> {
            Node(NonNull<T>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let (key, balance) = unsafe { (node.as_ref().key(), self.balance(node)) };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{balance}\"]; ")?;

                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = unsafe { self.links(node).child(dir) } {
                        let child_key = unsafe { child.as_ref().key() };

                        queue.push_back(Item::Node(child));
                        writeln!(
                            edges,
                            "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                        )?;
                    } else {
                        queue.push_back(Item::Missing(missing));
                        writeln!(
                            edges,
                            "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                        )?;
                        missing += 1;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }
}
