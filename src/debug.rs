extern crate std;

use core::ptr::NonNull;
use std::{collections::VecDeque, fmt, prelude::v1::*};

use crate::{balance::Balance, AvlTree, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>>,
    T::Key: fmt::Display,
{
    /// Renders the tree as a Graphviz digraph, one `key:rank:factor` label
    /// per node.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: TreeNode<Links<T>>> {
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
        let mut links = String::new();

        for _depth in 0.. {
            use fmt::Write;
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for _layer_node in 0..remaining {
                let node = queue.pop_front().unwrap();

                let node = match node {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = unsafe { node.as_ref().key() };
                let node_links = unsafe { T::links(node).as_ref() };
                let rank = node_links.rank();
                let factor = match node_links.balance() {
                    Balance::Left => '-',
                    Balance::Even => '0',
                    Balance::Right => '+',
                };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{rank}:{factor}\"]; ")?;

                for child in [node_links.left(), node_links.right()] {
                    match child {
                        Some(child) => {
                            let child_key = unsafe { child.as_ref().key() };

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
