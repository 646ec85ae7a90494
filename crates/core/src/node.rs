use std::fmt;

use crate::Error;

/// The shooting nodes a term applies to.
///
/// A phase with `N` shooting intervals has nodes `0..=N`; node `N` is the
/// terminal node and has no control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Every node, including the terminal one when the term can be evaluated
    /// there.
    All,

    /// Every shooting node `0..N`, never the terminal one.
    AllShooting,

    /// The terminal node `N`.
    End,

    /// An explicit set of nodes.
    Specific(Vec<usize>),
}

impl Node {
    /// The first node only.
    #[must_use]
    pub fn start() -> Self {
        Self::Specific(vec![0])
    }

    /// Resolves the node set for a horizon of `shooting_nodes` intervals.
    ///
    /// Terms that cannot be evaluated at the terminal node (`reaches_terminal`
    /// is `false`, e.g. control penalties) resolve [`Node::All`] to the
    /// shooting nodes only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeOutOfRange`] if a requested node does not exist
    /// for this term.
    pub fn resolve(&self, shooting_nodes: usize, reaches_terminal: bool) -> Result<Vec<usize>, Error> {
        let last = if reaches_terminal {
            shooting_nodes
        } else {
            shooting_nodes.saturating_sub(1)
        };

        match self {
            Self::All => Ok((0..=last).collect()),
            Self::AllShooting => Ok((0..shooting_nodes).collect()),
            Self::End if reaches_terminal => Ok(vec![shooting_nodes]),
            Self::End => Err(Error::NodeOutOfRange {
                node: shooting_nodes,
                last,
            }),
            Self::Specific(nodes) => {
                if let Some(&node) = nodes.iter().find(|&&node| node > last) {
                    return Err(Error::NodeOutOfRange { node, last });
                }
                Ok(nodes.clone())
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all nodes"),
            Self::AllShooting => write!(f, "all shooting nodes"),
            Self::End => write!(f, "the last node"),
            Self::Specific(nodes) => write!(f, "nodes {nodes:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_reaches_terminal_node_when_allowed() {
        assert_eq!(Node::All.resolve(3, true).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(Node::All.resolve(3, false).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn all_shooting_never_reaches_terminal_node() {
        assert_eq!(Node::AllShooting.resolve(3, true).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn end_requires_terminal_node() {
        assert_eq!(Node::End.resolve(4, true).unwrap(), vec![4]);
        assert_eq!(
            Node::End.resolve(4, false),
            Err(Error::NodeOutOfRange { node: 4, last: 3 })
        );
    }

    #[test]
    fn specific_nodes_are_checked() {
        assert_eq!(Node::start().resolve(2, false).unwrap(), vec![0]);
        assert_eq!(
            Node::Specific(vec![1, 5]).resolve(2, true),
            Err(Error::NodeOutOfRange { node: 5, last: 2 })
        );
    }
}
