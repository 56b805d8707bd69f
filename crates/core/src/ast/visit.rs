use super::{Ast, NodeId};

/// Which side of a node a visit is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enter,
    /// Only delivered to container kinds, after all their children.
    Exit,
}

/// A consumer of the tree. `visit` is called once per node with
/// [`Phase::Enter`] in preorder, and a second time with [`Phase::Exit`] for
/// containers (blocks, classes, namespaces, modules), so a consumer can
/// open a scope on enter and close it on exit.
///
/// Implementations inspect `ast.kind(id)`; the match over
/// [`NodeKind`](super::NodeKind) is exhaustive.
pub trait Visitor {
    type Error;

    fn visit(&mut self, ast: &Ast, id: NodeId, phase: Phase) -> Result<(), Self::Error>;
}

impl Ast {
    /// Walk the whole tree from the root. Does nothing for an empty tree.
    pub fn visit_all<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self.root {
            Some(root) => self.walk(root, visitor),
            None => Ok(()),
        }
    }

    /// Walk the subtree under `id`: the node itself, its comments, its
    /// children, then the exit visit for containers.
    pub fn walk<V: Visitor>(&self, id: NodeId, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit(self, id, Phase::Enter)?;
        let node = self.node(id);
        for comment in node.comments() {
            self.walk(*comment, visitor)?;
        }
        for child in node.children() {
            self.walk(child, visitor)?;
        }
        if node.kind().is_container() {
            visitor.visit(self, id, Phase::Exit)?;
        }
        Ok(())
    }
}
