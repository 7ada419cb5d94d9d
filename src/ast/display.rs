use std::fmt::{self, Write};

use super::{Ast, NodeId, NodeKind};
use crate::frontend::CommentTable;

const INDENT: usize = 4;
/// Deeper levels share this indentation, so the dump of a deep tree stays linear in size.
const MAX_INDENT: usize = 4 * 64;

struct TreeWriter<'a, W: Write> {
    ast: &'a Ast,
    out: W,
    comments: Option<&'a mut CommentTable>,
}

impl<'a, W: Write> TreeWriter<'a, W> {
    /// Write one header line, followed by the trailing comment of the source line if it has not
    /// been claimed by an earlier node.
    fn line(&mut self, indent: usize, text: fmt::Arguments, source_line: usize) -> fmt::Result {
        write!(self.out, "{:indent$}{}", "", text, indent = indent)?;
        if let Some(comments) = self.comments.as_mut() {
            if let Some(comment) = comments.consume(source_line) {
                write!(self.out, "  {}", comment)?;
            }
        }
        writeln!(self.out)
    }

    fn leaf(&mut self, indent: usize, text: fmt::Arguments) -> fmt::Result {
        writeln!(self.out, "{:indent$}{}", "", text, indent = indent)
    }

    /// Write `id` and everything below it, depth first in source order.
    fn write(&mut self, id: NodeId) -> fmt::Result {
        let ast = self.ast;
        let mut stack = vec![(id, 0)];

        while let Some((id, indent)) = stack.pop() {
            let node = ast.node(id);
            let inner = (indent + INDENT).min(MAX_INDENT);
            match &node.kind {
                NodeKind::Root(items) => {
                    stack.extend(items.iter().rev().map(|item| (*item, indent)));
                }
                NodeKind::List { item, next } => {
                    self.leaf(indent, format_args!("list element:"))?;
                    if let Some(next) = next {
                        stack.push((*next, indent));
                    }
                    stack.push((*item, inner));
                }
                NodeKind::Data8(list) => {
                    self.line(indent, format_args!("data:"), node.line)?;
                    stack.push((*list, inner));
                }
                NodeKind::Data16(list) => {
                    self.line(indent, format_args!("data (16 bit):"), node.line)?;
                    stack.push((*list, inner));
                }
                NodeKind::Decl { name, expression } => {
                    self.line(indent, format_args!("decl: {} =", name), node.line)?;
                    stack.push((*expression, inner));
                }
                NodeKind::Label {
                    name,
                    child,
                    label_type,
                } => {
                    self.line(
                        indent,
                        format_args!("label: {} [{}]", name, label_type),
                        node.line,
                    )?;
                    if let Some(child) = child {
                        stack.push((*child, inner));
                    }
                }
                NodeKind::Name(name) => self.leaf(indent, format_args!("name: {}", name))?,
                NodeKind::Const(text) => self.leaf(indent, format_args!("constant: {}", text))?,
                NodeKind::Immediate(child) => {
                    self.leaf(indent, format_args!("immediate:"))?;
                    stack.push((*child, inner));
                }
                NodeKind::Indirect(child) => {
                    self.leaf(indent, format_args!("indirect:"))?;
                    stack.push((*child, inner));
                }
                NodeKind::IndexedX(child) => {
                    self.leaf(indent, format_args!("indexed x:"))?;
                    stack.push((*child, inner));
                }
                NodeKind::IndexedY(child) => {
                    self.leaf(indent, format_args!("indexed y:"))?;
                    stack.push((*child, inner));
                }
                NodeKind::LoByte(child) => {
                    self.leaf(indent, format_args!("low byte:"))?;
                    stack.push((*child, inner));
                }
                NodeKind::HiByte(child) => {
                    self.leaf(indent, format_args!("high byte:"))?;
                    stack.push((*child, inner));
                }
                NodeKind::Add(lhs, rhs) => {
                    self.leaf(indent, format_args!("add:"))?;
                    stack.extend([(*rhs, inner), (*lhs, inner)]);
                }
                NodeKind::Subtract(lhs, rhs) => {
                    self.leaf(indent, format_args!("subtract:"))?;
                    stack.extend([(*rhs, inner), (*lhs, inner)]);
                }
                NodeKind::Instruction { mnemonic, operand } => {
                    self.line(
                        indent,
                        format_args!(
                            "instruction (line {}) {} {}:",
                            node.line,
                            mnemonic.code(),
                            mnemonic
                        ),
                        node.line,
                    )?;
                    if let Some(operand) = operand {
                        stack.push((*operand, inner));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Ast {
    /// Render the tree as indented text.
    ///
    /// When a comment table is given, each label, declaration, data directive and instruction
    /// claims the trailing comment of its source line.
    pub fn dump(&self, comments: Option<&mut CommentTable>) -> String {
        let mut out = String::new();
        let mut writer = TreeWriter {
            ast: self,
            out: &mut out,
            comments,
        };
        // Writing into a String cannot fail.
        let _ = writer.write(self.root());
        out
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = TreeWriter {
            ast: self,
            out: f,
            comments: None,
        };
        writer.write(self.root())
    }
}
