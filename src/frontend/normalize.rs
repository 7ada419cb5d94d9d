use crate::ast::{Ast, NodeId};

/// Walk the tree from the root and point every child's parent link at the node that owns it.
///
/// Order of root items, list cells and operands is left untouched, and running the pass twice
/// changes nothing. Returns how many parent links had to be repaired.
#[tracing::instrument(skip(ast))]
pub fn normalize(ast: &mut Ast) -> usize {
    let mut repaired = 0;
    let mut stack: Vec<NodeId> = vec![ast.root()];

    while let Some(id) = stack.pop() {
        let children = ast.kind(id).children();
        // Reversed so that the walk visits children in source order.
        for child in children.into_iter().rev() {
            if ast.parent(child) != Some(id) {
                ast.set_parent(child, Some(id));
                repaired += 1;
            }
            stack.push(child);
        }
    }

    if ast.parent(ast.root()).is_some() {
        let root = ast.root();
        ast.set_parent(root, None);
        repaired += 1;
    }

    tracing::debug!("repaired {} parent links", repaired);
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{LabelType, NodeKind};

    use pretty_assertions::assert_eq;

    fn section(ast: &mut Ast, name: &str, constants: &[&str]) -> NodeId {
        let items: Vec<NodeId> = constants
            .iter()
            .map(|text| ast.add(NodeKind::Const(text.to_string()), 2))
            .collect();
        let list = ast.add_list(&items).unwrap();
        let data = ast.add(NodeKind::Data8(list), 2);
        let code = ast.add_list(&[data]);
        let label = ast.add(
            NodeKind::Label {
                name: name.to_string(),
                child: code,
                label_type: LabelType::None,
            },
            1,
        );
        ast.push_item(label);
        label
    }

    #[test]
    fn test_parser_output_is_already_normal() {
        let mut ast = Ast::new();
        section(&mut ast, "Table", &["$01", "$02"]);
        let before = ast.clone();

        assert_eq!(normalize(&mut ast), 0);
        assert_eq!(ast, before);
    }

    #[test]
    fn test_repairs_links_and_keeps_order() {
        let mut ast = Ast::new();
        let first = section(&mut ast, "First", &["$01", "$02", "$03"]);
        let second = section(&mut ast, "Second", &["$04"]);
        let rendered = ast.to_string();

        let NodeKind::Label {
            child: Some(code), ..
        } = ast.kind(first).clone()
        else {
            panic!("expected label with code");
        };
        ast.set_parent(code, None);
        ast.set_parent(second, Some(first));

        assert_eq!(normalize(&mut ast), 2);
        assert_eq!(ast.parent(code), Some(first));
        assert_eq!(ast.parent(second), Some(ast.root()));
        assert_eq!(ast.root_items(), &[first, second]);
        assert_eq!(ast.to_string(), rendered);

        assert_eq!(normalize(&mut ast), 0);
        assert_eq!(ast.to_string(), rendered);
    }
}
