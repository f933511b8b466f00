use super::Parser;
use crate::ast::{RawComponent, RawItem, RawParam, RawType};
use crate::error::LoadError;
use crate::lexer::{Keyword, LineKind};
use crate::primitives::PrimitiveType;

impl<'a> Parser<'a> {
    /// `ONE OF` scope (`OR` scope)+ `END`
    pub(super) fn one_of(&mut self) -> Result<RawComponent, LoadError> {
        let start = self.cur_line();
        let mut branches: Vec<Vec<RawParam>> = Vec::new();
        loop {
            self.pos += 1;
            let scope = self.read_scope(true)?;
            branches.push(scope.params);
            match self.kind() {
                LineKind::Keyword(Keyword::Or) if !self.at_end() => continue,
                LineKind::Keyword(Keyword::End) if !self.at_end() => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    return Err(self.err(format!(
                        "ONE OF block opened at line {} is not closed by OR or END",
                        start
                    )))
                }
            }
        }
        if branches.len() < 2 || branches.iter().any(Vec::is_empty) {
            return Err(self.err_at(
                start,
                "ONE OF block needs at least two non-empty branches",
            ));
        }
        Ok(RawComponent::OneOf(branches))
    }

    /// `IF` condition [`THEN` scope] [`ELSE` scope] `END`
    pub(super) fn if_block(&mut self) -> Result<RawComponent, LoadError> {
        let start = self.cur_line();
        self.pos += 1;
        let mut condition = self.read_scope(true)?.params;
        if condition.len() != 1 {
            return Err(self.err_at(start, "IF condition must be exactly one bool parameter"));
        }
        let condition = condition.remove(0);
        if condition.type_ != RawType::Primitive(PrimitiveType::Bool) {
            return Err(self.err_at(
                condition.prov.line,
                format!("IF condition '{}' must be of type bool", condition.name),
            ));
        }

        let mut then_branch = Vec::new();
        if self.kind() == LineKind::Keyword(Keyword::Then) && !self.at_end() {
            self.pos += 1;
            then_branch = self.read_scope(true)?.params;
        }
        let mut else_branch = Vec::new();
        if self.kind() == LineKind::Keyword(Keyword::Else) && !self.at_end() {
            self.pos += 1;
            else_branch = self.read_scope(true)?.params;
        }
        if self.at_end() || self.kind() != LineKind::Keyword(Keyword::End) {
            return Err(self.err(format!(
                "IF block opened at line {} is not closed by END",
                start
            )));
        }
        self.pos += 1;
        Ok(RawComponent::IfThenElse {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// A keyword line followed by consecutive `-` items (blank lines allowed
    /// before the first item).
    pub(super) fn item_list(&mut self) -> Result<Vec<(RawItem, u32)>, LoadError> {
        self.pos += 1;
        while !self.at_end() && self.kind() == LineKind::Blank {
            self.pos += 1;
        }
        let mut items = Vec::new();
        while !self.at_end() && self.kind() == LineKind::Item {
            items.push(self.item_decl()?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{RawComponent, RawSpec};
    use crate::error::LoadError;
    use crate::lexer::from_lines;
    use crate::parser::parse;

    fn scan(lines: &[&str]) -> Result<Vec<RawSpec>, LoadError> {
        parse(&from_lines(lines), "blocks.hh", "Blocks")
    }

    fn one_of_sizes(spec: &RawSpec) -> Vec<usize> {
        spec.components
            .iter()
            .find_map(|c| match c {
                RawComponent::OneOf(bs) => Some(bs.iter().map(Vec::len).collect()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn one_of_three_branches_then_trailing_param() {
        let specs = scan(&[
            "* `\"asdf`\" ``[int]``",
            "ONE OF",
            "* `\"a`\" ``[int]``",
            "* `\"b`\" ``[int]``",
            "OR",
            "* `\"c`\" ``[int]``",
            "OR",
            "* `\"d`\" ``[int]``",
            "* `\"e`\" ``[int]``",
            "END",
            "* `\"f`\" ``[double]``",
        ])
        .unwrap();
        let s = &specs[0];
        assert_eq!(s.components.len(), 2);
        assert_eq!(one_of_sizes(s), vec![2, 1, 2]);
        match &s.components[1] {
            RawComponent::Params(ps) => {
                let names: Vec<&str> = ps.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["asdf", "f"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn branch_params_stay_in_their_block() {
        let specs = scan(&[
            "ONE OF",
            "* `\"a`\" ``[int]``",
            "OR",
            "* `\"b`\" ``[int]``",
            "END",
            "IF",
            "* `\"flag`\" ``[bool]``",
            "THEN",
            "* `\"c`\" ``[int]``",
            "END",
        ])
        .unwrap();
        let s = &specs[0];
        assert_eq!(s.components.len(), 2);
        assert_eq!(one_of_sizes(s), vec![1, 1]);
        assert!(matches!(
            &s.components[1],
            RawComponent::IfThenElse { condition, then_branch, .. }
                if condition.name == "flag" && then_branch.len() == 1
        ));
    }

    #[test]
    fn one_of_needs_two_non_empty_branches() {
        let single = scan(&["ONE OF", "* `\"a`\" ``[int]``", "END"]).unwrap_err();
        assert!(single.message.contains("two non-empty"));
        let empty = scan(&["ONE OF", "* `\"a`\" ``[int]``", "OR", "END"]).unwrap_err();
        assert!(empty.message.contains("two non-empty"));
        let open = scan(&["ONE OF", "* `\"a`\" ``[int]``", "OR", "* `\"b`\" ``[int]``"])
            .unwrap_err();
        assert!(open.message.contains("not closed"));
    }

    #[test]
    fn nested_blocks_rejected() {
        let err = scan(&[
            "ONE OF",
            "* `\"a`\" ``[int]``",
            "OR",
            "IF",
            "* `\"c`\" ``[bool]``",
            "END",
            "END",
        ])
        .unwrap_err();
        assert!(err.message.contains("nested"));
    }

    #[test]
    fn if_then_else() {
        let specs = scan(&[
            "IF",
            "* `\"use source`\" ``[bool]`` **false**",
            "THEN",
            "* `\"source key`\" ``[string]``",
            "ELSE",
            "* `\"constant`\" ``[double]``",
            "* `\"other`\" ``[double]``",
            "END",
        ])
        .unwrap();
        match &specs[0].components[0] {
            RawComponent::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => {
                assert_eq!(condition.name, "use source");
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn if_without_else_or_then() {
        let specs = scan(&[
            "IF",
            "* `\"flag`\" ``[bool]``",
            "THEN",
            "* `\"x`\" ``[int]``",
            "END",
        ])
        .unwrap();
        assert!(matches!(
            &specs[0].components[0],
            RawComponent::IfThenElse { else_branch, .. } if else_branch.is_empty()
        ));
        let bare = scan(&["IF", "* `\"flag`\" ``[bool]``", "END"]).unwrap();
        assert_eq!(bare[0].components.len(), 1);
    }

    #[test]
    fn if_failures() {
        let two = scan(&[
            "IF",
            "* `\"a`\" ``[bool]``",
            "* `\"b`\" ``[bool]``",
            "END",
        ])
        .unwrap_err();
        assert!(two.message.contains("exactly one"));
        let not_bool = scan(&["IF", "* `\"a`\" ``[int]``", "END"]).unwrap_err();
        assert!(not_bool.message.contains("bool"));
        let open = scan(&["IF", "* `\"a`\" ``[bool]``", "THEN", "* `\"x`\" ``[int]``"])
            .unwrap_err();
        assert!(open.message.contains("not closed"));
    }
}
