//! Explicit tree operations.
//!
//! Nodes never hold a broadcaster of their own. Whoever grafts a node into
//! the tree calls [`attach`], which links it to its parent and then
//! propagates the new subtree through the sink it was given.

use std::rc::Rc;

use crate::ast::{
    AtRule, Declaration, FunctionArgs, FunctionArgsKind, Selector, Shared, Statement, Stylesheet,
    Syntax, ValueMember,
};
use crate::broadcast::Broadcaster;
use crate::error::{CssError, ErrorCode, Position, Result};
use crate::refine::Refiner;

/// Links `child` under `parent` and broadcasts the parts of the child's
/// subtree that have not been broadcast yet, children first.
///
/// Supported pairs: a rule takes selectors and declarations, a selector
/// takes parts, a declaration takes its value, a property value takes
/// terms and functions, a function takes its arguments, an at-rule takes
/// its expression and block, and an at-rule block takes statements and
/// declarations. Anything else, or a slot that is already filled, fails
/// with [`ErrorCode::CannotAttach`].
pub fn attach(parent: &Syntax, child: Syntax, sink: &mut dyn Broadcaster) -> Result<()> {
    let attached = match (parent, &child) {
        (Syntax::Rule(rule), Syntax::Selector(selector)) => {
            rule.borrow_mut().selectors.push(Rc::clone(selector));
            true
        }
        (Syntax::Rule(rule), Syntax::Declaration(declaration)) => {
            rule.borrow_mut().declarations.push(Rc::clone(declaration));
            true
        }
        (Syntax::Selector(selector), Syntax::SelectorPart(part)) => {
            Selector::append(selector, Rc::clone(part));
            true
        }
        (Syntax::Declaration(declaration), Syntax::PropertyValue(value)) => {
            fill(&mut declaration.borrow_mut().value, value)
        }
        (Syntax::PropertyValue(value), member @ (Syntax::Term(_) | Syntax::FunctionValue(_))) => {
            value
                .borrow_mut()
                .members
                .extend(ValueMember::from_syntax(member));
            true
        }
        (Syntax::FunctionValue(function), Syntax::FunctionArgs(args)) => {
            fill(&mut function.borrow_mut().args, args)
        }
        (Syntax::FunctionArgs(args), member @ (Syntax::Term(_) | Syntax::FunctionValue(_))) => {
            let mut args = args.borrow_mut();
            match &mut args.kind {
                FunctionArgsKind::Terms(members) => {
                    members.extend(ValueMember::from_syntax(member));
                    true
                }
                FunctionArgsKind::Url(_) => false,
            }
        }
        (Syntax::AtRule(at_rule), Syntax::AtRuleExpression(expression)) => {
            fill(&mut at_rule.borrow_mut().expression, expression)
        }
        (Syntax::AtRule(at_rule), Syntax::AtRuleBlock(block)) => {
            fill(&mut at_rule.borrow_mut().block, block)
        }
        (Syntax::AtRuleBlock(block), Syntax::Declaration(declaration)) => {
            block.borrow_mut().declarations.push(Rc::clone(declaration));
            true
        }
        (Syntax::AtRuleBlock(block), statement) => match Statement::from_syntax(statement) {
            Some(statement) => {
                block.borrow_mut().statements.push(statement);
                true
            }
            None => false,
        },
        _ => false,
    };

    if !attached {
        return Err(CssError::new(
            ErrorCode::CannotAttach {
                child: child.kind().to_string(),
                parent: parent.kind().to_string(),
            },
            child
                .position()
                .or_else(|| parent.position())
                .unwrap_or(Position::UNKNOWN),
        ));
    }

    child.propagate(sink)
}

fn fill<T>(slot: &mut Option<Shared<T>>, node: &Shared<T>) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(Rc::clone(node));
    true
}

/// Refines every refinable unit reachable from `stylesheet`, so that no raw
/// span is left behind the normal traversal.
pub fn refine_all(
    stylesheet: &Stylesheet,
    refiner: &Refiner,
    sink: &mut dyn Broadcaster,
) -> Result<()> {
    for statement in &stylesheet.statements {
        refine_statement(statement, refiner, sink)?;
    }
    Ok(())
}

fn refine_statement(
    statement: &Statement,
    refiner: &Refiner,
    sink: &mut dyn Broadcaster,
) -> Result<()> {
    match statement {
        Statement::Rule(rule) => {
            let (selectors, declarations) = {
                let rule = rule.borrow();
                (rule.selectors.clone(), rule.declarations.clone())
            };
            for selector in &selectors {
                refiner.refine_selector(selector, sink)?;
            }
            for declaration in &declarations {
                refine_declaration(declaration, refiner, sink)?;
            }
        }
        Statement::AtRule(at_rule) => refine_at_rule(at_rule, refiner, sink)?,
    }
    Ok(())
}

fn refine_at_rule(
    at_rule: &Shared<AtRule>,
    refiner: &Refiner,
    sink: &mut dyn Broadcaster,
) -> Result<()> {
    refiner.refine_at_rule(at_rule, sink)?;

    let block = at_rule.borrow().block.clone();
    if let Some(block) = block {
        let (statements, declarations) = {
            let block = block.borrow();
            (block.statements.clone(), block.declarations.clone())
        };
        for statement in &statements {
            refine_statement(statement, refiner, sink)?;
        }
        for declaration in &declarations {
            refine_declaration(declaration, refiner, sink)?;
        }
    }
    Ok(())
}

fn refine_declaration(
    declaration: &Shared<Declaration>,
    refiner: &Refiner,
    sink: &mut dyn Broadcaster,
) -> Result<()> {
    let value = refiner.refine_declaration(declaration, sink)?;
    let members = value.borrow().members.clone();
    refine_members(&members, refiner, sink)
}

fn refine_members(
    members: &[ValueMember],
    refiner: &Refiner,
    sink: &mut dyn Broadcaster,
) -> Result<()> {
    for member in members {
        if let ValueMember::Function(function) = member {
            let args = refiner.refine_function(function, sink)?;
            let nested = nested_members(&args.borrow());
            refine_members(&nested, refiner, sink)?;
        }
    }
    Ok(())
}

fn nested_members(args: &FunctionArgs) -> Vec<ValueMember> {
    match &args.kind {
        FunctionArgsKind::Terms(members) => members.clone(),
        FunctionArgsKind::Url(_) => Vec::new(),
    }
}
