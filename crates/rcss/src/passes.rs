//! Ready-made passes.

use crate::ast::{AtRule, Declaration, EventTags, FunctionValue, Selector, Syntax};
use crate::emitter::{Context, Pass, Phase, Subscription};
use crate::error::Result;

/// Refines refinable units as soon as they are delivered during PROCESS.
///
/// Because function values bypass the refiner's queue, a function nested
/// in a declaration is refined before the declaration's fragments are
/// released.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoRefine;

impl AutoRefine {
    fn selector(&self, syntax: &Syntax, cx: &Context<'_>) -> Result<()> {
        if let Some(selector) = syntax.get::<Selector>() {
            cx.refine_selector(&selector)?;
        }
        Ok(())
    }

    fn declaration(&self, syntax: &Syntax, cx: &Context<'_>) -> Result<()> {
        if let Some(declaration) = syntax.get::<Declaration>() {
            cx.refine_declaration(&declaration)?;
        }
        Ok(())
    }

    fn at_rule(&self, syntax: &Syntax, cx: &Context<'_>) -> Result<()> {
        match syntax.get::<AtRule>() {
            Some(at_rule) => cx.refine_at_rule(&at_rule),
            None => Ok(()),
        }
    }

    fn function(&self, syntax: &Syntax, cx: &Context<'_>) -> Result<()> {
        if let Some(function) = syntax.get::<FunctionValue>() {
            cx.refine_function(&function)?;
        }
        Ok(())
    }
}

impl Pass for AutoRefine {
    fn subscriptions() -> Vec<Subscription<Self>> {
        vec![
            Subscription::new(EventTags::SELECTOR, Phase::Process, AutoRefine::selector),
            Subscription::new(EventTags::DECLARATION, Phase::Process, AutoRefine::declaration),
            Subscription::new(EventTags::AT_RULE, Phase::Process, AutoRefine::at_rule),
            Subscription::new(EventTags::FUNCTION_VALUE, Phase::Process, AutoRefine::function),
        ]
    }
}
