//! The refinement registry.
//!
//! A [`Refiner`] turns the raw span held by a selector, declaration,
//! at-rule or function value into structured children. Custom strategies
//! are consulted in registration order; when none of them fully handles
//! the unit the [`StandardStrategy`] parses it with the ordinary parser
//! units. Refinement happens at most once per unit: a refined unit keeps
//! its result and later calls return it without parsing again.
//!
//! Strategies never mutate the unit's structured fields themselves. They
//! broadcast what they build, and the registry captures it from the chain
//! and attaches it.

pub mod media;
pub mod standard;

use std::any;
use std::rc::Rc;

use crate::ast::{
    AtRule, AtRuleBlock, AtRuleExpression, Declaration, EventTags, FunctionArgs, FunctionValue,
    PropertyValue, Selector, SelectorPart, Shared, SyntaxUnit,
};
use crate::broadcast::{
    Broadcaster, QueryableBroadcaster, QueuingBroadcaster, SingleInterestBroadcaster,
};
use crate::error::{CssError, ErrorCode, Position, Result};
use crate::grammar::Grammar;

pub use media::MediaStrategy;
pub use standard::StandardStrategy;

/// What a strategy did with a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Refinement {
    /// The strategy does not apply.
    None,
    /// Only part of an at-rule was refined (its expression or its block).
    Partial,
    Full,
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let name = any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

pub trait AtRuleStrategy {
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    fn refine(
        &self,
        at_rule: &Shared<AtRule>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement>;
}

pub trait SelectorStrategy {
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    fn refine(
        &self,
        selector: &Shared<Selector>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement>;
}

pub trait DeclarationStrategy {
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    fn refine(
        &self,
        declaration: &Shared<Declaration>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement>;
}

pub trait FunctionStrategy {
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    fn refine(
        &self,
        function: &Shared<FunctionValue>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement>;
}

fn position_of<T: SyntaxUnit>(unit: &Shared<T>) -> Position {
    unit.borrow().meta().position().unwrap_or(Position::UNKNOWN)
}

fn partial_refinement(strategy: &str, kind: &str, position: Position) -> CssError {
    CssError::new(
        ErrorCode::PartialRefinement {
            strategy: strategy.to_string(),
            kind: kind.to_string(),
        },
        position,
    )
}

/// Holds the registered strategies and the grammar used for nested
/// parses.
#[derive(Default)]
pub struct Refiner {
    grammar: Grammar,
    standard: StandardStrategy,
    at_rule_strategies: Vec<Box<dyn AtRuleStrategy>>,
    selector_strategies: Vec<Box<dyn SelectorStrategy>>,
    declaration_strategies: Vec<Box<dyn DeclarationStrategy>>,
    function_strategies: Vec<Box<dyn FunctionStrategy>>,
}

impl Refiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grammar(grammar: Grammar) -> Self {
        Self {
            grammar,
            ..Self::default()
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn set_grammar(&mut self, grammar: Grammar) {
        self.grammar = grammar;
    }

    pub fn register_at_rule_strategy(
        &mut self,
        strategy: impl AtRuleStrategy + 'static,
    ) -> &mut Self {
        log::debug!("registered at-rule strategy {}", strategy.name());
        self.at_rule_strategies.push(Box::new(strategy));
        self
    }

    pub fn register_selector_strategy(
        &mut self,
        strategy: impl SelectorStrategy + 'static,
    ) -> &mut Self {
        log::debug!("registered selector strategy {}", strategy.name());
        self.selector_strategies.push(Box::new(strategy));
        self
    }

    pub fn register_declaration_strategy(
        &mut self,
        strategy: impl DeclarationStrategy + 'static,
    ) -> &mut Self {
        log::debug!("registered declaration strategy {}", strategy.name());
        self.declaration_strategies.push(Box::new(strategy));
        self
    }

    pub fn register_function_strategy(
        &mut self,
        strategy: impl FunctionStrategy + 'static,
    ) -> &mut Self {
        log::debug!("registered function strategy {}", strategy.name());
        self.function_strategies.push(Box::new(strategy));
        self
    }

    /// Refines an at-rule's expression and block.
    ///
    /// Strategies returning [`Refinement::Partial`] may each supply one
    /// half; the standard strategy fills in whatever is still missing.
    pub fn refine_at_rule(
        &self,
        at_rule: &Shared<AtRule>,
        sink: &mut dyn Broadcaster,
    ) -> Result<()> {
        if at_rule.borrow().is_refined() {
            return Ok(());
        }
        let position = position_of(at_rule);
        let mut query = QueryableBroadcaster::new(sink);

        for strategy in &self.at_rule_strategies {
            let seen = query.received().len();
            let outcome = strategy.refine(at_rule, &mut query, self)?;
            log::trace!("{} refined at-rule: {outcome:?}", strategy.name());
            if outcome == Refinement::None {
                continue;
            }

            capture_at_rule_parts(at_rule, &query.received()[seen..]);
            let covered = at_rule.borrow().is_covered();

            match outcome {
                Refinement::Full if !covered => {
                    return Err(missing_at_rule_part(at_rule, strategy.name(), position));
                }
                Refinement::Full => break,
                Refinement::Partial if covered => break,
                Refinement::Partial | Refinement::None => {}
            }
        }

        if !at_rule.borrow().is_covered() {
            let seen = query.received().len();
            AtRuleStrategy::refine(&self.standard, at_rule, &mut query, self)?;
            capture_at_rule_parts(at_rule, &query.received()[seen..]);
            if !at_rule.borrow().is_covered() {
                let name = AtRuleStrategy::name(&self.standard);
                return Err(missing_at_rule_part(at_rule, name, position));
            }
        }

        at_rule.borrow_mut().mark_refined();
        Ok(())
    }

    /// Refines a selector into its parts.
    ///
    /// The parts are held back until all of them are attached to the
    /// selector, then released downstream in order.
    pub fn refine_selector(
        &self,
        selector: &Shared<Selector>,
        sink: &mut dyn Broadcaster,
    ) -> Result<Vec<Shared<SelectorPart>>> {
        if selector.borrow().is_refined() {
            return Ok(selector.borrow().parts().to_vec());
        }
        let position = position_of(selector);

        let mut queue = QueuingBroadcaster::new(sink);
        queue.pause();

        let parts = {
            let mut query = QueryableBroadcaster::new(&mut queue);
            let mut claimed = None;
            for strategy in &self.selector_strategies {
                let outcome = strategy.refine(selector, &mut query, self)?;
                log::trace!("{} refined selector: {outcome:?}", strategy.name());
                match outcome {
                    Refinement::Full => {
                        claimed = Some(strategy.name());
                        break;
                    }
                    Refinement::Partial => {
                        return Err(partial_refinement(strategy.name(), "selector", position));
                    }
                    Refinement::None => {}
                }
            }
            let claimed = match claimed {
                Some(name) => name,
                None => {
                    SelectorStrategy::refine(&self.standard, selector, &mut query, self)?;
                    SelectorStrategy::name(&self.standard)
                }
            };

            let parts = query.filter::<SelectorPart>();
            if parts.is_empty() {
                return Err(CssError::new(
                    ErrorCode::MissingStrategyResult {
                        strategy: claimed.to_string(),
                        expected: "SelectorPart".to_string(),
                    },
                    position,
                ));
            }
            parts
        };

        for part in &parts {
            Selector::append(selector, Rc::clone(part));
        }
        selector.borrow_mut().mark_refined();

        queue.resume()?;
        Ok(parts)
    }

    /// Refines a declaration's raw value into a [`PropertyValue`].
    ///
    /// Value members are held back until the value is attached. Function
    /// values are the exception: they are released immediately so that
    /// they can be refined before the declaration completes.
    pub fn refine_declaration(
        &self,
        declaration: &Shared<Declaration>,
        sink: &mut dyn Broadcaster,
    ) -> Result<Shared<PropertyValue>> {
        if let Some(value) = declaration.borrow().value.clone() {
            return Ok(value);
        }
        let position = position_of(declaration);

        let mut queue = QueuingBroadcaster::new(sink).always_flush(EventTags::FUNCTION_VALUE);
        queue.pause();

        let value = {
            let mut single = SingleInterestBroadcaster::<PropertyValue>::new(&mut queue);
            let mut claimed = None;
            for strategy in &self.declaration_strategies {
                let outcome = strategy.refine(declaration, &mut single, self)?;
                log::trace!("{} refined declaration: {outcome:?}", strategy.name());
                match outcome {
                    Refinement::Full => {
                        claimed = Some(strategy.name());
                        break;
                    }
                    Refinement::Partial => {
                        return Err(partial_refinement(strategy.name(), "declaration", position));
                    }
                    Refinement::None => {}
                }
            }
            let claimed = match claimed {
                Some(name) => name,
                None => {
                    DeclarationStrategy::refine(&self.standard, declaration, &mut single, self)?;
                    DeclarationStrategy::name(&self.standard)
                }
            };
            single.require(claimed, position)?
        };

        declaration.borrow_mut().value = Some(Rc::clone(&value));
        queue.resume()?;
        Ok(value)
    }

    /// Refines a function value's raw arguments.
    pub fn refine_function(
        &self,
        function: &Shared<FunctionValue>,
        sink: &mut dyn Broadcaster,
    ) -> Result<Shared<FunctionArgs>> {
        if let Some(args) = function.borrow().args.clone() {
            return Ok(args);
        }
        let position = position_of(function);

        let mut queue = QueuingBroadcaster::new(sink).always_flush(EventTags::FUNCTION_VALUE);
        queue.pause();

        let args = {
            let mut single = SingleInterestBroadcaster::<FunctionArgs>::new(&mut queue);
            let mut claimed = None;
            for strategy in &self.function_strategies {
                let outcome = strategy.refine(function, &mut single, self)?;
                log::trace!("{} refined function: {outcome:?}", strategy.name());
                match outcome {
                    Refinement::Full => {
                        claimed = Some(strategy.name());
                        break;
                    }
                    Refinement::Partial => {
                        return Err(partial_refinement(strategy.name(), "function", position));
                    }
                    Refinement::None => {}
                }
            }
            let claimed = match claimed {
                Some(name) => name,
                None => {
                    FunctionStrategy::refine(&self.standard, function, &mut single, self)?;
                    FunctionStrategy::name(&self.standard)
                }
            };
            single.require(claimed, position)?
        };

        function.borrow_mut().args = Some(Rc::clone(&args));
        queue.resume()?;
        Ok(args)
    }
}

/// Assigns the first expression and block found in `received`, unless the
/// at-rule already has them.
fn capture_at_rule_parts(at_rule: &Shared<AtRule>, received: &[crate::ast::Syntax]) {
    let expression = received.iter().find_map(AtRuleExpression::unwrap);
    let block = received.iter().find_map(AtRuleBlock::unwrap);

    let mut at_rule = at_rule.borrow_mut();
    if at_rule.expression.is_none() {
        at_rule.expression = expression;
    }
    if at_rule.block.is_none() {
        at_rule.block = block;
    }
}

fn missing_at_rule_part(at_rule: &Shared<AtRule>, strategy: &str, position: Position) -> CssError {
    let expected = if at_rule.borrow().needs_expression() {
        "AtRuleExpression"
    } else {
        "AtRuleBlock"
    };
    CssError::new(
        ErrorCode::MissingStrategyResult {
            strategy: strategy.to_string(),
            expected: expected.to_string(),
        },
        position,
    )
}
