//! # rcss
//!
//! A CSS parsing and transformation engine.
//!
//! Source text is read by a backtracking [`Cursor`] into a tree whose
//! selectors, declaration values, at-rule bodies and function arguments are
//! first kept raw. The [`Refiner`] turns those raw spans into structured
//! children on demand, through pluggable strategies with a standard
//! fallback. Every unit the parser or the refiner creates goes through a
//! [`Broadcaster`] chain and, under a [`Processor`], on to the passes
//! subscribed to it for the current [`Phase`].
//!
//! ## Example
//!
//! ```rust
//! use rcss::ast::{EventTags, Syntax};
//! use rcss::{Context, Pass, Phase, Processor, Subscription, passes::AutoRefine};
//! use std::cell::Cell;
//!
//! #[derive(Default)]
//! struct CountClasses {
//!     seen: Cell<usize>,
//! }
//!
//! impl CountClasses {
//!     fn class(&self, _syntax: &Syntax, _cx: &Context<'_>) -> rcss::Result<()> {
//!         self.seen.set(self.seen.get() + 1);
//!         Ok(())
//!     }
//! }
//!
//! impl Pass for CountClasses {
//!     fn subscriptions() -> Vec<Subscription<Self>> {
//!         vec![Subscription::new(
//!             EventTags::CLASS_SELECTOR,
//!             Phase::Validate,
//!             CountClasses::class,
//!         )]
//!     }
//! }
//!
//! let mut processor = Processor::new();
//! processor.register(AutoRefine);
//! let counter = processor.register(CountClasses::default());
//! processor.process(".a, .b.c { color: red }").unwrap();
//! assert_eq!(counter.seen.get(), 3);
//! ```

pub mod ast;
pub mod broadcast;
pub mod cursor;
pub mod emitter;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod passes;
pub mod processor;
pub mod refine;
pub mod tokens;
pub mod tree;

pub use ast::{Shared, Status, Stylesheet, Syntax, SyntaxKind, SyntaxUnit};
pub use broadcast::{
    Broadcaster, Discard, QueryableBroadcaster, QueuingBroadcaster, SingleInterestBroadcaster,
};
pub use cursor::{Cursor, Snapshot};
pub use emitter::{Context, Emitter, Pass, Phase, Subscription};
pub use error::{CssError, ErrorCode, Position, Result};
pub use grammar::Grammar;
pub use processor::Processor;
pub use refine::{MediaStrategy, Refinement, Refiner, StandardStrategy};
pub use tokens::Token;

/// Parses `source` into a stylesheet without refining anything and without
/// delivering units to any pass.
pub fn parse_stylesheet(source: &str) -> Result<Stylesheet> {
    let mut cursor = Cursor::new(source);
    parser::stylesheet(&mut cursor, &mut Discard, &Grammar::default())
}
