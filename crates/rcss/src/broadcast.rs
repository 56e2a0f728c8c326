//! Broadcast chains.
//!
//! Parser units hand every node they create to a [`Broadcaster`]. Sinks
//! wrap one another by mutable reference, so a chain is built on the stack
//! around a single refinement and torn down when it returns:
//!
//! ```rust
//! use rcss::ast::Syntax;
//! use rcss::broadcast::{QueryableBroadcaster, QueuingBroadcaster};
//!
//! let mut delivered: Vec<Syntax> = Vec::new();
//! let mut queue = QueuingBroadcaster::new(&mut delivered);
//! queue.pause();
//! let query = QueryableBroadcaster::new(&mut queue);
//! // ... a nested parse broadcasts into `query` ...
//! let _found = query.into_received();
//! queue.resume().unwrap();
//! ```

use std::any;
use std::marker::PhantomData;

use crate::ast::{EventTags, Shared, Syntax, SyntaxUnit};
use crate::error::{CssError, ErrorCode, Position, Result};

/// Receives newly created or changed nodes.
pub trait Broadcaster {
    fn broadcast(&mut self, syntax: Syntax) -> Result<()>;
}

/// Records everything it receives.
impl Broadcaster for Vec<Syntax> {
    fn broadcast(&mut self, syntax: Syntax) -> Result<()> {
        self.push(syntax);
        Ok(())
    }
}

/// Drops everything it receives.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Broadcaster for Discard {
    fn broadcast(&mut self, _syntax: Syntax) -> Result<()> {
        Ok(())
    }
}

/// Forwards every node unchanged and keeps a record of what passed
/// through, so the code that set up the chain can pull results back out.
pub struct QueryableBroadcaster<'a> {
    inner: Option<&'a mut dyn Broadcaster>,
    received: Vec<Syntax>,
}

impl<'a> QueryableBroadcaster<'a> {
    pub fn new(inner: &'a mut dyn Broadcaster) -> Self {
        Self {
            inner: Some(inner),
            received: Vec::new(),
        }
    }

    /// A queryable sink with nothing downstream.
    pub fn detached() -> Self {
        Self {
            inner: None,
            received: Vec::new(),
        }
    }

    /// The first received node of type `T`.
    pub fn find<T: SyntaxUnit>(&self) -> Option<Shared<T>> {
        self.received.iter().find_map(T::unwrap)
    }

    /// Every received node of type `T`, in arrival order.
    pub fn filter<T: SyntaxUnit>(&self) -> Vec<Shared<T>> {
        self.received.iter().filter_map(T::unwrap).collect()
    }

    pub fn received(&self) -> &[Syntax] {
        &self.received
    }

    /// Releases the downstream sink and returns everything received.
    pub fn into_received(self) -> Vec<Syntax> {
        self.received
    }
}

impl Broadcaster for QueryableBroadcaster<'_> {
    fn broadcast(&mut self, syntax: Syntax) -> Result<()> {
        self.received.push(syntax.clone());
        match self.inner.as_mut() {
            Some(inner) => inner.broadcast(syntax),
            None => Ok(()),
        }
    }
}

/// Holds nodes back while paused and releases them, in arrival order, on
/// [`resume`](Self::resume). Nodes carrying one of the always-flush tags
/// are delivered immediately even while paused.
pub struct QueuingBroadcaster<'a> {
    inner: &'a mut dyn Broadcaster,
    paused: bool,
    queue: Vec<Syntax>,
    always_flush: EventTags,
}

impl<'a> QueuingBroadcaster<'a> {
    pub fn new(inner: &'a mut dyn Broadcaster) -> Self {
        Self {
            inner,
            paused: false,
            queue: Vec::new(),
            always_flush: EventTags::empty(),
        }
    }

    pub fn always_flush(mut self, tags: EventTags) -> Self {
        self.always_flush |= tags;
        self
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Flushes the queue downstream and switches to pass-through.
    pub fn resume(&mut self) -> Result<()> {
        self.paused = false;
        if !self.queue.is_empty() {
            log::trace!("flushing {} queued units", self.queue.len());
        }
        for syntax in std::mem::take(&mut self.queue) {
            self.inner.broadcast(syntax)?;
        }
        Ok(())
    }
}

impl Broadcaster for QueuingBroadcaster<'_> {
    fn broadcast(&mut self, syntax: Syntax) -> Result<()> {
        if self.paused && !syntax.tags().intersects(self.always_flush) {
            self.queue.push(syntax);
            Ok(())
        } else {
            self.inner.broadcast(syntax)
        }
    }
}

/// Forwards every node and captures the first one of type `T`.
pub struct SingleInterestBroadcaster<'a, T> {
    inner: &'a mut dyn Broadcaster,
    value: Option<Shared<T>>,
    _interest: PhantomData<T>,
}

impl<'a, T: SyntaxUnit> SingleInterestBroadcaster<'a, T> {
    pub fn new(inner: &'a mut dyn Broadcaster) -> Self {
        Self {
            inner,
            value: None,
            _interest: PhantomData,
        }
    }

    pub fn value(&self) -> Option<Shared<T>> {
        self.value.clone()
    }

    /// The captured node, or an error blaming `strategy` for reporting
    /// success without producing one.
    pub fn require(&self, strategy: &str, position: Position) -> Result<Shared<T>> {
        self.value.clone().ok_or_else(|| {
            let expected = any::type_name::<T>()
                .rsplit("::")
                .next()
                .unwrap_or_default()
                .to_string();
            CssError::new(
                ErrorCode::MissingStrategyResult {
                    strategy: strategy.to_string(),
                    expected,
                },
                position,
            )
        })
    }
}

impl<T: SyntaxUnit> Broadcaster for SingleInterestBroadcaster<'_, T> {
    fn broadcast(&mut self, syntax: Syntax) -> Result<()> {
        if self.value.is_none() {
            self.value = T::unwrap(&syntax);
        }
        self.inner.broadcast(syntax)
    }
}
