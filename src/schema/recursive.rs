//! Self-referential schemas.
//!
//! The owner holds the only strong reference to the cell. The placeholder
//! handed to the generator (and therefore every back-edge embedded in the
//! body) holds a weak one, so a cyclic schema never keeps itself alive.
use std::fmt;
use std::sync::{Arc, Weak};
use once_cell::sync::OnceCell;

use super::Schema;

type Cell = OnceCell<Arc<Schema>>;

#[derive(Clone)]
pub struct Recursive {
    link: Link,
}

#[derive(Clone)]
enum Link {
    Owner(Arc<Cell>),
    Back(Weak<Cell>),
}

/// Why a recursive reference could not be followed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unlinked {
    /// The owning schema was dropped while a back-reference survived.
    Dropped,
    /// The reference was followed before the generator returned.
    Pending,
}

impl Unlinked {
    pub fn reason(&self) -> &'static str {
        match self {
            Unlinked::Dropped => "recursive schema outlived its owner",
            Unlinked::Pending => "recursive schema used before its body was linked",
        }
    }
}

impl Recursive {
    /// Fixpoint construction: `generate` receives a placeholder standing for
    /// the schema being defined, and its result is linked behind it.
    pub fn new(generate: impl FnOnce(Schema) -> Schema) -> Self {
        match Self::try_new(|this| Ok::<_, std::convert::Infallible>(generate(this))) {
            Ok(rec) => rec,
            Err(never) => match never {},
        }
    }

    pub fn try_new<E>(generate: impl FnOnce(Schema) -> Result<Schema, E>) -> Result<Self, E> {
        let cell: Arc<Cell> = Arc::new(OnceCell::new());
        let placeholder = Schema::Recursive(Recursive { link: Link::Back(Arc::downgrade(&cell)) });
        let body = generate(placeholder)?;
        let linked = cell.set(Arc::new(body)).is_ok();
        debug_assert!(linked, "recursive cell linked twice");
        Ok(Recursive { link: Link::Owner(cell) })
    }

    /// Follow the reference to the linked body.
    pub fn resolve(&self) -> Result<Arc<Schema>, Unlinked> {
        let cell = match &self.link {
            Link::Owner(cell) => cell.clone(),
            Link::Back(weak) => weak.upgrade().ok_or(Unlinked::Dropped)?,
        };
        cell.get().cloned().ok_or(Unlinked::Pending)
    }

    /// True for the back-edges inside a body, false for the owner.
    pub fn is_back_reference(&self) -> bool {
        matches!(self.link, Link::Back(_))
    }

    /// Shared by an owner and all of its back-edges; distinct per `rec` call.
    pub fn identity(&self) -> usize {
        match &self.link {
            Link::Owner(cell) => Arc::as_ptr(cell) as usize,
            Link::Back(weak) => weak.as_ptr() as usize,
        }
    }
}

impl fmt::Debug for Recursive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.link {
            Link::Owner(cell) => match cell.get() {
                Some(body) => f.debug_tuple("Recursive").field(body).finish(),
                None => f.write_str("Recursive(<pending>)"),
            },
            Link::Back(_) => f.write_str("Recursive(<self>)"),
        }
    }
}
