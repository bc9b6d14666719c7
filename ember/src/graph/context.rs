use super::conditional::*;
use super::instance::*;
use super::module::*;
use super::signal::*;

use typed_arena::Arena;

use std::cell::{Cell, RefCell};

/// A top-level container/owner object for a [`Module`] graph.
///
/// A `Context` owns all parts of a module graph, and provides an API for creating [`Module`] objects. Everything allocated in a `Context` lives as long as the `Context` itself, so graph nodes refer to each other with plain references.
///
/// # Examples
///
/// ```
/// use ember::*;
///
/// let c = Context::new();
///
/// let m = c.module("MyModule");
/// let o = m.output("out", 1).unwrap();
/// o.drive(m.input("in", 1).unwrap()).unwrap();
/// ```
#[must_use]
pub struct Context<'a> {
    pub(super) module_arena: Arena<Module<'a>>,
    pub(super) signal_arena: Arena<Signal<'a>>,
    pub(super) instance_arena: Arena<Instance<'a>>,
    pub(super) block_arena: Arena<ConditionalBlock<'a>>,

    pub(super) modules: RefCell<Vec<&'a Module<'a>>>,

    next_signal_id: Cell<u32>,
}

impl<'a> Context<'a> {
    /// Creates a new, empty `Context`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    /// ```
    pub fn new() -> Context<'a> {
        Context {
            module_arena: Arena::new(),
            signal_arena: Arena::new(),
            instance_arena: Arena::new(),
            block_arena: Arena::new(),

            modules: RefCell::new(Vec::new()),

            next_signal_id: Cell::new(0),
        }
    }

    /// Creates a new [`Module`] definition called `name` in this `Context`.
    ///
    /// Conventionally, `name` should be `CamelCase`, though this is not enforced. Names don't need to be unique; the SystemVerilog generator disambiguates them.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let my_module = c.module("MyModule");
    /// let another_mod = c.module("AnotherMod");
    /// ```
    pub fn module<S: Into<String>>(&'a self, name: S) -> &'a Module<'a> {
        let id = self.modules.borrow().len() as u32;
        let module = self.module_arena.alloc(Module::new(self, id, name.into()));
        self.modules.borrow_mut().push(module);
        module
    }

    /// Returns every [`Module`] created in this `Context`, in creation order.
    pub fn modules(&self) -> Vec<&'a Module<'a>> {
        self.modules.borrow().clone()
    }

    pub(super) fn alloc_signal(
        &'a self,
        module: &'a Module<'a>,
        data: SignalData<'a>,
    ) -> &'a Signal<'a> {
        let id = SignalId(self.next_signal_id.get());
        self.next_signal_id.set(id.0 + 1);
        self.signal_arena.alloc(Signal {
            context: self,
            module,
            id,
            data,
        })
    }
}

impl<'a> Default for Context<'a> {
    fn default() -> Self {
        Context::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_no_modules() {
        let c = Context::new();

        assert!(c.modules().is_empty());
    }

    #[test]
    fn signal_ids_are_unique_across_modules() {
        let c = Context::new();

        let a = c.module("A");
        let b = c.module("B");
        let i = a.input("i", 1).unwrap();
        let j = b.input("i", 1).unwrap();

        assert_ne!(i.id(), j.id());
        assert_eq!(c.modules().len(), 2);
    }
}
