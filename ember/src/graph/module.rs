use super::conditional::*;
use super::context::*;
use super::instance::*;
use super::signal::*;

use crate::error::Error;
use crate::validation;
use crate::value::*;

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::ptr;

/// A self-contained and potentially-reusable hardware design unit, created by the [`Context`]::[`module`] method.
///
/// A `Module` is a definition: it owns its ports, wires, blocks and sub-module [`Instance`]s, and may itself be instantiated any number of times. Once [`build`] has been called, the definition is frozen and every mutating method returns [`Error::ModuleAlreadyBuilt`].
///
/// # Examples
///
/// ```
/// use ember::*;
///
/// let c = Context::new();
///
/// let m = c.module("MyModule");
/// let i = m.input("in", 1).unwrap();
/// m.output("out", 1).unwrap().drive(i).unwrap();
/// m.build().unwrap();
///
/// assert!(m.input("late", 1).is_err());
/// ```
///
/// [`build`]: #method.build
/// [`Context`]: ./struct.Context.html
/// [`module`]: ./struct.Context.html#method.module
#[must_use]
pub struct Module<'a> {
    context: &'a Context<'a>,

    pub(crate) id: u32,
    pub(crate) name: String,

    pub(crate) inputs: RefCell<Vec<&'a Signal<'a>>>,
    pub(crate) outputs: RefCell<Vec<&'a Signal<'a>>>,
    pub(crate) wires: RefCell<Vec<&'a Signal<'a>>>,
    pub(crate) blocks: RefCell<Vec<&'a ConditionalBlock<'a>>>,
    pub(crate) instances: RefCell<Vec<&'a Instance<'a>>>,

    names: RefCell<BTreeSet<String>>,
    built: Cell<bool>,
}

impl<'a> Module<'a> {
    pub(super) fn new(context: &'a Context<'a>, id: u32, name: String) -> Module<'a> {
        Module {
            context,

            id,
            name,

            inputs: RefCell::new(Vec::new()),
            outputs: RefCell::new(Vec::new()),
            wires: RefCell::new(Vec::new()),
            blocks: RefCell::new(Vec::new()),
            instances: RefCell::new(Vec::new()),

            names: RefCell::new(BTreeSet::new()),
            built: Cell::new(false),
        }
    }

    /// Returns this `Module`'s definition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns this `Module`'s inputs in declaration order.
    pub fn inputs(&self) -> Vec<&'a Signal<'a>> {
        self.inputs.borrow().clone()
    }

    /// Returns this `Module`'s outputs in declaration order.
    pub fn outputs(&self) -> Vec<&'a Signal<'a>> {
        self.outputs.borrow().clone()
    }

    /// Returns this `Module`'s internal wires in declaration order.
    pub fn wires(&self) -> Vec<&'a Signal<'a>> {
        self.wires.borrow().clone()
    }

    /// Returns this `Module`'s conditional blocks in attachment order.
    pub fn blocks(&self) -> Vec<&'a ConditionalBlock<'a>> {
        self.blocks.borrow().clone()
    }

    /// Returns this `Module`'s sub-module instances in instantiation order.
    pub fn instances(&self) -> Vec<&'a Instance<'a>> {
        self.instances.borrow().clone()
    }

    /// Looks up an input by name.
    pub fn input_named(&self, name: &str) -> Option<&'a Signal<'a>> {
        self.inputs
            .borrow()
            .iter()
            .copied()
            .find(|input| input.name() == Some(name))
    }

    /// Looks up an output by name.
    pub fn output_named(&self, name: &str) -> Option<&'a Signal<'a>> {
        self.outputs
            .borrow()
            .iter()
            .copied()
            .find(|output| output.name() == Some(name))
    }

    /// Returns `true` once [`build`](#method.build) has succeeded for this `Module` or for a `Module` that instantiates it.
    pub fn is_built(&self) -> bool {
        self.built.get()
    }

    pub(crate) fn mark_built(&self) {
        self.built.set(true);
    }

    pub(crate) fn check_not_built(&self, operation: &str) -> Result<(), Error> {
        if self.is_built() {
            return Err(Error::ModuleAlreadyBuilt {
                module: self.name.clone(),
                operation: operation.into(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_owns(&self, signal: &Signal<'a>) -> Result<(), Error> {
        if !ptr::eq(self, signal.module) {
            return Err(Error::SignalFromOtherModule {
                signal: signal.to_string(),
                owner: signal.module.name.clone(),
                module: self.name.clone(),
            });
        }
        Ok(())
    }

    fn claim_name(&self, name: &str) -> Result<(), Error> {
        if !self.names.borrow_mut().insert(name.to_string()) {
            return Err(Error::DuplicateName {
                module: self.name.clone(),
                name: name.into(),
            });
        }
        Ok(())
    }

    /// Creates a [`Signal`] that represents the constant literal specified by `value` with `bit_width` bits.
    ///
    /// The bit width of the type provided by `value` doesn't need to match `bit_width`, but the value represented by `value` must fit into `bit_width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBitWidth`] if `bit_width` is less than [`MIN_SIGNAL_BIT_WIDTH`] or greater than [`MAX_SIGNAL_BIT_WIDTH`], and [`Error::ValueOverflow`] if the specified `value` doesn't fit into `bit_width` bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let eight_bit_const = m.lit(0xffu32, 8).unwrap();
    /// let one_bit_const = m.lit(0u32, 1).unwrap();
    /// let twenty_seven_bit_const = m.lit(true, 27).unwrap();
    ///
    /// assert!(m.lit(128u32, 7).is_err());
    /// ```
    pub fn lit(&'a self, value: impl Into<Constant>, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        Ok(self.lit_value(Value::from_constant(value, bit_width)?))
    }

    /// Creates a [`Signal`] that represents the given four-state [`Value`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let unknown = m.lit_value(Value::x(4));
    /// assert_eq!(unknown.bit_width(), 4);
    /// ```
    pub fn lit_value(&'a self, value: Value) -> &'a Signal<'a> {
        self.context.alloc_signal(self, SignalData::Lit { value })
    }

    /// Convenience method to create a [`Signal`] that represents a single `0` bit.
    pub fn low(&'a self) -> &'a Signal<'a> {
        self.lit_value(Value::from_bool(false))
    }

    /// Convenience method to create a [`Signal`] that represents a single `1` bit.
    pub fn high(&'a self) -> &'a Signal<'a> {
        self.lit_value(Value::from_bool(true))
    }

    /// Creates an input for this `Module` called `name` with `bit_width` bits, and returns a [`Signal`] that represents the value of this input.
    ///
    /// Inputs of the top-level module receive simulator stimulus; inputs of instantiated modules are driven by their parent through [`Instance::drive_input`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBitWidth`] for unsupported widths, [`Error::DuplicateName`] if `name` is taken, and [`Error::ModuleAlreadyBuilt`] after [`build`](#method.build).
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let my_input = m.input("my_input", 80).unwrap();
    /// ```
    pub fn input<S: Into<String>>(&'a self, name: S, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        let name = name.into();
        self.check_not_built("add an input")?;
        check_bit_width(&format!("input \"{}\"", name), bit_width)?;
        self.claim_name(&name)?;
        let input = self
            .context
            .alloc_signal(self, SignalData::Input { name, bit_width });
        self.inputs.borrow_mut().push(input);
        Ok(input)
    }

    /// Creates an output for this `Module` called `name` with `bit_width` bits, and returns the new, undriven output [`Signal`].
    ///
    /// Drive the output with [`Signal::drive`] or by assigning it in a [`ConditionalBlock`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBitWidth`] for unsupported widths, [`Error::DuplicateName`] if `name` is taken, and [`Error::ModuleAlreadyBuilt`] after [`build`](#method.build).
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let my_output = m.output("my_output", 1).unwrap();
    /// my_output.drive(m.high()).unwrap();
    /// ```
    pub fn output<S: Into<String>>(&'a self, name: S, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        let name = name.into();
        self.check_not_built("add an output")?;
        check_bit_width(&format!("output \"{}\"", name), bit_width)?;
        self.claim_name(&name)?;
        let output = self.context.alloc_signal(
            self,
            SignalData::Output {
                name,
                bit_width,
                driver: RefCell::new(None),
            },
        );
        self.outputs.borrow_mut().push(output);
        Ok(output)
    }

    /// Creates an internal, state-holding wire called `name` with `bit_width` bits.
    ///
    /// # Errors
    ///
    /// Same as [`output`](#method.output).
    pub fn wire<S: Into<String>>(&'a self, name: S, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        let name = name.into();
        self.check_not_built("add a wire")?;
        check_bit_width(&format!("wire \"{}\"", name), bit_width)?;
        self.claim_name(&name)?;
        self.alloc_wire(Some(name), bit_width)
    }

    /// Creates an internal wire without a user-given name; generated code and traces refer to it by a synthesized name.
    pub fn anonymous_wire(&'a self, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        self.check_not_built("add a wire")?;
        check_bit_width("wire", bit_width)?;
        self.alloc_wire(None, bit_width)
    }

    fn alloc_wire(&'a self, name: Option<String>, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        let wire = self.context.alloc_signal(
            self,
            SignalData::Wire {
                name,
                bit_width,
                driver: RefCell::new(None),
            },
        );
        self.wires.borrow_mut().push(wire);
        Ok(wire)
    }

    /// Equivalent to `cond.mux(when_true, when_false)`.
    ///
    /// # Panics
    ///
    /// Panics if the signals belong to different `Module`s, or if `cond` isn't 1 bit wide.
    pub fn mux(
        &'a self,
        cond: &'a Signal<'a>,
        when_true: &'a Signal<'a>,
        when_false: &'a Signal<'a>,
    ) -> &'a Signal<'a> {
        cond.mux(when_true, when_false)
    }

    /// Creates an [`Instance`] called `instance_name` of the `Module` definition `module` inside this `Module` definition.
    ///
    /// Instance names are disambiguated when code is generated, so they don't need to be unique.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// // Inner module (simple pass-through)
    /// let inner = c.module("Inner");
    /// inner.output("o", 32).unwrap().drive(inner.input("i", 32).unwrap()).unwrap();
    ///
    /// // Outer module (wraps a single `Inner` instance)
    /// let outer = c.module("Outer");
    /// let inner_inst = outer.instance("inner_inst", inner).unwrap();
    /// inner_inst.drive_input("i", outer.input("i", 32).unwrap()).unwrap();
    /// outer.output("o", 32).unwrap().drive(inner_inst.output("o").unwrap()).unwrap();
    ///
    /// outer.build().unwrap();
    /// ```
    pub fn instance<S: Into<String>>(
        &'a self,
        instance_name: S,
        module: &'a Module<'a>,
    ) -> Result<&'a Instance<'a>, Error> {
        self.check_not_built("add a sub-module instance")?;
        let instance = self.context.instance_arena.alloc(Instance::new(
            self.context,
            self,
            module,
            instance_name.into(),
        ));
        self.instances.borrow_mut().push(instance);
        Ok(instance)
    }

    /// Attaches a combinational [`ConditionalBlock`] whose statements are re-evaluated whenever a signal they read changes.
    ///
    /// # Errors
    ///
    /// See [`ConditionalBlock`] for the checks performed when a block is attached.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    /// let sel = m.input("sel", 1).unwrap();
    /// let a = m.input("a", 4).unwrap();
    /// let b = m.input("b", 4).unwrap();
    /// let y = m.output("y", 4).unwrap();
    ///
    /// m.combinational(vec![
    ///     If::new(sel, vec![assign(y, a)]).otherwise(vec![assign(y, b)]).into(),
    /// ])
    /// .unwrap();
    /// ```
    pub fn combinational(
        &'a self,
        body: Vec<Conditional<'a>>,
    ) -> Result<&'a ConditionalBlock<'a>, Error> {
        self.attach_block(BlockKind::Combinational, body)
    }

    /// Attaches an edge-triggered [`ConditionalBlock`] that evaluates on the given `edge` of `clock`.
    ///
    /// The block reads the values signals had before the edge and its assignments take effect in the following delta cycle.
    pub fn sequential(
        &'a self,
        clock: &'a Signal<'a>,
        edge: Edge,
        body: Vec<Conditional<'a>>,
    ) -> Result<&'a ConditionalBlock<'a>, Error> {
        self.attach_block(BlockKind::EdgeTriggered { clock, edge }, body)
    }

    fn attach_block(
        &'a self,
        kind: BlockKind<'a>,
        body: Vec<Conditional<'a>>,
    ) -> Result<&'a ConditionalBlock<'a>, Error> {
        self.check_not_built("attach a block")?;
        let driven = ConditionalBlock::validate(self, &kind, &body)?;
        let block = self
            .context
            .block_arena
            .alloc(ConditionalBlock::new(self, kind, body, driven));
        for signal in block.driven.iter() {
            if let Some(slot) = signal.driver_slot() {
                *slot.borrow_mut() = Some(Driver::Block(block));
            }
        }
        self.blocks.borrow_mut().push(block);
        Ok(block)
    }

    /// Validates this `Module` and every `Module` it instantiates, then freezes them.
    ///
    /// The following checks are performed, in order:
    ///
    /// - the instance hierarchy must not contain itself ([`Error::CyclicHierarchy`]),
    /// - every instance input must be driven ([`Error::UndrivenInstanceInput`]),
    /// - instance inputs and module outputs must be connected to signals of the same width ([`Error::PortWidthMismatch`]),
    /// - wires must be driven by signals of the same width ([`Error::WidthMismatch`]).
    ///
    /// Calling `build` again is a no-op, and sub-module definitions that have already been built are not revisited.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let a = c.module("A");
    /// let b = c.module("B");
    /// let _ = a.instance("b", b).unwrap();
    /// let _ = b.instance("a", a).unwrap();
    ///
    /// assert!(matches!(a.build(), Err(Error::CyclicHierarchy { .. })));
    /// ```
    pub fn build(&'a self) -> Result<(), Error> {
        validation::build_module_hierarchy(self)
    }

    /// Returns this definition and every definition it (transitively) instantiates, children first.
    pub(crate) fn definitions_post_order(&'a self) -> Vec<&'a Module<'a>> {
        let mut visited = BTreeSet::new();
        let mut ret = Vec::new();
        self.collect_post_order(&mut visited, &mut ret);
        ret
    }

    fn collect_post_order(&'a self, visited: &mut BTreeSet<u32>, ret: &mut Vec<&'a Module<'a>>) {
        if !visited.insert(self.id) {
            return;
        }
        for instance in self.instances.borrow().iter() {
            instance.instantiated_module.collect_post_order(visited, ret);
        }
        ret.push(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_bit_width_errors() {
        let c = Context::new();

        let m = c.module("A");

        assert!(matches!(
            m.input("i", 0),
            Err(Error::InvalidBitWidth { width: 0, .. })
        ));
        assert!(matches!(
            m.input("i", 129),
            Err(Error::InvalidBitWidth { width: 129, .. })
        ));
    }

    #[test]
    fn lit_value_cannot_fit_into_bit_width_error() {
        let c = Context::new();

        let m = c.module("A");

        assert!(matches!(
            m.lit(1023u128, 4),
            Err(Error::ValueOverflow {
                value: 1023,
                width: 4,
                required: 10
            })
        ));
    }

    #[test]
    fn duplicate_names_error() {
        let c = Context::new();

        let m = c.module("A");
        let _ = m.input("a", 1).unwrap();

        assert!(matches!(
            m.output("a", 1),
            Err(Error::DuplicateName { .. })
        ));
        assert!(matches!(m.wire("a", 1), Err(Error::DuplicateName { .. })));
        assert!(m.anonymous_wire(1).is_ok());
    }

    #[test]
    fn ports_keep_declaration_order() {
        let c = Context::new();

        let m = c.module("A");
        let _ = m.input("z", 1).unwrap();
        let _ = m.input("a", 2).unwrap();
        let _ = m.output("y", 1).unwrap();

        let names: Vec<_> = m.inputs().iter().map(|i| i.to_string()).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(m.input_named("a").unwrap().bit_width(), 2);
        assert!(m.output_named("y").is_some());
        assert!(m.output_named("z").is_none());
    }

    #[test]
    fn mutation_after_build_error() {
        let c = Context::new();

        let m = c.module("A");
        let child = c.module("B");
        let o = m.output("o", 1).unwrap();
        m.build().unwrap();
        m.build().unwrap();

        assert!(m.is_built());
        assert!(matches!(
            m.input("i", 1),
            Err(Error::ModuleAlreadyBuilt { .. })
        ));
        assert!(matches!(
            m.instance("b", child),
            Err(Error::ModuleAlreadyBuilt { .. })
        ));
        assert!(matches!(
            o.drive(m.high()),
            Err(Error::ModuleAlreadyBuilt { .. })
        ));
        assert!(matches!(
            m.combinational(vec![]),
            Err(Error::ModuleAlreadyBuilt { .. })
        ));
    }

    #[test]
    fn definitions_post_order_visits_shared_definitions_once() {
        let c = Context::new();

        let leaf = c.module("Leaf");
        let mid = c.module("Mid");
        let top = c.module("Top");
        let _ = mid.instance("l0", leaf).unwrap();
        let _ = mid.instance("l1", leaf).unwrap();
        let _ = top.instance("m", mid).unwrap();
        let _ = top.instance("l", leaf).unwrap();

        let names: Vec<_> = top
            .definitions_post_order()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["Leaf", "Mid", "Top"]);
    }
}
