use super::context::*;
use super::module::*;
use super::signal::*;

use crate::error::Error;

use std::cell::RefCell;
use std::collections::BTreeMap;

/// An instance of a [`Module`], created by the [`Module`]::[`instance`] method.
///
/// An `Instance` lives in its parent module. It binds parent signals to the inputs of the instantiated definition, and exposes the definition's outputs as parent-side signals.
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
/// ```
///
/// [`instance`]: ./struct.Module.html#method.instance
#[must_use]
pub struct Instance<'a> {
    context: &'a Context<'a>,
    pub(crate) module: &'a Module<'a>,

    pub(crate) instantiated_module: &'a Module<'a>,
    pub(crate) name: String,
    pub(crate) driven_inputs: RefCell<BTreeMap<String, &'a Signal<'a>>>,
    outputs: RefCell<BTreeMap<String, &'a Signal<'a>>>,
}

impl<'a> Instance<'a> {
    pub(super) fn new(
        context: &'a Context<'a>,
        module: &'a Module<'a>,
        instantiated_module: &'a Module<'a>,
        name: String,
    ) -> Instance<'a> {
        Instance {
            context,
            module,

            instantiated_module,
            name,
            driven_inputs: RefCell::new(BTreeMap::new()),
            outputs: RefCell::new(BTreeMap::new()),
        }
    }

    /// Returns the name given to this `Instance`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the [`Module`] definition this is an instance of.
    pub fn instantiated_module(&self) -> &'a Module<'a> {
        self.instantiated_module
    }

    /// Returns the parent-side [`Signal`] bound to the input called `name`, if any.
    pub fn driven_input(&self, name: &str) -> Option<&'a Signal<'a>> {
        self.driven_inputs.borrow().get(name).copied()
    }

    /// Drives the input of this [`Module`] `Instance` specified by `name` with the given [`Signal`].
    ///
    /// The widths of the input and `source` are compared when the parent [`Module`] is built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleAlreadyBuilt`] if the parent was built, [`Error::SignalFromOtherModule`] if `source` doesn't belong to the parent, [`Error::NoSuchPort`] if the instantiated module has no such input, and [`Error::MultipleDriver`] if the input is already driven on this `Instance`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let inner = c.module("Inner");
    /// inner.output("o", 32).unwrap().drive(inner.input("i", 32).unwrap()).unwrap();
    ///
    /// let outer = c.module("Outer");
    /// let inner_inst = outer.instance("inner_inst", inner).unwrap();
    /// // Drive inner_inst's "i" input with a 32-bit literal
    /// inner_inst.drive_input("i", outer.lit(0xfadebabeu32, 32).unwrap()).unwrap();
    /// ```
    pub fn drive_input<S: Into<String>>(&'a self, name: S, source: &'a Signal<'a>) -> Result<(), Error> {
        let name = name.into();
        self.module.check_not_built("drive an instance input")?;
        self.module.check_owns(source)?;
        if self.instantiated_module.input_named(&name).is_none() {
            return Err(Error::NoSuchPort {
                module: self.instantiated_module.name.clone(),
                kind: "input".into(),
                port: name,
            });
        }
        let mut driven_inputs = self.driven_inputs.borrow_mut();
        if let Some(existing) = driven_inputs.get(&name) {
            return Err(Error::MultipleDriver {
                module: self.module.name.clone(),
                signal: format!("{}.{}", self.name, name),
                existing: format!("\"{}\"", existing),
                requested: format!("\"{}\"", source),
            });
        }
        driven_inputs.insert(name, source);
        Ok(())
    }

    /// Returns a [`Signal`] in the parent [`Module`] that represents the output of this `Instance` called `name`.
    ///
    /// Repeated calls with the same `name` return the same [`Signal`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchPort`] if the instantiated module has no such output.
    pub fn output(&'a self, name: &str) -> Result<&'a Signal<'a>, Error> {
        if let Some(signal) = self.outputs.borrow().get(name) {
            return Ok(*signal);
        }
        let output = self
            .instantiated_module
            .output_named(name)
            .ok_or_else(|| Error::NoSuchPort {
                module: self.instantiated_module.name.clone(),
                kind: "output".into(),
                port: name.into(),
            })?;
        let signal = self.context.alloc_signal(
            self.module,
            SignalData::InstanceOutput {
                instance: self,
                name: name.into(),
                bit_width: output.bit_width(),
            },
        );
        self.outputs.borrow_mut().insert(name.into(), signal);
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_input_errors() {
        let c = Context::new();

        let inner = c.module("Inner");
        let _ = inner.input("a", 1).unwrap();

        let outer = c.module("Outer");
        let other = c.module("Other");
        let inst = outer.instance("inner", inner).unwrap();

        assert!(matches!(
            inst.drive_input("b", outer.high()),
            Err(Error::NoSuchPort { .. })
        ));
        assert!(matches!(
            inst.drive_input("a", other.high()),
            Err(Error::SignalFromOtherModule { .. })
        ));
        inst.drive_input("a", outer.high()).unwrap();
        assert!(matches!(
            inst.drive_input("a", outer.low()),
            Err(Error::MultipleDriver { .. })
        ));
        assert!(inst.driven_input("a").is_some());
    }

    #[test]
    fn output_signals_are_cached() {
        let c = Context::new();

        let inner = c.module("Inner");
        let _ = inner.output("o", 7).unwrap();

        let outer = c.module("Outer");
        let inst = outer.instance("inner", inner).unwrap();

        let a = inst.output("o").unwrap();
        let b = inst.output("o").unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.bit_width(), 7);
        assert!(std::ptr::eq(a.module(), outer));
        assert!(matches!(
            inst.output("x"),
            Err(Error::NoSuchPort { .. })
        ));
    }
}
