use super::ir::*;

use crate::graph;
use crate::names::*;

use std::collections::{BTreeMap, HashMap};

pub struct InstanceDecls {
    pub name: String,
    pub module_name: String,
    /// Parent-side net for each output port, by port name.
    pub output_names: BTreeMap<String, String>,
}

/// Everything declared in one generated module before any statement is emitted.
pub struct ModuleDecls {
    pub signal_names: HashMap<graph::SignalId, String>,
    /// In instantiation order.
    pub instances: Vec<InstanceDecls>,
    pub instance_nets: Vec<NodeDecl>,
}

/// Names the ports and wires of `m`: ports first, in declaration order, so port names only depend on the ports themselves.
pub fn declare_signals<'graph>(
    m: &'graph graph::Module<'graph>,
    names: &mut Uniquifier,
) -> HashMap<graph::SignalId, String> {
    m.inputs
        .borrow()
        .iter()
        .chain(m.outputs.borrow().iter())
        .chain(m.wires.borrow().iter())
        .map(|signal| (signal.id, names.unique(&sanitize(&signal.to_string()))))
        .collect()
}

impl ModuleDecls {
    pub fn new<'graph>(
        m: &'graph graph::Module<'graph>,
        module_names: &HashMap<u32, String>,
        names: &mut Uniquifier,
    ) -> ModuleDecls {
        let signal_names = declare_signals(m, names);

        let mut instances = Vec::new();
        let mut instance_nets = Vec::new();
        for instance in m.instances.borrow().iter() {
            let name = names.unique(&sanitize(&instance.name));
            let mut output_names = BTreeMap::new();
            for output in instance.instantiated_module.outputs.borrow().iter() {
                let port_name = output.to_string();
                let net_name = names.unique(&format!("{}_{}", name, sanitize(&port_name)));
                instance_nets.push(NodeDecl {
                    name: net_name.clone(),
                    bit_width: output.bit_width(),
                });
                output_names.insert(port_name, net_name);
            }
            instances.push(InstanceDecls {
                name,
                module_name: module_names[&instance.instantiated_module.id].clone(),
                output_names,
            });
        }

        ModuleDecls {
            signal_names,
            instances,
            instance_nets,
        }
    }
}
