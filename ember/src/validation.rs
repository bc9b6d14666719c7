use crate::error::Error;
use crate::graph;

use log::debug;

use std::collections::BTreeSet;

pub fn build_module_hierarchy<'a>(m: &'a graph::Module<'a>) -> Result<(), Error> {
    if m.is_built() {
        return Ok(());
    }

    detect_recursive_definitions(m, &mut Vec::new(), &mut BTreeSet::new(), m)?;

    let definitions = m.definitions_post_order();
    for module in definitions.iter().filter(|module| !module.is_built()) {
        validate_instances(module)?;
        validate_drivers(module)?;
    }
    for module in definitions.iter() {
        module.mark_built();
    }

    debug!(
        "built module \"{}\" ({} definition(s) in hierarchy)",
        m.name,
        definitions.len()
    );

    Ok(())
}

fn detect_recursive_definitions<'a>(
    m: &'a graph::Module<'a>,
    stack: &mut Vec<(&'a graph::Module<'a>, String)>,
    done: &mut BTreeSet<u32>,
    root: &graph::Module<'a>,
) -> Result<(), Error> {
    for instance in m.instances.borrow().iter() {
        let child = instance.instantiated_module;
        stack.push((m, format!("{}.{}", m.name, instance.name)));
        if let Some(start) = stack.iter().position(|(module, _)| module.id == child.id) {
            return Err(Error::CyclicHierarchy {
                module: root.name.clone(),
                path: stack[start..].iter().map(|(_, step)| step.clone()).collect(),
            });
        }
        if !done.contains(&child.id) {
            detect_recursive_definitions(child, stack, done, root)?;
        }
        stack.pop();
    }
    done.insert(m.id);
    Ok(())
}

fn validate_instances<'a>(m: &graph::Module<'a>) -> Result<(), Error> {
    for instance in m.instances.borrow().iter() {
        let instantiated = instance.instantiated_module;
        for input in instantiated.inputs.borrow().iter() {
            let name = input.to_string();
            let source = instance
                .driven_input(&name)
                .ok_or_else(|| Error::UndrivenInstanceInput {
                    module: m.name.clone(),
                    instance: instance.name.clone(),
                    instantiated: instantiated.name.clone(),
                    input: name.clone(),
                })?;
            if source.bit_width() != input.bit_width() {
                return Err(Error::PortWidthMismatch {
                    location: format!(
                        "instance \"{}\" of module \"{}\" in module \"{}\"",
                        instance.name, instantiated.name, m.name
                    ),
                    port: name,
                    expected: input.bit_width(),
                    actual: source.bit_width(),
                });
            }
        }
    }
    Ok(())
}

fn validate_drivers<'a>(m: &graph::Module<'a>) -> Result<(), Error> {
    for output in m.outputs.borrow().iter() {
        if let Some(graph::Driver::Assign(source)) = output.driver() {
            if source.bit_width() != output.bit_width() {
                return Err(Error::PortWidthMismatch {
                    location: format!("module \"{}\"", m.name),
                    port: output.to_string(),
                    expected: output.bit_width(),
                    actual: source.bit_width(),
                });
            }
        }
    }
    for wire in m.wires.borrow().iter() {
        if let Some(graph::Driver::Assign(source)) = wire.driver() {
            if source.bit_width() != wire.bit_width() {
                return Err(Error::WidthMismatch {
                    context: format!("driver of wire \"{}\" in module \"{}\"", wire, m.name),
                    expected: wire.bit_width(),
                    actual: source.bit_width(),
                });
            }
        }
    }
    Ok(())
}
