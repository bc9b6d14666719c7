use super::ir::*;
use super::module_context::*;

use crate::error::Error;
use crate::graph;
use crate::names::Uniquifier;
use crate::value::Value;

use typed_arena::Arena;

use std::collections::{BTreeMap, BTreeSet, HashMap};

pub(crate) struct Compiler<'graph, 'arena> {
    context_arena: &'arena Arena<ModuleContext<'graph, 'arena>>,

    scope_ids: HashMap<&'arena ModuleContext<'graph, 'arena>, ScopeId>,
    signal_ids: HashMap<(ScopeId, graph::SignalId), SimSignalId>,
    prefixes: Vec<String>,

    signals: Vec<SimSignal>,
    scopes: Vec<Scope>,
    processes: Vec<Process>,
}

impl<'graph, 'arena> Compiler<'graph, 'arena> {
    pub fn new(
        context_arena: &'arena Arena<ModuleContext<'graph, 'arena>>,
    ) -> Compiler<'graph, 'arena> {
        Compiler {
            context_arena,

            scope_ids: HashMap::new(),
            signal_ids: HashMap::new(),
            prefixes: Vec::new(),

            signals: Vec::new(),
            scopes: Vec::new(),
            processes: Vec::new(),
        }
    }

    /// Flattens the hierarchy rooted at `m` into a [`Program`].
    pub fn compile(mut self, m: &'graph graph::Module<'graph>) -> Result<Program, Error> {
        let root = self.context_arena.alloc(ModuleContext::new());
        self.declare_scope(m, root, m.name.clone(), "", false);
        self.compile_scope(m, root)?;

        let root_signals = m
            .inputs
            .borrow()
            .iter()
            .chain(m.outputs.borrow().iter())
            .chain(m.wires.borrow().iter())
            .map(|signal| (signal.id, self.signal_ids[&(Program::ROOT, signal.id)]))
            .collect();
        let names: BTreeMap<_, _> = self
            .signals
            .iter()
            .enumerate()
            .filter(|(_, signal)| signal.kind != SignalKind::Net)
            .map(|(index, signal)| (signal.path.clone(), SimSignalId::from_index(index)))
            .collect();

        let mut program = Program {
            signals: self.signals,
            scopes: self.scopes,
            processes: self.processes,
            sensitivity: Vec::new(),
            root_signals,
            names,
        };
        program.build_sensitivity();
        Ok(program)
    }

    fn declare_scope(
        &mut self,
        m: &'graph graph::Module<'graph>,
        context: &'arena ModuleContext<'graph, 'arena>,
        name: String,
        prefix: &str,
        is_instance: bool,
    ) -> ScopeId {
        let scope_id = self.scopes.len();
        self.scopes.push(Scope {
            name,
            module_name: m.name.clone(),
            is_instance,
            children: Vec::new(),
            signals: Vec::new(),
        });
        self.scope_ids.insert(context, scope_id);
        self.prefixes.push(prefix.to_string());

        let ports = m
            .inputs
            .borrow()
            .iter()
            .map(|signal| (*signal, SignalKind::Input))
            .chain(m.outputs.borrow().iter().map(|signal| (*signal, SignalKind::Output)))
            .chain(m.wires.borrow().iter().map(|signal| (*signal, SignalKind::Wire)))
            .collect::<Vec<_>>();
        for (signal, kind) in ports {
            let id = SimSignalId::from_index(self.signals.len());
            let name = signal.to_string();
            let driven = match kind {
                SignalKind::Input => is_instance,
                SignalKind::Output | SignalKind::Wire => signal.driver().is_some(),
                SignalKind::Net => true,
            };
            self.signals.push(SimSignal {
                path: format!("{}{}", prefix, name),
                name,
                bit_width: signal.bit_width(),
                kind,
                scope: scope_id,
                driven,
            });
            self.signal_ids.insert((scope_id, signal.id), id);
            self.scopes[scope_id].signals.push(id);
        }

        let mut instance_names = Uniquifier::new();
        for signal in self.scopes[scope_id].signals.iter() {
            instance_names.reserve(&self.signals[signal.index()].name);
        }
        for instance in m.instances.borrow().iter() {
            let child_context = context.get_child(instance, self.context_arena);
            let child_name = instance_names.unique(&instance.name);
            let child_prefix = format!("{}{}.", prefix, child_name);
            let child_id = self.declare_scope(
                instance.instantiated_module,
                child_context,
                child_name,
                &child_prefix,
                true,
            );
            self.scopes[scope_id].children.push(child_id);
        }

        scope_id
    }

    fn compile_scope(
        &mut self,
        m: &'graph graph::Module<'graph>,
        context: &'arena ModuleContext<'graph, 'arena>,
    ) -> Result<(), Error> {
        let scope = self.scope_ids[&context];

        for signal in m.outputs.borrow().iter().chain(m.wires.borrow().iter()) {
            if let Some(graph::Driver::Assign(source)) = signal.driver() {
                let target = self.signal_ids[&(scope, signal.id)];
                let expr = self.compile_signal(source, context)?;
                self.push_process(Trigger::Level, vec![Stmt::Assign { target, expr }]);
            }
        }

        for block in m.blocks.borrow().iter() {
            let trigger = match block.kind {
                graph::BlockKind::Combinational => Trigger::Level,
                graph::BlockKind::EdgeTriggered { clock, edge } => Trigger::Edge {
                    clock: self.compile_clock(clock, context)?,
                    edge,
                },
            };
            let body = self.compile_statements(&block.body, context)?;
            self.push_process(trigger, body);
        }

        for instance in m.instances.borrow().iter() {
            let child_context = context.get_child(instance, self.context_arena);
            let child_scope = self.scope_ids[&child_context];
            for input in instance.instantiated_module.inputs.borrow().iter() {
                if let Some(source) = instance.driven_input(&input.to_string()) {
                    let target = self.signal_ids[&(child_scope, input.id)];
                    let expr = self.compile_signal(source, context)?;
                    self.push_process(Trigger::Level, vec![Stmt::Assign { target, expr }]);
                }
            }
            self.compile_scope(instance.instantiated_module, child_context)?;
        }

        Ok(())
    }

    /// Returns the signal whose edges trigger a block clocked by `clock`.
    ///
    /// Clocks that are expressions rather than ports, wires or instance outputs get a net of their own.
    fn compile_clock(
        &mut self,
        clock: &'graph graph::Signal<'graph>,
        context: &'arena ModuleContext<'graph, 'arena>,
    ) -> Result<SimSignalId, Error> {
        let expr = self.compile_signal(clock, context)?;
        if let Expr::Ref(id) = expr {
            return Ok(id);
        }

        let scope = self.scope_ids[&context];
        let id = SimSignalId::from_index(self.signals.len());
        let name = format!("__clock_{}", id.as_raw());
        self.signals.push(SimSignal {
            path: format!("{}{}", self.prefixes[scope], name),
            name,
            bit_width: clock.bit_width(),
            kind: SignalKind::Net,
            scope,
            driven: true,
        });
        self.push_process(Trigger::Level, vec![Stmt::Assign { target: id, expr }]);
        Ok(id)
    }

    fn push_process(&mut self, trigger: Trigger, body: Vec<Stmt>) {
        let mut reads = BTreeSet::new();
        for stmt in body.iter() {
            stmt.collect_refs(&mut reads);
        }
        self.processes.push(Process {
            trigger,
            body,
            reads,
        });
    }

    fn compile_statements(
        &self,
        stmts: &[graph::Conditional<'graph>],
        context: &'arena ModuleContext<'graph, 'arena>,
    ) -> Result<Vec<Stmt>, Error> {
        let scope = self.scope_ids[&context];
        stmts
            .iter()
            .map(|stmt| {
                Ok(match stmt {
                    graph::Conditional::Assign { target, value } => Stmt::Assign {
                        target: self.signal_ids[&(scope, target.id)],
                        expr: self.compile_signal(value, context)?,
                    },
                    graph::Conditional::If(i) => Stmt::If {
                        branches: i
                            .branches
                            .iter()
                            .map(|(cond, body)| {
                                Ok((
                                    self.compile_signal(cond, context)?,
                                    self.compile_statements(body, context)?,
                                ))
                            })
                            .collect::<Result<_, Error>>()?,
                        otherwise: self.compile_statements(&i.otherwise, context)?,
                    },
                    graph::Conditional::Case(c) => Stmt::Case {
                        selector: self.compile_signal(c.selector, context)?,
                        items: c
                            .items
                            .iter()
                            .map(|(value, body)| {
                                Ok((
                                    Value::from_constant(*value, c.selector.bit_width())?,
                                    self.compile_statements(body, context)?,
                                ))
                            })
                            .collect::<Result<_, Error>>()?,
                        default: self.compile_statements(&c.default, context)?,
                    },
                })
            })
            .collect()
    }

    fn compile_signal(
        &self,
        signal: &'graph graph::Signal<'graph>,
        context: &'arena ModuleContext<'graph, 'arena>,
    ) -> Result<Expr, Error> {
        Expr::lower(signal, &|signal| self.resolve(signal, context))
    }

    fn resolve(
        &self,
        signal: &'graph graph::Signal<'graph>,
        context: &'arena ModuleContext<'graph, 'arena>,
    ) -> Result<SimSignalId, Error> {
        match signal.data {
            graph::SignalData::InstanceOutput {
                instance, ref name, ..
            } => {
                let child_context = context.get_child(instance, self.context_arena);
                let child_scope = self.scope_ids[&child_context];
                let output = instance
                    .instantiated_module
                    .output_named(name)
                    .ok_or_else(|| Error::NoSuchPort {
                        module: instance.instantiated_module.name.clone(),
                        kind: "output".into(),
                        port: name.clone(),
                    })?;
                Ok(self.signal_ids[&(child_scope, output.id)])
            }
            _ => Ok(self.signal_ids[&(self.scope_ids[&context], signal.id)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::*;

    #[test]
    fn flattens_each_instance_separately() {
        let c = Context::new();

        let inner = c.module("Inner");
        let i = inner.input("i", 4).unwrap();
        inner.output("o", 4).unwrap().drive(!i).unwrap();

        let top = c.module("Top");
        let a = top.input("a", 4).unwrap();
        let u = top.instance("u", inner).unwrap();
        u.drive_input("i", a).unwrap();
        let v = top.instance("u", inner).unwrap();
        v.drive_input("i", u.output("o").unwrap()).unwrap();
        top.output("y", 4).unwrap().drive(v.output("o").unwrap()).unwrap();
        top.build().unwrap();

        let arena = Arena::new();
        let program = Compiler::new(&arena).compile(top).unwrap();

        let paths: Vec<_> = program.signals.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "y", "u.i", "u.o", "u_0.i", "u_0.o"]);
        assert_eq!(program.scopes.len(), 3);
        assert_eq!(program.scopes[0].children, vec![1, 2]);
        // y <- v.o, u.i <- a, u.o <- !u.i, u_0.i <- u.o, u_0.o <- !u_0.i
        assert_eq!(program.processes.len(), 5);
        assert!(!program.signals[0].driven);
        assert!(program.signals[2].driven);
    }

    #[test]
    fn edge_processes_are_only_sensitive_to_their_clock() {
        let c = Context::new();

        let m = c.module("Top");
        let clk = m.input("clk", 1).unwrap();
        let d = m.input("d", 1).unwrap();
        let q = m.output("q", 1).unwrap();
        m.sequential(clk, Edge::Rising, vec![assign(q, d)]).unwrap();
        m.build().unwrap();

        let arena = Arena::new();
        let program = Compiler::new(&arena).compile(m).unwrap();

        assert_eq!(program.sensitivity[0], vec![0]);
        assert!(program.sensitivity[1].is_empty());
        assert!(program.processes[0].reads.contains(&SimSignalId::from_index(1)));
    }

    #[test]
    fn derived_clocks_get_their_own_net() {
        let c = Context::new();

        let m = c.module("Top");
        let clk = m.input("clk", 1).unwrap();
        let d = m.input("d", 1).unwrap();
        let q = m.output("q", 1).unwrap();
        let r = m.output("r", 1).unwrap();
        m.sequential(!clk, Edge::Rising, vec![assign(q, d)]).unwrap();
        m.sequential(clk.bit(0).unwrap(), Edge::Falling, vec![assign(r, d)])
            .unwrap();
        m.build().unwrap();

        let arena = Arena::new();
        let program = Compiler::new(&arena).compile(m).unwrap();

        // clk, d, q, r, then one net per derived clock
        assert_eq!(program.signals.len(), 6);
        assert!(program.signals[4..]
            .iter()
            .all(|signal| signal.kind == SignalKind::Net && signal.driven));
        assert_eq!(program.signals[4].path, "__clock_4");
        assert!(!program.names.contains_key("__clock_4"));
        assert_eq!(program.scopes[0].signals.len(), 4);
        assert!(matches!(
            program.processes[1].trigger,
            Trigger::Edge { clock, .. } if clock == SimSignalId::from_index(4)
        ));
        assert_eq!(program.sensitivity[0], vec![0, 2]);
    }
}
