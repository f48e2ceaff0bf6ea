//! Module-level symbol table.
//!
//! Symbols are the `sym_name`s of the operations directly inside a module
//! body. Inserting a symbol whose name is taken renames it to the first free
//! `name_N` (N = 0, 1, ...).

use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::context::IrContext;
use crate::refs::OpRef;
use crate::rewrite::Module;
use crate::symbol::Symbol;
use crate::types::Attribute;
use crate::walk::{self, WalkAction};

crate::symbols! {
    ATTR_SYM_NAME => "sym_name",
}

/// Name of a symbol-defining operation.
pub fn symbol_name(ctx: &IrContext, op: OpRef) -> Option<Symbol> {
    match ctx.op(op).attributes.get(&ATTR_SYM_NAME()) {
        Some(Attribute::Symbol(s)) => Some(*s),
        _ => None,
    }
}

pub struct SymbolTable {
    module: Module,
    names: HashSet<Symbol>,
}

impl SymbolTable {
    /// Collect the symbols currently defined in `module`.
    pub fn new(ctx: &IrContext, module: Module) -> Self {
        let names = module
            .ops(ctx)
            .into_iter()
            .filter_map(|op| symbol_name(ctx, op))
            .collect();
        Self { module, names }
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.names.contains(&name)
    }

    /// Find the operation defining `name`.
    pub fn lookup(&self, ctx: &IrContext, name: Symbol) -> Option<OpRef> {
        if !self.contains(name) {
            return None;
        }
        self.module
            .ops(ctx)
            .into_iter()
            .find(|&op| symbol_name(ctx, op) == Some(name))
    }

    /// Append a detached symbol-defining `op` to the module body, renaming it
    /// if its name is already taken. Returns the name it ended up with.
    pub fn insert(&mut self, ctx: &mut IrContext, op: OpRef) -> Symbol {
        let requested = symbol_name(ctx, op).unwrap_or_else(|| Symbol::new("symbol"));
        let name = self.unique_name(requested);
        if name != requested {
            ctx.op_mut(op)
                .attributes
                .insert(ATTR_SYM_NAME(), Attribute::Symbol(name));
        }
        self.names.insert(name);
        if let Some(block) = self.module.first_block(ctx) {
            ctx.push_op(block, op);
        }
        name
    }

    /// Detach and remove the symbol-defining `op` from the module.
    pub fn erase(&mut self, ctx: &mut IrContext, op: OpRef) {
        if let Some(name) = symbol_name(ctx, op) {
            self.names.remove(&name);
        }
        ctx.detach_op(op);
        ctx.remove_op(op);
    }

    fn unique_name(&self, requested: Symbol) -> Symbol {
        if !self.names.contains(&requested) {
            return requested;
        }
        (0u64..)
            .map(|n| Symbol::from_dynamic(&format!("{requested}_{n}")))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or(requested)
    }
}

/// Operations in `module` that refer to `name` through a symbol reference
/// attribute (including references nested in lists and dicts).
pub fn symbol_users(ctx: &IrContext, module: Module, name: Symbol) -> Vec<OpRef> {
    let Some(body) = module.body(ctx) else {
        return Vec::new();
    };
    let mut users = Vec::new();
    let _ = walk::walk_region::<()>(ctx, body, &mut |op| {
        if ctx
            .op(op)
            .attributes
            .values()
            .any(|attr| attr_references(attr, name))
        {
            users.push(op);
        }
        ControlFlow::Continue(WalkAction::Advance)
    });
    users
}

fn attr_references(attr: &Attribute, name: Symbol) -> bool {
    match attr {
        Attribute::SymbolRef(s) => *s == name,
        Attribute::List(items) => items.iter().any(|a| attr_references(a, name)),
        Attribute::Dict(entries) => entries.values().any(|a| attr_references(a, name)),
        _ => false,
    }
}
