//! Text format printer.
//!
//! Prints IR in a generic, MLIR-like form:
//!
//! ```text
//! core.module @m {
//!   func.func @tan(%0: builtin.tensor(builtin.f32)) -> builtin.tensor(builtin.f32) {
//!     %1 = mhlo.tan %0 : builtin.tensor(builtin.f32)
//!     func.return %1
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;

use crate::context::IrContext;
use crate::dialect::func;
use crate::refs::*;
use crate::symbol::Symbol;
use crate::types::*;

/// Print state for value numbering and block labeling.
struct PrintState<'a> {
    ctx: &'a IrContext,
    value_names: HashMap<ValueRef, String>,
    block_labels: HashMap<BlockRef, String>,
    next_value_num: usize,
    next_block_num: usize,
}

impl<'a> PrintState<'a> {
    fn new(ctx: &'a IrContext) -> Self {
        Self {
            ctx,
            value_names: HashMap::new(),
            block_labels: HashMap::new(),
            next_value_num: 0,
            next_block_num: 0,
        }
    }

    fn assign_value_name(&mut self, v: ValueRef) -> String {
        let name = format!("%{}", self.next_value_num);
        self.next_value_num += 1;
        self.value_names.insert(v, name.clone());
        name
    }

    fn get_value_name(&self, v: ValueRef) -> &str {
        self.value_names.get(&v).map(|s| s.as_str()).unwrap_or("%?")
    }

    fn assign_block_label(&mut self, b: BlockRef) -> String {
        let label = format!("^bb{}", self.next_block_num);
        self.next_block_num += 1;
        self.block_labels.insert(b, label.clone());
        label
    }

    fn get_block_label(&self, b: BlockRef) -> &str {
        self.block_labels
            .get(&b)
            .map(|s| s.as_str())
            .unwrap_or("^bb?")
    }

    fn reset_numbering(&mut self) {
        self.next_value_num = 0;
        self.next_block_num = 0;
        self.value_names.clear();
        self.block_labels.clear();
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Print an operation as IR text.
pub fn print_op(ctx: &IrContext, op: OpRef) -> String {
    let mut state = PrintState::new(ctx);
    let mut out = String::new();
    let _ = print_operation(&mut state, &mut out, op, 0);
    out
}

/// Print a type as IR text.
pub fn print_type(ctx: &IrContext, ty: TypeRef) -> String {
    let mut out = String::new();
    let _ = write_type(ctx, &mut out, ty);
    out
}

/// Print an attribute as IR text.
pub fn print_attribute(ctx: &IrContext, attr: &Attribute) -> String {
    let mut out = String::new();
    let _ = write_attribute(ctx, &mut out, attr);
    out
}

/// Print a module (root operation with nested functions) as IR text.
pub fn print_module(ctx: &IrContext, root: OpRef) -> String {
    let mut state = PrintState::new(ctx);
    let mut out = String::new();
    let _ = print_module_op(&mut state, &mut out, root);
    out
}

// ============================================================================
// Type printing
// ============================================================================

fn write_type(ctx: &IrContext, f: &mut impl Write, ty: TypeRef) -> fmt::Result {
    let data = ctx.types.get(ty);
    write!(f, "{}.{}", data.dialect, data.name)?;
    if !data.params.is_empty() {
        f.write_char('(')?;
        for (i, &param) in data.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_type(ctx, f, param)?;
        }
        f.write_char(')')?;
    } else if !data.attrs.is_empty() {
        // Empty parens signal that attrs follow
        f.write_str("()")?;
    }
    if !data.attrs.is_empty() {
        f.write_str(" {")?;
        for (i, (key, val)) in data.attrs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = ", key)?;
            write_attribute(ctx, f, val)?;
        }
        f.write_char('}')?;
    }
    Ok(())
}

// ============================================================================
// Attribute printing
// ============================================================================

fn write_attribute(ctx: &IrContext, f: &mut impl Write, attr: &Attribute) -> fmt::Result {
    match attr {
        Attribute::Unit => f.write_str("unit"),
        Attribute::Bool(b) => write!(f, "{b}"),
        Attribute::IntBits(_) => write!(f, "{}", attr.as_i64().unwrap_or_default()),
        Attribute::FloatBits(bits) => {
            let v = f64::from_bits(*bits);
            let s = format!("{v}");
            f.write_str(&s)?;
            if v.is_finite() && !s.contains('.') && !s.contains('e') && !s.contains('E') {
                f.write_str(".0")?;
            }
            Ok(())
        }
        Attribute::String(s) => {
            f.write_char('"')?;
            write_escaped_string(f, s)?;
            f.write_char('"')
        }
        Attribute::Symbol(sym) | Attribute::SymbolRef(sym) => write_symbol(f, *sym),
        Attribute::Type(ty) => write_type(ctx, f, *ty),
        Attribute::List(list) => {
            f.write_char('[')?;
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_attribute(ctx, f, item)?;
            }
            f.write_char(']')
        }
        Attribute::Dict(entries) => {
            f.write_char('{')?;
            for (i, (key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key} = ")?;
                write_attribute(ctx, f, val)?;
            }
            f.write_char('}')
        }
        Attribute::DenseInts { ty, values } => {
            f.write_str("dense<")?;
            write_int_list(f, values)?;
            f.write_str("> : ")?;
            write_type(ctx, f, *ty)
        }
        Attribute::DenseI64Array(values) => {
            f.write_str("array<i64")?;
            if !values.is_empty() {
                f.write_str(": ")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
            }
            f.write_char('>')
        }
        Attribute::Location(loc) => {
            let path_str = ctx.paths.get(loc.path);
            f.write_str("loc(\"")?;
            write_escaped_string(f, path_str)?;
            write!(f, "\" {}:{})", loc.span.start, loc.span.end)
        }
        Attribute::Dialect(attr) => write!(f, "{attr}"),
    }
}

fn write_int_list(f: &mut impl Write, values: &[i64]) -> fmt::Result {
    f.write_char('[')?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{v}")?;
    }
    f.write_char(']')
}

fn write_escaped_string(f: &mut impl Write, s: &str) -> fmt::Result {
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

fn write_symbol(f: &mut impl Write, sym: Symbol) -> fmt::Result {
    sym.with_str(|s| {
        let needs_quoting = s.is_empty()
            || !s
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if needs_quoting {
            f.write_str("@\"")?;
            write_escaped_string(f, s)?;
            f.write_char('"')
        } else {
            write!(f, "@{s}")
        }
    })
}

// ============================================================================
// Operation printing
// ============================================================================

fn print_operation(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    op: OpRef,
    indent: usize,
) -> fmt::Result {
    if state.ctx.op_is(op, "core", "module") {
        return print_module_op(state, f, op);
    }
    if func::is_func(state.ctx, op) {
        return print_func_op(state, f, op, indent);
    }
    print_generic_op(state, f, op, indent)
}

fn print_generic_op(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    op: OpRef,
    indent: usize,
) -> fmt::Result {
    let indent_str = " ".repeat(indent);
    write!(f, "{indent_str}")?;

    // Results
    let results = state.ctx.op_results(op);
    if !results.is_empty() {
        for (i, &v) in results.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let name = state.assign_value_name(v);
            f.write_str(&name)?;
        }
        f.write_str(" = ")?;
    }

    let data = state.ctx.op(op);
    write!(f, "{}.{}", data.dialect, data.name)?;

    // Operands
    let operands = state.ctx.op_operands(op);
    if !operands.is_empty() {
        f.write_char(' ')?;
        for (i, &v) in operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(state.get_value_name(v))?;
        }
    }

    // Attributes
    let attrs = &state.ctx.op(op).attributes;
    if !attrs.is_empty() {
        f.write_str(" {")?;
        for (i, (key, val)) in attrs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} = ")?;
            write_attribute(state.ctx, f, val)?;
        }
        f.write_char('}')?;
    }

    // Result types
    let result_types = state.ctx.op_result_types(op);
    if !result_types.is_empty() {
        f.write_str(" : ")?;
        for (i, &ty) in result_types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_type(state.ctx, f, ty)?;
        }
    }

    // Regions
    let regions = state.ctx.op(op).regions.clone();
    for region in regions {
        f.write_str(" {\n")?;
        print_region(state, f, region, indent + 2)?;
        write!(f, "{indent_str}}}")?;
    }

    f.write_char('\n')
}

// ============================================================================
// Region / Block printing
// ============================================================================

fn print_region(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    region: RegionRef,
    indent: usize,
) -> fmt::Result {
    let blocks: Vec<_> = state.ctx.region(region).blocks.to_vec();

    for &block in &blocks {
        state.assign_block_label(block);
    }

    let can_elide_label = blocks.len() == 1 && state.ctx.block_args(blocks[0]).is_empty();

    for (i, &block) in blocks.iter().enumerate() {
        if !can_elide_label {
            let indent_str = " ".repeat(indent);
            let label = state.get_block_label(block).to_owned();
            write!(f, "{indent_str}{label}")?;
            write_block_args(state, f, block)?;
            f.write_str(":\n")?;
        }

        let ops: Vec<_> = state.ctx.block(block).ops.to_vec();
        for op in ops {
            print_operation(state, f, op, indent + 2)?;
        }
        if i + 1 < blocks.len() {
            f.write_char('\n')?;
        }
    }

    Ok(())
}

fn write_block_args(state: &mut PrintState<'_>, f: &mut impl Write, block: BlockRef) -> fmt::Result {
    let args = state.ctx.block_args(block).to_vec();
    if args.is_empty() {
        return Ok(());
    }
    f.write_char('(')?;
    for (j, arg) in args.into_iter().enumerate() {
        if j > 0 {
            f.write_str(", ")?;
        }
        let name = state.assign_value_name(arg);
        let ty = state.ctx.value_ty(arg);
        write!(f, "{name}: ")?;
        write_type(state.ctx, f, ty)?;
    }
    f.write_char(')')
}

// ============================================================================
// Special operation printers
// ============================================================================

fn print_module_op(state: &mut PrintState<'_>, f: &mut impl Write, op: OpRef) -> fmt::Result {
    let data = state.ctx.op(op);
    write!(f, "core.module")?;

    if let Some(Attribute::Symbol(name)) = data.attributes.get(&Symbol::new("sym_name")) {
        f.write_char(' ')?;
        write_symbol(f, *name)?;
    }

    let Some(&region) = data.regions.first() else {
        return f.write_char('\n');
    };
    f.write_str(" {\n")?;

    // Each top-level op gets its own numbering
    let blocks: Vec<_> = state.ctx.region(region).blocks.to_vec();
    for block in blocks {
        let ops: Vec<_> = state.ctx.block(block).ops.to_vec();
        for child_op in ops {
            state.reset_numbering();
            print_operation(state, f, child_op, 2)?;
        }
    }
    state.reset_numbering();

    f.write_str("}\n")
}

fn print_func_op(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    op: OpRef,
    indent: usize,
) -> fmt::Result {
    let indent_str = " ".repeat(indent);

    write!(f, "{indent_str}func.func")?;
    if let Some(name) = func::sym_name(state.ctx, op) {
        f.write_char(' ')?;
        write_symbol(f, name)?;
    }

    let Some(region) = func::body(state.ctx, op) else {
        return f.write_char('\n');
    };
    let blocks: Vec<_> = state.ctx.region(region).blocks.to_vec();

    // Entry block args double as the signature
    f.write_char('(')?;
    if let Some(&entry) = blocks.first() {
        let args = state.ctx.block_args(entry).to_vec();
        for (i, arg) in args.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let name = state.assign_value_name(arg);
            let ty = state.ctx.value_ty(arg);
            write!(f, "{name}: ")?;
            write_type(state.ctx, f, ty)?;
        }
    }
    f.write_char(')')?;

    if let Some((_, results)) = func::signature(state.ctx, op) {
        if !results.is_empty() {
            f.write_str(" -> ")?;
            for (i, ty) in results.into_iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_type(state.ctx, f, ty)?;
            }
        }
    }

    f.write_str(" {\n")?;
    for &block in &blocks {
        state.assign_block_label(block);
    }
    for (i, &block) in blocks.iter().enumerate() {
        if i > 0 {
            let label = state.get_block_label(block).to_owned();
            write!(f, "{indent_str}  {label}")?;
            write_block_args(state, f, block)?;
            f.write_str(":\n")?;
        }
        let ops: Vec<_> = state.ctx.block(block).ops.to_vec();
        for child_op in ops {
            print_operation(state, f, child_op, indent + 2)?;
        }
    }
    writeln!(f, "{indent_str}}}")
}
