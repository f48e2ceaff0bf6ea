//! Program builder shared by the integration tests.

#![allow(dead_code)]

use hlo_ir::attrs::ConvDimensionNumbers;
use hlo_ir::dialect::{core, func};
use hlo_ir::{
    Attribute, BlockArgData, BlockData, BlockRef, DialectAttr, DialectAttrData, IrContext,
    Location, Module, OpRef, OperationDataBuilder, RegionData, RegionRef, Span, Symbol,
    TypeDataBuilder, TypeRef, ValueRef,
};
use smallvec::smallvec;

/// `core.module @test` with a `func.func @main` the test fills in.
pub struct Program {
    pub ctx: IrContext,
    pub loc: Location,
    pub module: Module,
    pub main: BlockRef,
    pub args: Vec<ValueRef>,
    pub tensor: TypeRef,
}

impl Program {
    pub fn new(num_args: usize) -> Self {
        let mut ctx = IrContext::new();
        let path = ctx.paths.intern("program.mlir".to_owned());
        let loc = Location::new(path, Span::new(0, 0));
        let f32_ty = ctx
            .types
            .intern(TypeDataBuilder::new(Symbol::new("builtin"), Symbol::new("f32")).build());
        let tensor = ctx.types.intern(
            TypeDataBuilder::new(Symbol::new("builtin"), Symbol::new("tensor"))
                .param(f32_ty)
                .build(),
        );

        let module_op = core::module(&mut ctx, loc, Symbol::new("test"));
        let module = Module::new(&ctx, module_op).expect("core.module");
        let main = ctx.create_block(BlockData {
            location: loc,
            args: vec![BlockArgData::new(tensor); num_args],
            ops: smallvec![],
            parent_region: None,
        });
        let body = ctx.create_region(RegionData {
            location: loc,
            blocks: smallvec![main],
            parent_op: None,
        });
        let fn_ty = func::fn_type(&mut ctx.types, &vec![tensor; num_args], &[]);
        let main_fn = func::func(&mut ctx, loc, Symbol::new("main"), fn_ty, body);
        core::push_to_module(&mut ctx, module_op, main_fn);

        let args = ctx.block_args(main).to_vec();
        Self {
            ctx,
            loc,
            module,
            main,
            args,
            tensor,
        }
    }

    /// Append `mhlo.<name>` producing one tensor to `@main`.
    pub fn mhlo(
        &mut self,
        name: &str,
        operands: &[ValueRef],
        attrs: Vec<(&str, Attribute)>,
    ) -> OpRef {
        self.mhlo_with_regions(name, operands, attrs, vec![])
    }

    pub fn mhlo_with_regions(
        &mut self,
        name: &str,
        operands: &[ValueRef],
        attrs: Vec<(&str, Attribute)>,
        regions: Vec<RegionRef>,
    ) -> OpRef {
        let op = self.build("mhlo", name, operands, attrs, regions, true);
        self.ctx.push_op(self.main, op);
        op
    }

    /// Terminate `@main` with `func.return`.
    pub fn ret(&mut self, values: &[ValueRef]) -> OpRef {
        let op = func::r#return(&mut self.ctx, self.loc, values.iter().copied());
        self.ctx.push_op(self.main, op);
        op
    }

    /// `^bb0(%a, %b): mhlo.return(mhlo.add(%a, %b))`.
    pub fn reducer(&mut self) -> RegionRef {
        let block = self.ctx.create_block(BlockData {
            location: self.loc,
            args: vec![BlockArgData::new(self.tensor); 2],
            ops: smallvec![],
            parent_region: None,
        });
        let (a, b) = (self.ctx.block_arg(block, 0), self.ctx.block_arg(block, 1));
        self.reducer_body(block, a, b)
    }

    /// Like [`Program::reducer`] with one argument, adding `captured` to it.
    pub fn capturing_reducer(&mut self, captured: ValueRef) -> RegionRef {
        let block = self.ctx.create_block(BlockData {
            location: self.loc,
            args: vec![BlockArgData::new(self.tensor)],
            ops: smallvec![],
            parent_region: None,
        });
        let a = self.ctx.block_arg(block, 0);
        self.reducer_body(block, a, captured)
    }

    fn reducer_body(&mut self, block: BlockRef, a: ValueRef, b: ValueRef) -> RegionRef {
        let add = self.build("mhlo", "add", &[a, b], vec![], vec![], true);
        self.ctx.push_op(block, add);
        let sum = self.ctx.op_result(add, 0);
        let ret = self.build("mhlo", "return", &[sum], vec![], vec![], false);
        self.ctx.push_op(block, ret);
        self.ctx.create_region(RegionData {
            location: self.loc,
            blocks: smallvec![block],
            parent_op: None,
        })
    }

    fn build(
        &mut self,
        dialect: &str,
        name: &str,
        operands: &[ValueRef],
        attrs: Vec<(&str, Attribute)>,
        regions: Vec<RegionRef>,
        result: bool,
    ) -> OpRef {
        let mut builder = OperationDataBuilder::new(
            self.loc,
            Symbol::from_dynamic(dialect),
            Symbol::from_dynamic(name),
        )
        .operands(operands.iter().copied())
        .attrs(
            attrs
                .into_iter()
                .map(|(key, value)| (Symbol::from_dynamic(key), value)),
        )
        .regions(regions);
        if result {
            builder = builder.result(self.tensor);
        }
        let data = builder.build(&mut self.ctx);
        self.ctx.create_op(data)
    }

    pub fn main_ops(&self) -> Vec<OpRef> {
        self.ctx.block(self.main).ops.to_vec()
    }

    /// Top-level ops of the module: `@main` followed by outlined functions.
    pub fn functions(&self) -> Vec<OpRef> {
        self.module.ops(&self.ctx)
    }

    pub fn attr(&self, op: OpRef, key: &str) -> Option<&Attribute> {
        self.ctx.op(op).attributes.get(&Symbol::from_dynamic(key))
    }

    pub fn print(&self) -> String {
        hlo_ir::printer::print_module(&self.ctx, self.module.op())
    }
}

pub fn mhlo_enum(kind: &str, value: &str) -> Attribute {
    Attribute::Dialect(DialectAttr::enumeration(
        Symbol::new("mhlo"),
        Symbol::from_dynamic(kind),
        Symbol::from_dynamic(value),
    ))
}

pub fn precision_config(values: &[&str]) -> Attribute {
    Attribute::List(values.iter().map(|v| mhlo_enum("precision", v)).collect())
}

/// NHWC input, HWIO kernel, NHWC output. With `unknown_output_feature` the
/// output feature dimension points past the output rank.
pub fn conv_dimension_numbers(unknown_output_feature: bool) -> Attribute {
    let dims = ConvDimensionNumbers {
        input_batch_dimension: 0,
        input_feature_dimension: 3,
        input_spatial_dimensions: vec![1, 2],
        kernel_input_feature_dimension: 2,
        kernel_output_feature_dimension: 3,
        kernel_spatial_dimensions: vec![0, 1],
        output_batch_dimension: 0,
        output_feature_dimension: if unknown_output_feature { 7 } else { 3 },
        output_spatial_dimensions: vec![1, 2],
    };
    Attribute::Dialect(DialectAttr::new(
        Symbol::new("mhlo"),
        DialectAttrData::ConvDimensionNumbers(dims),
    ))
}
