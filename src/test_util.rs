//! Builders shared by the unit tests.

use hlo_ir::attrs::ConvDimensionNumbers;
use hlo_ir::dialect::{core, func};
use hlo_ir::{
    Attribute, BlockArgData, BlockData, BlockRef, DialectAttr, DialectAttrData, IrContext,
    Location, Module, OpRef, OperationDataBuilder, RegionData, RegionRef, Span, Symbol, TypeRef,
    TypeDataBuilder, ValueRef,
};
use smallvec::smallvec;

use crate::names::{MHLO, STABLEHLO};

/// A module holding `func.func @main` whose body ops are built by the test.
pub(crate) struct TestIr {
    pub ctx: IrContext,
    pub loc: Location,
    pub module: Module,
    pub body: BlockRef,
    pub args: Vec<ValueRef>,
    pub tensor: TypeRef,
}

impl TestIr {
    /// `@main` takes `num_args` tensors.
    pub fn new(num_args: usize) -> Self {
        let mut ctx = IrContext::new();
        let path = ctx.paths.intern("test.mlir".to_owned());
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

        let body = ctx.create_block(BlockData {
            location: loc,
            args: vec![BlockArgData::new(tensor); num_args],
            ops: smallvec![],
            parent_region: None,
        });
        let region = ctx.create_region(RegionData {
            location: loc,
            blocks: smallvec![body],
            parent_op: None,
        });
        let inputs = vec![tensor; num_args];
        let fn_ty = func::fn_type(&mut ctx.types, &inputs, &[]);
        let main = func::func(&mut ctx, loc, Symbol::new("main"), fn_ty, region);
        core::push_to_module(&mut ctx, module_op, main);

        let args = ctx.block_args(body).to_vec();
        Self {
            ctx,
            loc,
            module,
            body,
            args,
            tensor,
        }
    }

    /// Append `dialect.name` with one tensor result to `@main`.
    pub fn op(
        &mut self,
        dialect: &str,
        name: &str,
        operands: &[ValueRef],
        attrs: Vec<(&str, Attribute)>,
    ) -> OpRef {
        self.op_with_regions(dialect, name, operands, attrs, vec![])
    }

    pub fn mhlo(
        &mut self,
        name: &str,
        operands: &[ValueRef],
        attrs: Vec<(&str, Attribute)>,
    ) -> OpRef {
        self.op("mhlo", name, operands, attrs)
    }

    pub fn op_with_regions(
        &mut self,
        dialect: &str,
        name: &str,
        operands: &[ValueRef],
        attrs: Vec<(&str, Attribute)>,
        regions: Vec<RegionRef>,
    ) -> OpRef {
        let tensor = self.tensor;
        self.op_with_result(dialect, name, operands, attrs, regions, tensor)
    }

    /// Like [`TestIr::op_with_regions`], producing a value of type `result`.
    pub fn op_with_result(
        &mut self,
        dialect: &str,
        name: &str,
        operands: &[ValueRef],
        attrs: Vec<(&str, Attribute)>,
        regions: Vec<RegionRef>,
        result: TypeRef,
    ) -> OpRef {
        let data = OperationDataBuilder::new(
            self.loc,
            Symbol::from_dynamic(dialect),
            Symbol::from_dynamic(name),
        )
        .operands(operands.iter().copied())
        .result(result)
        .attrs(
            attrs
                .into_iter()
                .map(|(key, value)| (Symbol::from_dynamic(key), value)),
        )
        .regions(regions)
        .build(&mut self.ctx);
        let op = self.ctx.create_op(data);
        self.ctx.push_op(self.body, op);
        op
    }

    /// Single-block region `^bb0(%a, %b): mhlo.return(mhlo.add(%a, %b))`.
    pub fn reducer_region(&mut self) -> RegionRef {
        let block = self.block(2);
        let (a, b) = (self.ctx.block_arg(block, 0), self.ctx.block_arg(block, 1));
        let sum = self.detached("mhlo", "add", &[a, b], true);
        self.ctx.push_op(block, sum);
        let sum = self.ctx.op_result(sum, 0);
        let ret = self.detached("mhlo", "return", &[sum], false);
        self.ctx.push_op(block, ret);
        self.region(vec![block])
    }

    /// Single-block region whose body adds its argument to `captured`.
    pub fn capturing_region(&mut self, captured: ValueRef) -> RegionRef {
        let block = self.block(1);
        let a = self.ctx.block_arg(block, 0);
        let sum = self.detached("mhlo", "add", &[a, captured], true);
        self.ctx.push_op(block, sum);
        let sum = self.ctx.op_result(sum, 0);
        let ret = self.detached("mhlo", "return", &[sum], false);
        self.ctx.push_op(block, ret);
        self.region(vec![block])
    }

    /// Region of `count` blocks, each ending in `mhlo.return`.
    pub fn multi_block_region(&mut self, count: usize) -> RegionRef {
        let blocks = (0..count)
            .map(|_| {
                let block = self.block(0);
                let ret = self.detached("mhlo", "return", &[], false);
                self.ctx.push_op(block, ret);
                block
            })
            .collect();
        self.region(blocks)
    }

    pub fn block(&mut self, num_args: usize) -> BlockRef {
        self.ctx.create_block(BlockData {
            location: self.loc,
            args: vec![BlockArgData::new(self.tensor); num_args],
            ops: smallvec![],
            parent_region: None,
        })
    }

    pub fn region(&mut self, blocks: Vec<BlockRef>) -> RegionRef {
        self.ctx.create_region(RegionData {
            location: self.loc,
            blocks: blocks.into_iter().collect(),
            parent_op: None,
        })
    }

    fn detached(
        &mut self,
        dialect: &str,
        name: &str,
        operands: &[ValueRef],
        result: bool,
    ) -> OpRef {
        let mut builder = OperationDataBuilder::new(
            self.loc,
            Symbol::from_dynamic(dialect),
            Symbol::from_dynamic(name),
        )
        .operands(operands.iter().copied());
        if result {
            builder = builder.result(self.tensor);
        }
        let data = builder.build(&mut self.ctx);
        self.ctx.create_op(data)
    }

    /// A token type owned by `dialect`.
    pub fn token(&mut self, dialect: &'static str) -> TypeRef {
        self.ctx
            .types
            .intern(TypeDataBuilder::new(Symbol::new(dialect), Symbol::new("token")).build())
    }

    /// `mhlo.async_bundle`, which has no `stablehlo` form.
    pub fn async_bundle(&mut self) -> TypeRef {
        self.ctx.types.intern(
            TypeDataBuilder::new(Symbol::new("mhlo"), Symbol::new("async_bundle")).build(),
        )
    }

    pub fn attr<'a>(&'a self, op: OpRef, key: &str) -> Option<&'a Attribute> {
        self.ctx.op(op).attributes.get(&Symbol::from_dynamic(key))
    }

    pub fn body_ops(&self) -> Vec<OpRef> {
        self.ctx.block(self.body).ops.to_vec()
    }

    pub fn print(&self) -> String {
        hlo_ir::printer::print_module(&self.ctx, self.module.op())
    }
}

pub(crate) fn mhlo_enum(kind: &str, value: &str) -> Attribute {
    Attribute::Dialect(DialectAttr::enumeration(
        MHLO(),
        Symbol::from_dynamic(kind),
        Symbol::from_dynamic(value),
    ))
}

pub(crate) fn stablehlo_enum(kind: &str, value: &str) -> Attribute {
    Attribute::Dialect(DialectAttr::enumeration(
        STABLEHLO(),
        Symbol::from_dynamic(kind),
        Symbol::from_dynamic(value),
    ))
}

pub(crate) fn precision(value: &str) -> Attribute {
    mhlo_enum("precision", value)
}

/// NHWC input, HWIO kernel, NHWC output.
pub(crate) fn conv_dims() -> ConvDimensionNumbers {
    ConvDimensionNumbers {
        input_batch_dimension: 0,
        input_feature_dimension: 3,
        input_spatial_dimensions: vec![1, 2],
        kernel_input_feature_dimension: 2,
        kernel_output_feature_dimension: 3,
        kernel_spatial_dimensions: vec![0, 1],
        output_batch_dimension: 0,
        output_feature_dimension: 3,
        output_spatial_dimensions: vec![1, 2],
    }
}

pub(crate) fn conv_dims_attr(dims: ConvDimensionNumbers) -> Attribute {
    Attribute::Dialect(DialectAttr::new(
        MHLO(),
        DialectAttrData::ConvDimensionNumbers(dims),
    ))
}
