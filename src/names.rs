//! Dialect, opcode and attribute names shared by the translation passes.

hlo_ir::symbols! {
    MHLO => "mhlo",
    STABLEHLO => "stablehlo",

    TOKEN => "token",
    ASYNC_BUNDLE => "async_bundle",

    CUSTOM_CALL => "custom_call",

    ATTR_CALL_TARGET_NAME => "call_target_name",
    ATTR_MHLO_ATTRIBUTES => "mhlo.attributes",
    ATTR_CALLED_COMPUTATIONS => "called_computations",
    ATTR_MHLO_VERSION => "mhlo.version",

    ATTR_API_VERSION => "api_version",
    ATTR_CUSTOM_CALL_SCHEDULE => "custom_call_schedule",
    ATTR_DIMENSION_NUMBERS => "dimension_numbers",
    ATTR_PRECISION_CONFIG => "precision_config",
}

pub const ENUM_PRECISION: &str = "precision";
pub const ENUM_CUSTOM_CALL_SCHEDULE: &str = "custom_call_schedule";
pub const SCHEDULE_NONE: &str = "NONE";
pub const PACKED_NIBBLE: &str = "PACKED_NIBBLE";

/// Prefix of custom-call targets produced by the fallback encoding.
pub const MHLO_PREFIX: &str = "mhlo.";
