//! Names the lowering emits on its own: runtime entry points, Luau library
//! functions and metatable keys. Interned once per lowerer.

use moon_ir::{Name, StringInterner};

macro_rules! runtime_names {
    ($($field:ident => $text:literal),* $(,)?) => {
        #[derive(Copy, Clone)]
        pub(crate) struct RuntimeNames {
            $(pub(crate) $field: Name,)*
        }

        impl RuntimeNames {
            pub(crate) fn new(interner: &StringInterner) -> Self {
                RuntimeNames {
                    $($field: interner.intern($text),)*
                }
            }
        }
    };
}

runtime_names! {
    // Runtime library
    cs => "CS",
    signal => "Signal",
    connect => "Connect",
    disconnect => "Disconnect",
    fire => "Fire",
    try_ => "try",
    try_return => "TRY_RETURN",
    try_break => "TRY_BREAK",
    try_continue => "TRY_CONTINUE",
    throw => "throw",
    is => "is",
    async_ => "async",
    await_ => "await",
    iter => "iter",
    collect => "collect",
    slice => "slice",
    generator => "Generator",
    define_global => "defineGlobal",
    format => "format",
    exception => "Exception",
    dispose => "Dispose",

    // Luau globals and libraries
    self_ => "self",
    new => "new",
    constructor => "constructor",
    index_meta => "__index",
    tostring_meta => "__tostring",
    attributes => "__attributes",
    interfaces => "__interfaces",
    base => "__base",
    setmetatable => "setmetatable",
    tostring => "tostring",
    type_ => "type",
    print => "print",
    ipairs => "ipairs",
    pairs => "pairs",
    next => "next",
    bit32 => "bit32",
    band => "band",
    bor => "bor",
    bxor => "bxor",
    bnot => "bnot",
    lshift => "lshift",
    arshift => "arshift",
    table => "table",
    insert => "insert",
    remove => "remove",
    clear => "clear",
    find => "find",
    create => "create",
    clone => "clone",
    freeze => "freeze",
    string => "string",
    gmatch => "gmatch",
    sub => "sub",
    upper => "upper",
    lower => "lower",
    match_ => "match",
    math => "math",
    floor => "floor",
    modf => "modf",
    fmod => "fmod",
    ceil => "ceil",
    abs => "abs",
    max => "max",
    min => "min",
    sqrt => "sqrt",

    // Record keys
    key => "Key",
    value => "Value",
    name_key => "Name",
    args_key => "Args",
    named_key => "Named",
}
