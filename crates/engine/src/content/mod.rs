//! Species and weapon definitions compiled from XML `<Defs>` documents.

mod compiler;
mod database;
mod discovery;

pub use compiler::{
    compile_base_defs, compile_def_dirs, compile_defs_str, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use database::{CreatureDef, DefDatabase, DefId, WeaponDef};
