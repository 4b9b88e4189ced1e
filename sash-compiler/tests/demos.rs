use std::fs;
use std::path::PathBuf;

use sash_compiler::{CompileOptions, Compiler, SourceFile, SourceId};

fn check_demo(name: &str) -> anyhow::Result<()> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().expect("workspace root");
    let demo_path = workspace_root.join("demos").join(name);
    let contents = fs::read_to_string(&demo_path)?;

    let mut compiler = Compiler::new(CompileOptions::default());
    let source = SourceFile::new(SourceId(0), demo_path, contents);
    compiler.compile(&source)?;
    assert!(
        compiler.diagnostics().is_empty(),
        "expected no diagnostics, found {:?}",
        compiler.diagnostics()
    );
    Ok(())
}

#[test]
fn check_records_demo() -> anyhow::Result<()> {
    check_demo("records.sash")
}

#[test]
fn check_control_flow_demo() -> anyhow::Result<()> {
    check_demo("control_flow.sash")
}
