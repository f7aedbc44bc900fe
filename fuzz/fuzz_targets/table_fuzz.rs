//! Table fuzz target: feed arbitrary text through parse, build and emit.
//! None of the stages may panic; errors are fine.
//! Build with: cargo fuzz run table_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let _ = rawlayout::compile("Fuzz", s, &rawlayout::CompileOptions::default());
    let _ = rawlayout::lint_source(s);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run table_fuzz");
}
